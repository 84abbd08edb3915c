//! Subprocess port.
//!
//! A narrow interface for running an external executable with arguments, an
//! optional stdin payload and captured output. The production implementation
//! uses `tokio::process`; tests swap in [`crate::mock::MockCommandRunner`].

use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Errors raised when a subprocess could not be run to completion.
///
/// A subprocess that runs and exits non-zero is not an error at this layer;
/// callers inspect [`ProcessOutput::success`].
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error while running {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} timed out after {timeout:?}")]
    TimedOut { program: String, timeout: Duration },
}

/// A fully described subprocess invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
    /// Bytes streamed to stdin; `None` attaches stdin to the null device.
    pub stdin: Option<Vec<u8>>,
    pub timeout: Option<Duration>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            stdin: None,
            timeout: None,
        }
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn stdin(mut self, input: Vec<u8>) -> Self {
        self.stdin = Some(input);
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Program and arguments joined for logging.
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Exit status and captured output of a finished subprocess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Stdout followed by stderr.
    pub fn combined(&self) -> String {
        let mut bytes = Vec::with_capacity(self.stdout.len() + self.stderr.len());
        bytes.extend_from_slice(&self.stdout);
        bytes.extend_from_slice(&self.stderr);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

/// Runs subprocesses. Implementations must be usable from a single driving
/// task; they are not required to support concurrent invocations.
pub trait CommandRunner: Send + Sync {
    fn run(
        &self,
        invocation: Invocation,
    ) -> impl Future<Output = Result<ProcessOutput, ProcessError>> + Send;
}

/// [`CommandRunner`] backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioCommandRunner;

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, invocation: Invocation) -> Result<ProcessOutput, ProcessError> {
        let program = invocation.program.display().to_string();
        let start = Instant::now();
        debug!(command = %invocation.command_line(), "spawning subprocess");

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(if invocation.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &invocation.current_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|source| ProcessError::Spawn {
            program: program.clone(),
            source,
        })?;

        // The writer must be running before we block on output, otherwise a
        // child that fills its stdout pipe before draining stdin deadlocks us.
        let writer = match (child.stdin.take(), invocation.stdin) {
            (Some(mut stdin), Some(input)) => Some(tokio::spawn(async move {
                let result = stdin.write_all(&input).await;
                drop(stdin);
                result.map(|()| input.len())
            })),
            _ => None,
        };

        let wait = child.wait_with_output();
        let waited = match invocation.timeout {
            Some(limit) => match tokio::time::timeout(limit, wait).await {
                Ok(result) => result,
                Err(_) => {
                    // Dropping the wait future kills the child (kill_on_drop).
                    if let Some(writer) = writer {
                        writer.abort();
                    }
                    warn!(program = %program, timeout = ?limit, "subprocess timed out");
                    return Err(ProcessError::TimedOut {
                        program,
                        timeout: limit,
                    });
                }
            },
            None => wait.await,
        };
        let output = waited.map_err(|source| ProcessError::Io {
            program: program.clone(),
            source,
        })?;

        if let Some(writer) = writer {
            match writer.await {
                Ok(Ok(written)) => debug!(program = %program, bytes = written, "stdin delivered"),
                Ok(Err(err)) if err.kind() == io::ErrorKind::BrokenPipe => {
                    debug!(program = %program, "subprocess closed stdin before reading all input");
                }
                Ok(Err(err)) => warn!(program = %program, error = %err, "writing stdin failed"),
                Err(err) => warn!(program = %program, error = %err, "stdin writer task failed"),
            }
        }

        let result = ProcessOutput {
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        };
        debug!(
            program = %program,
            exit_code = ?result.exit_code,
            stdout_bytes = result.stdout.len(),
            stderr_bytes = result.stderr.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "subprocess finished"
        );
        Ok(result)
    }
}
