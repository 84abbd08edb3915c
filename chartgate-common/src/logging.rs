//! Structured logging setup.

use crate::config::GateConfig;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::subscriber::DefaultGuard;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Filter directive, e.g. `debug` or `chartgate_common=trace,info`.
    pub level: String,
    pub json: bool,
    /// Write console logs to stderr instead of stdout.
    pub stderr: bool,
    /// Additionally write JSON logs to this file.
    pub file: Option<PathBuf>,
}

impl LogConfig {
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            json: true,
            stderr: false,
            file: None,
        }
    }

    pub fn from_gate_config(config: &GateConfig) -> Self {
        Self {
            level: config.log_level.value.clone(),
            json: config.log_json.value,
            stderr: false,
            file: config.log_file.value.clone(),
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    #[must_use]
    pub fn with_stderr(mut self) -> Self {
        self.stderr = true;
        self
    }

    #[must_use]
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    #[must_use]
    pub fn with_file(mut self, file: Option<PathBuf>) -> Self {
        self.file = file;
        self
    }
}

/// Keeps the subscriber installed and the file writer flushing.
///
/// Dropping it restores the previous default subscriber.
#[must_use = "logging stops when the guards are dropped"]
pub struct LoggingGuards {
    _default: DefaultGuard,
    _file: Option<WorkerGuard>,
}

/// Install the subscriber described by `config` as the default for the
/// current thread.
pub fn init_logging(config: &LogConfig) -> Result<LoggingGuards> {
    let filter = EnvFilter::try_new(&config.level)
        .with_context(|| format!("invalid log filter '{}'", config.level))?;

    let console_writer = if config.stderr {
        BoxMakeWriter::new(std::io::stderr)
    } else {
        BoxMakeWriter::new(std::io::stdout)
    };
    let (json_layer, text_layer) = if config.json {
        let layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_writer(console_writer);
        (Some(layer), None)
    } else {
        let layer = fmt::layer().compact().with_target(false).with_writer(console_writer);
        (None, Some(layer))
    };

    let (file_layer, file_guard) = match &config.file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let name = path
                .file_name()
                .with_context(|| format!("log file path has no file name: {}", path.display()))?;
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::never(&dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .with(file_layer);
    let default = tracing::subscriber::set_default(subscriber);

    Ok(LoggingGuards {
        _default: default,
        _file: file_guard,
    })
}
