//! Deterministic in-memory doubles for the subprocess port and both adapters.

use crate::errors::{ExitDisplay, RenderError, ValidationError};
use crate::process::{CommandRunner, Invocation, ProcessError, ProcessOutput};
use crate::render::ManifestRenderer;
use crate::types::{RenderedManifest, TestCase};
use crate::validate::{Diagnostics, ManifestValidator, ValidateOptions, ValidatorOutput};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted [`CommandRunner`]. Results are consumed FIFO.
#[derive(Debug, Clone, Default)]
pub struct MockCommandRunner {
    scripted_results: Arc<Mutex<VecDeque<Result<ProcessOutput, ProcessError>>>>,
    recorded_calls: Arc<Mutex<Vec<Invocation>>>,
}

impl MockCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a scripted result.
    pub fn push_result(&self, result: Result<ProcessOutput, ProcessError>) {
        self.scripted_results
            .lock()
            .expect("scripted_results mutex poisoned")
            .push_back(result);
    }

    /// Snapshot of all invocations received.
    #[must_use]
    pub fn calls(&self) -> Vec<Invocation> {
        self.recorded_calls
            .lock()
            .expect("recorded_calls mutex poisoned")
            .clone()
    }
}

impl CommandRunner for MockCommandRunner {
    async fn run(&self, invocation: Invocation) -> Result<ProcessOutput, ProcessError> {
        let program = invocation.program.display().to_string();
        self.recorded_calls
            .lock()
            .expect("recorded_calls mutex poisoned")
            .push(invocation);

        self.scripted_results
            .lock()
            .expect("scripted_results mutex poisoned")
            .pop_front()
            .unwrap_or_else(|| {
                Err(ProcessError::Spawn {
                    program,
                    source: std::io::Error::other("mock runner has no scripted results"),
                })
            })
    }
}

/// How [`MockRenderer`] answers for one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderScript {
    Manifest(String),
    TemplateFailure(String),
    DependencyFailure(String),
    TimedOut,
}

/// Renderer double keyed by case label (`chart/values`).
///
/// Unscripted cases render a one-document manifest naming the case, so a
/// validator double can tell cases apart.
#[derive(Debug, Clone, Default)]
pub struct MockRenderer {
    scripts: Arc<Mutex<HashMap<String, RenderScript>>>,
    recorded_calls: Arc<Mutex<Vec<(String, bool)>>>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, label: impl Into<String>, script: RenderScript) {
        self.scripts
            .lock()
            .expect("scripts mutex poisoned")
            .insert(label.into(), script);
    }

    /// Labels rendered so far with their dependency-refresh flag.
    #[must_use]
    pub fn calls(&self) -> Vec<(String, bool)> {
        self.recorded_calls
            .lock()
            .expect("recorded_calls mutex poisoned")
            .clone()
    }

    pub fn default_manifest(label: &str) -> String {
        format!("# Source: {label}\napiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: case\n")
    }
}

impl ManifestRenderer for MockRenderer {
    async fn render(
        &self,
        case: &TestCase,
        refresh_dependencies: bool,
    ) -> Result<RenderedManifest, RenderError> {
        let label = case.label();
        self.recorded_calls
            .lock()
            .expect("recorded_calls mutex poisoned")
            .push((label.clone(), refresh_dependencies));

        let script = self
            .scripts
            .lock()
            .expect("scripts mutex poisoned")
            .get(&label)
            .cloned();
        match script {
            None => Ok(RenderedManifest::new(
                Self::default_manifest(&label).into_bytes(),
            )),
            Some(RenderScript::Manifest(text)) => Ok(RenderedManifest::new(text.into_bytes())),
            Some(RenderScript::TemplateFailure(stderr)) => Err(RenderError::Template {
                exit: ExitDisplay(Some(1)),
                stderr,
            }),
            Some(RenderScript::DependencyFailure(stderr)) if refresh_dependencies => {
                Err(RenderError::DependencyBuild {
                    exit: ExitDisplay(Some(1)),
                    stderr,
                })
            }
            Some(RenderScript::DependencyFailure(_)) => Ok(RenderedManifest::new(
                Self::default_manifest(&label).into_bytes(),
            )),
            Some(RenderScript::TimedOut) => Err(RenderError::Process(ProcessError::TimedOut {
                program: "helm".to_string(),
                timeout: Duration::from_secs(600),
            })),
        }
    }
}

/// Validator double that rejects manifests containing a scripted needle.
#[derive(Debug, Clone, Default)]
pub struct MockValidator {
    rejections: Arc<Mutex<Vec<(String, Diagnostics)>>>,
    unavailable: Arc<Mutex<bool>>,
    recorded_calls: Arc<Mutex<Vec<(RenderedManifest, ValidateOptions)>>>,
}

impl MockValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject any manifest whose text contains `needle`.
    pub fn reject_containing(&self, needle: impl Into<String>, diagnostics: Diagnostics) {
        self.rejections
            .lock()
            .expect("rejections mutex poisoned")
            .push((needle.into(), diagnostics));
    }

    /// Make every validation fail to launch.
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().expect("unavailable mutex poisoned") = unavailable;
    }

    /// Snapshot of every manifest and options set received.
    #[must_use]
    pub fn calls(&self) -> Vec<(RenderedManifest, ValidateOptions)> {
        self.recorded_calls
            .lock()
            .expect("recorded_calls mutex poisoned")
            .clone()
    }
}

impl ManifestValidator for MockValidator {
    async fn validate(
        &self,
        manifest: RenderedManifest,
        options: &ValidateOptions,
    ) -> Result<ValidatorOutput, ValidationError> {
        let text = String::from_utf8_lossy(manifest.as_bytes()).into_owned();
        self.recorded_calls
            .lock()
            .expect("recorded_calls mutex poisoned")
            .push((manifest, options.clone()));

        if *self.unavailable.lock().expect("unavailable mutex poisoned") {
            return Err(ValidationError::Process(ProcessError::Spawn {
                program: "kubeconform".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            }));
        }

        let rejection = self
            .rejections
            .lock()
            .expect("rejections mutex poisoned")
            .iter()
            .find(|(needle, _)| text.contains(needle.as_str()))
            .map(|(_, diagnostics)| diagnostics.clone());
        Ok(match rejection {
            Some(diagnostics) => ValidatorOutput {
                success: false,
                exit_code: Some(1),
                diagnostics,
            },
            None => ValidatorOutput {
                success: true,
                exit_code: Some(0),
                diagnostics: Diagnostics::Raw(String::new()),
            },
        })
    }
}
