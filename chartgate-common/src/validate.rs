//! Validator adapter: streams rendered manifests into `kubeconform`.
//!
//! Pass/fail is decided by the exit status alone. Output is parsed as JSON
//! when possible purely so it can be reported in a structured way.

use crate::errors::ValidationError;
use crate::process::{CommandRunner, Invocation};
use crate::types::RenderedManifest;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Sentinel that selects kubeconform's built-in schema resolution.
pub const DEFAULT_SCHEMA_LOCATION: &str = "default";

/// Primary schema location passed to kubeconform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaLocation {
    /// `-schema-location default` plus `-kubernetes-version <v>`.
    Default,
    /// Explicit template such as
    /// `/schemas/{{ .NormalizedKubernetesVersion }}-standalone{{ .StrictSuffix }}/{{ .ResourceKind }}{{ .KindSuffix }}.json`.
    /// The Kubernetes version is not forwarded in this mode.
    Template(String),
}

impl SchemaLocation {
    /// Blank or `default` select [`SchemaLocation::Default`].
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == DEFAULT_SCHEMA_LOCATION {
            Self::Default
        } else {
            Self::Template(trimmed.to_string())
        }
    }

    pub fn as_arg(&self) -> &str {
        match self {
            Self::Default => DEFAULT_SCHEMA_LOCATION,
            Self::Template(template) => template,
        }
    }
}

/// Per-run validation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidateOptions {
    pub strict: bool,
    pub schema_location: SchemaLocation,
    /// Extra `-schema-location` values in configured order.
    pub additional_schema_locations: Vec<String>,
    pub kubernetes_version: String,
    /// `-output` value; empty leaves kubeconform's default.
    pub output_format: String,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            strict: true,
            schema_location: SchemaLocation::Default,
            additional_schema_locations: Vec::new(),
            kubernetes_version: "master".to_string(),
            output_format: "json".to_string(),
        }
    }
}

/// Compose kubeconform arguments. Blank additional locations are dropped.
pub fn build_validate_args(options: &ValidateOptions) -> Vec<String> {
    let mut args = vec![
        "-schema-location".to_string(),
        options.schema_location.as_arg().to_string(),
        "-summary".to_string(),
    ];

    if options.strict {
        args.push("-strict".to_string());
    }

    if options.schema_location == SchemaLocation::Default {
        args.push("-kubernetes-version".to_string());
        args.push(options.kubernetes_version.clone());
    }

    if !options.output_format.trim().is_empty() {
        args.push("-output".to_string());
        args.push(options.output_format.trim().to_string());
    }

    for location in &options.additional_schema_locations {
        if location.trim().is_empty() {
            continue;
        }
        args.push("-schema-location".to_string());
        args.push(location.trim().to_string());
    }

    args
}

/// Validator output, kept structured when it parsed as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Diagnostics {
    Structured(serde_json::Value),
    Raw(String),
}

impl Diagnostics {
    pub fn parse(output: &str) -> Self {
        match serde_json::from_str::<serde_json::Value>(output) {
            Ok(value) => Self::Structured(value),
            Err(_) => Self::Raw(output.trim_end().to_string()),
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }

    /// Human-readable text.
    ///
    /// For kubeconform JSON this is one `kind name: msg` line per resource
    /// that carries a message; other JSON is pretty-printed.
    pub fn to_text(&self) -> String {
        match self {
            Self::Raw(text) => text.clone(),
            Self::Structured(value) => {
                let lines = resource_messages(value);
                if lines.is_empty() {
                    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
                } else {
                    lines.join("\n")
                }
            }
        }
    }
}

fn resource_messages(value: &serde_json::Value) -> Vec<String> {
    let Some(resources) = value.get("resources").and_then(|r| r.as_array()) else {
        return Vec::new();
    };
    resources
        .iter()
        .filter_map(|resource| {
            let msg = resource.get("msg")?.as_str()?;
            if msg.is_empty() {
                return None;
            }
            let field = |key: &str| {
                resource
                    .get(key)
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string()
            };
            let subject = [field("kind"), field("name")]
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            Some(if subject.is_empty() {
                msg.to_string()
            } else {
                format!("{subject}: {msg}")
            })
        })
        .collect()
}

/// Result of one validator run that completed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub diagnostics: Diagnostics,
}

/// Validates one rendered manifest set.
pub trait ManifestValidator: Send + Sync {
    fn validate(
        &self,
        manifest: RenderedManifest,
        options: &ValidateOptions,
    ) -> impl Future<Output = Result<ValidatorOutput, ValidationError>> + Send;
}

/// [`ManifestValidator`] that runs kubeconform through a [`CommandRunner`].
#[derive(Debug, Clone)]
pub struct KubeconformValidator<R> {
    runner: R,
    program: PathBuf,
    timeout: Option<Duration>,
}

impl<R: CommandRunner> KubeconformValidator<R> {
    pub fn new(runner: R, program: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            runner,
            program: program.into(),
            timeout,
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn invocation(&self, manifest: RenderedManifest, options: &ValidateOptions) -> Invocation {
        Invocation::new(&self.program)
            .args(build_validate_args(options))
            .stdin(manifest.into_bytes())
            .timeout(self.timeout)
    }
}

impl<R: CommandRunner> ManifestValidator for KubeconformValidator<R> {
    async fn validate(
        &self,
        manifest: RenderedManifest,
        options: &ValidateOptions,
    ) -> Result<ValidatorOutput, ValidationError> {
        let output = self.runner.run(self.invocation(manifest, options)).await?;
        let diagnostics = Diagnostics::parse(&output.combined());
        debug!(
            exit_code = ?output.exit_code,
            structured = diagnostics.is_structured(),
            "kubeconform finished"
        );
        Ok(ValidatorOutput {
            success: output.success(),
            exit_code: output.exit_code,
            diagnostics,
        })
    }
}
