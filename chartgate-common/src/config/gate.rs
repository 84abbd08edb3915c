//! Resolved settings for one chartgate run.

use super::dotenv::{DEFAULT_DOTENV_FILE, DotEnv, DotEnvError};
use super::env::{EnvError, EnvParser, absolutize};
use super::source::{ConfigSource, Sourced};
use crate::discovery::{DEFAULT_SKIP_PATTERN, DiscoveryOptions, SkipPattern};
use crate::render::RenderOptions;
use crate::runner::RunOptions;
use crate::types::DEFAULT_TESTS_DIRECTORY;
use crate::validate::{DEFAULT_SCHEMA_LOCATION, SchemaLocation, ValidateOptions};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_KUBERNETES_VERSION: &str = "master";
pub const DEFAULT_OUTPUT_FORMAT: &str = "json";
pub const DEFAULT_SUBPROCESS_TIMEOUT: Duration = Duration::from_secs(600);
pub const DEFAULT_LOG_LEVEL: &str = "debug";

/// Configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    DotEnv(#[from] DotEnvError),

    #[error("invalid configuration:\n{}", format_errors(.0))]
    Invalid(Vec<EnvError>),
}

fn format_errors(errors: &[EnvError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Values supplied on the command line; they win over every other source.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub charts_directory: Option<PathBuf>,
    pub log_level: Option<String>,
}

/// One line of `chartgate config` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigRow {
    pub name: &'static str,
    pub value: String,
    pub origin: String,
}

/// Fully validated configuration.
#[derive(Debug, Clone)]
pub struct GateConfig {
    pub charts_directory: Sourced<PathBuf>,
    pub strict: Sourced<bool>,
    pub additional_schema_locations: Sourced<Vec<String>>,
    pub skip_dir_pattern: Sourced<SkipPattern>,
    pub kubernetes_version: Sourced<String>,
    pub schema_location: Sourced<SchemaLocation>,
    pub output_format: Sourced<String>,
    pub kubeconform: Sourced<PathBuf>,
    pub helm: Sourced<PathBuf>,
    pub update_dependencies: Sourced<bool>,
    pub tests_directory: Sourced<String>,
    pub subprocess_timeout: Sourced<Option<Duration>>,
    pub log_level: Sourced<String>,
    pub log_json: Sourced<bool>,
    pub log_file: Sourced<Option<PathBuf>>,
}

impl GateConfig {
    /// Resolve from the process environment and a `.env` file.
    ///
    /// `env_file` names an explicit file that must exist; without it a
    /// `.env` in the working directory is read when present.
    pub fn load(env_file: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let dotenv = match env_file {
            Some(path) => DotEnv::load(path, true)?,
            None => DotEnv::load(Path::new(DEFAULT_DOTENV_FILE), false)?,
        };
        let mut parser = EnvParser::with_dotenv(dotenv);
        Self::from_parser(&mut parser, overrides)
    }

    /// Resolve through `parser`, collecting every invalid value.
    pub fn from_parser(parser: &mut EnvParser, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let charts_directory = match &overrides.charts_directory {
            Some(dir) => {
                let raw = dir.display().to_string();
                match absolutize(&raw) {
                    Ok(path) => Some(Sourced::command_line(path, "--charts-dir")),
                    Err(reason) => {
                        parser.push_error(EnvError::InvalidPath {
                            var: "--charts-dir".to_string(),
                            value: raw,
                            reason,
                        });
                        None
                    }
                }
            }
            None => parser.get_required_path("CHARTS_DIRECTORY"),
        };

        let strict = parser.get_bool("KUBECONFORM_STRICT", true);
        let additional_schema_locations = parser.get_location_list("ADDITIONAL_SCHEMA_PATHS");

        let raw_pattern = parser.get_string("REGEX_SKIP_DIR", DEFAULT_SKIP_PATTERN);
        let skip_dir_pattern = match SkipPattern::new(&raw_pattern.value) {
            Ok(pattern) => raw_pattern.map(|_| pattern),
            Err(err) => {
                parser.push_error(EnvError::InvalidValue {
                    var: parser.var_name("REGEX_SKIP_DIR"),
                    expected: format!("regular expression ({err})"),
                    value: raw_pattern.value.clone(),
                });
                raw_pattern.map(|_| SkipPattern::default())
            }
        };

        let kubernetes_version = parser
            .get_string("KUBERNETES_VERSION", DEFAULT_KUBERNETES_VERSION)
            .map(|v| v.trim().to_string());
        if kubernetes_version.value.is_empty() {
            parser.push_error(EnvError::Missing {
                var: parser.var_name("KUBERNETES_VERSION"),
            });
        }

        let schema_location = parser
            .get_string("KUBECONFORM_SCHEMA_LOCATION", DEFAULT_SCHEMA_LOCATION)
            .map(|raw| SchemaLocation::parse(&raw));
        let output_format = parser
            .get_string("KUBECONFORM_OUTPUT", DEFAULT_OUTPUT_FORMAT)
            .map(|v| v.trim().to_string());
        let kubeconform = parser.get_executable("KUBECONFORM", "kubeconform");
        let helm = parser.get_executable("HELM", "helm");
        let update_dependencies = parser.get_bool("HELM_UPDATE_DEPENDENCIES", false);

        let tests_directory = parser
            .get_string("CHART_TESTS_DIRECTORY", DEFAULT_TESTS_DIRECTORY)
            .map(|v| v.trim().to_string());
        if !is_single_component(&tests_directory.value) {
            parser.push_error(EnvError::InvalidValue {
                var: parser.var_name("CHART_TESTS_DIRECTORY"),
                expected: "a single directory name".to_string(),
                value: tests_directory.value.clone(),
            });
        }

        let subprocess_timeout =
            parser.get_duration("SUBPROCESS_TIMEOUT", Some(DEFAULT_SUBPROCESS_TIMEOUT));
        let log_level = match &overrides.log_level {
            Some(level) => Sourced::command_line(level.clone(), "--verbose"),
            None => parser.get_log_level("LOG_LEVEL", DEFAULT_LOG_LEVEL),
        };
        let log_json = parser.get_bool("LOG_JSON", true);
        let log_file = parser.get_optional_path("LOG_FILE");

        let errors = parser.take_errors();
        match charts_directory {
            Some(charts_directory) if errors.is_empty() => Ok(Self {
                charts_directory,
                strict,
                additional_schema_locations,
                skip_dir_pattern,
                kubernetes_version,
                schema_location,
                output_format,
                kubeconform,
                helm,
                update_dependencies,
                tests_directory,
                subprocess_timeout,
                log_level,
                log_json,
                log_file,
            }),
            _ => Err(ConfigError::Invalid(errors)),
        }
    }

    pub fn discovery_options(&self) -> DiscoveryOptions {
        DiscoveryOptions {
            skip_pattern: self.skip_dir_pattern.value.clone(),
            tests_dir: self.tests_directory.value.clone(),
        }
    }

    pub fn validate_options(&self) -> ValidateOptions {
        ValidateOptions {
            strict: self.strict.value,
            schema_location: self.schema_location.value.clone(),
            additional_schema_locations: self.additional_schema_locations.value.clone(),
            kubernetes_version: self.kubernetes_version.value.clone(),
            output_format: self.output_format.value.clone(),
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            helm: self.helm.value.clone(),
            timeout: self.subprocess_timeout.value,
        }
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            refresh_dependencies: self.update_dependencies.value,
            validate: self.validate_options(),
        }
    }

    /// Every setting with its value and where it came from.
    pub fn describe(&self) -> Vec<ConfigRow> {
        fn row<T>(name: &'static str, sourced: &Sourced<T>, value: String) -> ConfigRow {
            ConfigRow {
                name,
                value,
                origin: sourced.origin(),
            }
        }
        let path = |p: &Path| p.display().to_string();
        let optional_duration = |d: &Option<Duration>| match d {
            Some(d) => humantime::format_duration(*d).to_string(),
            None => "none".to_string(),
        };

        vec![
            row(
                "CHARTS_DIRECTORY",
                &self.charts_directory,
                path(&self.charts_directory.value),
            ),
            row("KUBECONFORM_STRICT", &self.strict, self.strict.value.to_string()),
            row(
                "ADDITIONAL_SCHEMA_PATHS",
                &self.additional_schema_locations,
                self.additional_schema_locations.value.join(", "),
            ),
            row(
                "REGEX_SKIP_DIR",
                &self.skip_dir_pattern,
                self.skip_dir_pattern.value.as_str().to_string(),
            ),
            row(
                "KUBERNETES_VERSION",
                &self.kubernetes_version,
                self.kubernetes_version.value.clone(),
            ),
            row(
                "KUBECONFORM_SCHEMA_LOCATION",
                &self.schema_location,
                self.schema_location.value.as_arg().to_string(),
            ),
            row(
                "KUBECONFORM_OUTPUT",
                &self.output_format,
                self.output_format.value.clone(),
            ),
            row("KUBECONFORM", &self.kubeconform, path(&self.kubeconform.value)),
            row("HELM", &self.helm, path(&self.helm.value)),
            row(
                "HELM_UPDATE_DEPENDENCIES",
                &self.update_dependencies,
                self.update_dependencies.value.to_string(),
            ),
            row(
                "CHART_TESTS_DIRECTORY",
                &self.tests_directory,
                self.tests_directory.value.clone(),
            ),
            row(
                "SUBPROCESS_TIMEOUT",
                &self.subprocess_timeout,
                optional_duration(&self.subprocess_timeout.value),
            ),
            row("LOG_LEVEL", &self.log_level, self.log_level.value.clone()),
            row("LOG_JSON", &self.log_json, self.log_json.value.to_string()),
            row(
                "LOG_FILE",
                &self.log_file,
                self.log_file
                    .value
                    .as_deref()
                    .map(path)
                    .unwrap_or_else(|| "none".to_string()),
            ),
        ]
    }

    /// Number of settings not taken from built-in defaults.
    pub fn overridden_count(&self) -> usize {
        self.describe()
            .iter()
            .filter(|row| !row.origin.starts_with(&ConfigSource::Default.to_string()))
            .count()
    }
}

fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
