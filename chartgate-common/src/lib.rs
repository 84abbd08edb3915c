//! Shared engine for chartgate: chart discovery, rendering through `helm`,
//! validation through `kubeconform`, and result aggregation.

pub mod config;
pub mod discovery;
pub mod errors;
pub mod logging;
pub mod mock;
pub mod process;
pub mod render;
pub mod report;
pub mod runner;
pub mod types;
pub mod validate;

pub use config::{ConfigError, ConfigOverrides, GateConfig};
pub use discovery::{Discovery, DiscoveryError, DiscoveryOptions, discover_charts};
pub use errors::{ErrorCategory, GateError, RenderError, ValidationError};
pub use logging::{LogConfig, LoggingGuards, init_logging};
pub use process::{CommandRunner, Invocation, ProcessError, ProcessOutput, TokioCommandRunner};
pub use render::{HelmRenderer, ManifestRenderer, RenderOptions};
pub use report::{OutcomeStatus, Report, ValidationOutcome};
pub use runner::{MatrixRunner, RunOptions};
pub use types::{Chart, RenderedManifest, TestCase, ValuesFile};
pub use validate::{Diagnostics, KubeconformValidator, ManifestValidator, ValidateOptions};
