//! Error taxonomy for chartgate.
//!
//! | Code     | Category      | Scope                         | Fatal |
//! |----------|---------------|-------------------------------|-------|
//! | CG-E001  | Configuration | whole run                     | yes   |
//! | CG-E100  | Discovery     | charts root                   | yes   |
//! | CG-E101  | Discovery     | one chart or directory        | no    |
//! | CG-E200  | Render        | one test case                 | no    |
//! | CG-E300  | Validation    | one test case                 | no    |
//!
//! Case-scoped errors are captured into the report instead of propagated.

use crate::config::ConfigError;
use crate::discovery::DiscoveryError;
use crate::process::ProcessError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Category of a chartgate error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Configuration,
    Discovery,
    Render,
    Validation,
}

impl ErrorCategory {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration => "CG-E001",
            Self::Discovery => "CG-E100",
            Self::Render => "CG-E200",
            Self::Validation => "CG-E300",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Configuration => "configuration",
            Self::Discovery => "discovery",
            Self::Render => "render",
            Self::Validation => "validation",
        };
        write!(f, "{name}")
    }
}

/// Failure of the render stage for one case.
#[derive(Debug, Error)]
pub enum RenderError {
    /// `helm dependency build` exited non-zero.
    #[error("dependency build failed (exit {exit}): {stderr}")]
    DependencyBuild { exit: ExitDisplay, stderr: String },

    /// `helm template` exited non-zero.
    #[error("helm template failed (exit {exit}): {stderr}")]
    Template { exit: ExitDisplay, stderr: String },

    /// The renderer could not be launched or did not finish.
    #[error("renderer did not run: {0}")]
    Process(#[from] ProcessError),
}

/// Failure of the validation stage for one case.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The validator could not be launched or did not finish.
    #[error("validator did not run: {0}")]
    Process(#[from] ProcessError),
}

/// Exit code rendered for error messages; `signal` when none is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitDisplay(pub Option<i32>);

impl fmt::Display for ExitDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(code) => write!(f, "{code}"),
            None => write!(f, "signal"),
        }
    }
}

/// Errors that end a run before or during discovery.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("[{code}] {0}", code = ErrorCategory::Configuration.code())]
    Configuration(#[from] ConfigError),

    #[error("[{code}] {0}", code = ErrorCategory::Discovery.code())]
    Discovery(#[from] DiscoveryError),
}

impl GateError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Discovery(_) => ErrorCategory::Discovery,
        }
    }
}
