//! Configuration system for chartgate.
//!
//! This module provides:
//! - Environment variable parsing with type safety
//! - .env file support
//! - Source tracking for debugging
//! - Validation on startup, reporting every problem at once

pub mod dotenv;
pub mod env;
pub mod gate;
pub mod source;

pub use dotenv::{DEFAULT_DOTENV_FILE, DotEnv, DotEnvError};
pub use env::{EnvError, EnvParser};
pub use gate::{ConfigError, ConfigOverrides, ConfigRow, GateConfig};
pub use source::{ConfigSource, Sourced};
