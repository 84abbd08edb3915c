//! Source tracking for configuration values.

use serde::Serialize;
use std::fmt;

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    /// Built-in default.
    Default,
    /// Loaded from a `.env` file.
    DotEnv,
    /// Process environment.
    Environment,
    /// Command-line flag.
    CommandLine,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::DotEnv => write!(f, ".env"),
            Self::Environment => write!(f, "environment"),
            Self::CommandLine => write!(f, "command line"),
        }
    }
}

/// A value paired with the source it was resolved from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sourced<T> {
    pub value: T,
    pub source: ConfigSource,
    /// Variable name the value was read from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub var: Option<String>,
}

impl<T> Sourced<T> {
    pub fn new(value: T, source: ConfigSource, var: Option<String>) -> Self {
        Self { value, source, var }
    }

    pub fn default_value(value: T) -> Self {
        Self::new(value, ConfigSource::Default, None)
    }

    pub fn from_lookup(value: T, source: ConfigSource, var: impl Into<String>) -> Self {
        Self::new(value, source, Some(var.into()))
    }

    pub fn command_line(value: T, flag: impl Into<String>) -> Self {
        Self::new(value, ConfigSource::CommandLine, Some(flag.into()))
    }

    /// Transform the value while keeping its origin.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sourced<U> {
        Sourced {
            value: f(self.value),
            source: self.source,
            var: self.var,
        }
    }

    /// Human-readable origin, e.g. `environment (HELM)`.
    pub fn origin(&self) -> String {
        match &self.var {
            Some(var) => format!("{} ({})", self.source, var),
            None => self.source.to_string(),
        }
    }
}
