//! Environment variable parsing with type safety.
//!
//! Provides a type-safe parser for chartgate settings with validation, error
//! collection, and source tracking. Values are resolved through a lookup
//! chain (process environment first, then an optional `.env` file), so tests
//! can inject their own lookup instead of touching the process environment.

use super::dotenv::DotEnv;
use super::source::{ConfigSource, Sourced};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during environment variable parsing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnvError {
    /// Invalid value for a variable.
    #[error("Invalid value for {var}: expected {expected}, got '{value}'")]
    InvalidValue {
        var: String,
        expected: String,
        value: String,
    },

    /// A required variable is unset or blank.
    #[error("Missing required variable {var}")]
    Missing { var: String },

    /// Path could not be resolved.
    #[error("Invalid path for {var}: '{value}' ({reason})")]
    InvalidPath {
        var: String,
        value: String,
        reason: String,
    },

    /// Invalid duration format.
    #[error("Invalid duration for {var}: {value}")]
    InvalidDuration { var: String, value: String },

    /// Invalid log level.
    #[error("Invalid log level for {var}: {value}")]
    InvalidLogLevel { var: String, value: String },
}

type Lookup = Box<dyn Fn(&str) -> Option<(String, ConfigSource)> + Send + Sync>;

/// Type-safe environment variable parser.
///
/// Collects errors during parsing so all issues can be reported at once.
pub struct EnvParser {
    prefix: &'static str,
    lookup: Lookup,
    errors: Vec<EnvError>,
}

impl EnvParser {
    /// Parser over the process environment only.
    pub fn new() -> Self {
        Self::from_lookup(|name| {
            std::env::var(name)
                .ok()
                .map(|value| (value, ConfigSource::Environment))
        })
    }

    /// Parser over the process environment, falling back to `dotenv`.
    pub fn with_dotenv(dotenv: DotEnv) -> Self {
        Self::from_lookup(move |name| match std::env::var(name) {
            Ok(value) => Some((value, ConfigSource::Environment)),
            Err(_) => dotenv
                .get(name)
                .map(|value| (value.to_string(), ConfigSource::DotEnv)),
        })
    }

    /// Parser over an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<(String, ConfigSource)> + Send + Sync + 'static,
    {
        Self {
            prefix: "",
            lookup: Box::new(lookup),
            errors: Vec::new(),
        }
    }

    /// Prepend `prefix` to every variable name looked up.
    #[must_use]
    pub fn with_prefix(mut self, prefix: &'static str) -> Self {
        self.prefix = prefix;
        self
    }

    /// Get all accumulated errors.
    pub fn errors(&self) -> &[EnvError] {
        &self.errors
    }

    /// Check if any errors occurred.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Take ownership of errors.
    pub fn take_errors(&mut self) -> Vec<EnvError> {
        std::mem::take(&mut self.errors)
    }

    /// Record an error found by a caller-side validation.
    pub fn push_error(&mut self, error: EnvError) {
        self.errors.push(error);
    }

    /// Get the full variable name with prefix.
    pub fn var_name(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    fn raw(&self, name: &str) -> (String, Option<(String, ConfigSource)>) {
        let var_name = self.var_name(name);
        let found = (self.lookup)(&var_name);
        (var_name, found)
    }

    /// Get a string value with default.
    pub fn get_string(&mut self, name: &str, default: &str) -> Sourced<String> {
        match self.raw(name) {
            (var, Some((value, source))) => Sourced::from_lookup(value, source, var),
            (_, None) => Sourced::default_value(default.to_string()),
        }
    }

    /// Get a boolean value with default.
    ///
    /// Accepts: 1, true, yes, on (for true)
    ///          0, false, no, off, "" (for false)
    pub fn get_bool(&mut self, name: &str, default: bool) -> Sourced<bool> {
        match self.raw(name) {
            (var, Some((value, source))) => {
                let parsed = match value.trim().to_lowercase().as_str() {
                    "1" | "true" | "yes" | "on" => true,
                    "0" | "false" | "no" | "off" | "" => false,
                    _ => {
                        self.errors.push(EnvError::InvalidValue {
                            var: var.clone(),
                            expected: "boolean (true/false/1/0/yes/no)".to_string(),
                            value: value.clone(),
                        });
                        default
                    }
                };
                Sourced::from_lookup(parsed, source, var)
            }
            (_, None) => Sourced::default_value(default),
        }
    }

    /// Get a path, expanding `~/` and making it absolute against the
    /// working directory. Blank values record [`EnvError::Missing`].
    pub fn get_required_path(&mut self, name: &str) -> Option<Sourced<PathBuf>> {
        match self.raw(name) {
            (var, Some((value, source))) if !value.trim().is_empty() => {
                match absolutize(value.trim()) {
                    Ok(path) => Some(Sourced::from_lookup(path, source, var)),
                    Err(reason) => {
                        self.errors.push(EnvError::InvalidPath { var, value, reason });
                        None
                    }
                }
            }
            (var, _) => {
                self.errors.push(EnvError::Missing { var });
                None
            }
        }
    }

    /// Get an executable path. Bare names (no separator) are kept as-is so
    /// they resolve through `PATH` at spawn time; anything else is made
    /// absolute.
    pub fn get_executable(&mut self, name: &str, default: &str) -> Sourced<PathBuf> {
        let sourced = self.get_string(name, default);
        let trimmed = sourced.value.trim().to_string();
        let var = self.var_name(name);
        if trimmed.is_empty() {
            self.errors.push(EnvError::Missing { var });
            return sourced.map(|_| PathBuf::from(default));
        }
        if !trimmed.contains('/')
            && !trimmed.contains(std::path::MAIN_SEPARATOR)
            && !trimmed.starts_with('~')
        {
            return sourced.map(|_| PathBuf::from(trimmed));
        }
        match absolutize(&trimmed) {
            Ok(path) => sourced.map(|_| path),
            Err(reason) => {
                self.errors.push(EnvError::InvalidPath {
                    var,
                    value: trimmed,
                    reason,
                });
                sourced.map(|_| PathBuf::from(default))
            }
        }
    }

    /// Get an optional path (None if not set or blank).
    pub fn get_optional_path(&mut self, name: &str) -> Sourced<Option<PathBuf>> {
        match self.raw(name) {
            (var, Some((value, source))) if value.trim().is_empty() => {
                Sourced::from_lookup(None, source, var)
            }
            (var, Some((value, source))) => match absolutize(value.trim()) {
                Ok(path) => Sourced::from_lookup(Some(path), source, var),
                Err(reason) => {
                    self.errors.push(EnvError::InvalidPath {
                        var: var.clone(),
                        value,
                        reason,
                    });
                    Sourced::from_lookup(None, source, var)
                }
            },
            (_, None) => Sourced::default_value(None),
        }
    }

    /// Get a newline-separated list of schema locations.
    ///
    /// Entries are trimmed and blank entries dropped. Entries that look like
    /// URLs (`scheme://...`) are kept verbatim; everything else is treated as
    /// a local path or path template and made absolute.
    pub fn get_location_list(&mut self, name: &str) -> Sourced<Vec<String>> {
        let (var, found) = self.raw(name);
        let Some((value, source)) = found else {
            return Sourced::default_value(Vec::new());
        };

        let mut items = Vec::new();
        for entry in value.lines().map(str::trim).filter(|s| !s.is_empty()) {
            if entry.contains("://") {
                items.push(entry.to_string());
                continue;
            }
            match absolutize(entry) {
                Ok(path) => items.push(path.display().to_string()),
                Err(reason) => self.errors.push(EnvError::InvalidPath {
                    var: var.clone(),
                    value: entry.to_string(),
                    reason,
                }),
            }
        }
        Sourced::from_lookup(items, source, var)
    }

    /// Get a duration in humantime syntax (`90s`, `10m`). `0` and `none`
    /// disable the bound and yield `None`.
    pub fn get_duration(&mut self, name: &str, default: Option<Duration>) -> Sourced<Option<Duration>> {
        match self.raw(name) {
            (var, Some((value, source))) => {
                let trimmed = value.trim();
                if trimmed == "0" || trimmed.eq_ignore_ascii_case("none") {
                    return Sourced::from_lookup(None, source, var);
                }
                match humantime::parse_duration(trimmed) {
                    Ok(d) if d.is_zero() => Sourced::from_lookup(None, source, var),
                    Ok(d) => Sourced::from_lookup(Some(d), source, var),
                    Err(_) => {
                        self.errors.push(EnvError::InvalidDuration {
                            var: var.clone(),
                            value: value.clone(),
                        });
                        Sourced::from_lookup(default, source, var)
                    }
                }
            }
            (_, None) => Sourced::default_value(default),
        }
    }

    /// Get a log level value with validation.
    pub fn get_log_level(&mut self, name: &str, default: &str) -> Sourced<String> {
        match self.raw(name) {
            (var, Some((value, source))) => {
                let lower = value.trim().to_lowercase();
                match lower.as_str() {
                    "trace" | "debug" | "info" | "warn" | "error" | "off" => {
                        Sourced::from_lookup(lower, source, var)
                    }
                    _ => {
                        self.errors.push(EnvError::InvalidLogLevel {
                            var: var.clone(),
                            value: value.clone(),
                        });
                        Sourced::from_lookup(default.to_string(), source, var)
                    }
                }
            }
            (_, None) => Sourced::default_value(default.to_string()),
        }
    }
}

impl Default for EnvParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Expand `~/` and resolve against the current directory without touching
/// the filesystem.
pub(crate) fn absolutize(value: &str) -> Result<PathBuf, String> {
    let expanded = match value.strip_prefix("~/") {
        Some(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => return Err("cannot determine home directory".to_string()),
        },
        None => PathBuf::from(value),
    };
    std::path::absolute(Path::new(&expanded)).map_err(|e| e.to_string())
}
