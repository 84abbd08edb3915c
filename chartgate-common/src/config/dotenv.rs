//! `.env` file support.
//!
//! Values from the file never override the process environment; they only
//! fill gaps. Supported syntax:
//!
//! ```text
//! # comment
//! KEY=value
//! export KEY=value
//! KEY='single quoted, taken literally'
//! KEY="double quoted\nwith escapes"
//! KEY="double quoted
//! spanning lines"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default file name looked up in the working directory.
pub const DEFAULT_DOTENV_FILE: &str = ".env";

#[derive(Debug, Error)]
pub enum DotEnvError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {reason}")]
    Syntax {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

/// Parsed contents of a `.env` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DotEnv {
    vars: BTreeMap<String, String>,
}

impl DotEnv {
    /// Load `path`. When `required` is false a missing file yields an empty set.
    pub fn load(path: &Path, required: bool) -> Result<Self, DotEnvError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(DotEnvError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::parse(&content).map_err(|(line, reason)| DotEnvError::Syntax {
            path: path.to_path_buf(),
            line,
            reason,
        })
    }

    /// Parse file content. Errors carry the 1-based line number.
    pub fn parse(content: &str) -> Result<Self, (usize, String)> {
        let mut vars = BTreeMap::new();
        let mut lines = content.lines().enumerate();

        while let Some((idx, raw)) = lines.next() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line = line.strip_prefix("export ").unwrap_or(line).trim_start();

            let Some((key, rest)) = line.split_once('=') else {
                return Err((line_no, format!("expected KEY=value, got '{line}'")));
            };
            let key = key.trim();
            if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err((line_no, format!("invalid variable name '{key}'")));
            }

            let rest = rest.trim_start();
            let value = if let Some(body) = rest.strip_prefix('\'') {
                match body.find('\'') {
                    Some(end) => body[..end].to_string(),
                    None => return Err((line_no, "unterminated single quote".to_string())),
                }
            } else if let Some(body) = rest.strip_prefix('"') {
                let mut buf = body.to_string();
                loop {
                    if let Some(end) = closing_quote(&buf) {
                        buf.truncate(end);
                        break unescape_double_quoted(&buf);
                    }
                    match lines.next() {
                        Some((_, next)) => {
                            buf.push('\n');
                            buf.push_str(next);
                        }
                        None => return Err((line_no, "unterminated double quote".to_string())),
                    }
                }
            } else {
                // Unquoted: strip trailing inline comment.
                let value = match rest.find(" #") {
                    Some(pos) => &rest[..pos],
                    None => rest,
                };
                value.trim_end().to_string()
            };

            vars.insert(key.to_string(), value);
        }

        Ok(Self { vars })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Byte offset of the first unescaped `"` in `s`.
fn closing_quote(s: &str) -> Option<usize> {
    let mut escaped = false;
    for (idx, c) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return Some(idx);
        }
    }
    None
}

fn unescape_double_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
