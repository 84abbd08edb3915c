//! Common types shared by discovery, the matrix runner and reporting.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File names that mark a directory as a chart root, canonical name first.
pub const CHART_DESCRIPTORS: [&str; 2] = ["Chart.yaml", "Chart.yml"];

/// Default name of the fixture subdirectory inside a chart.
pub const DEFAULT_TESTS_DIRECTORY: &str = "tests";

/// A chart root found during discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chart {
    /// Display name: the base name of the chart directory.
    pub name: String,
    /// Chart root directory.
    pub dir: PathBuf,
}

impl Chart {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string());
        Self { name, dir }
    }
}

impl std::fmt::Display for Chart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A fixture values file, named relative to the chart's fixture directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValuesFile(pub String);

impl ValuesFile {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ValuesFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A discovered chart together with its fixtures, in enumeration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartFixtures {
    pub chart: Chart,
    pub values_files: Vec<ValuesFile>,
}

/// One (chart, values file) pairing to render and validate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub chart: Chart,
    pub values_file: ValuesFile,
    /// Resolved path of the values file.
    pub values_path: PathBuf,
}

impl TestCase {
    pub fn new(chart: Chart, values_file: ValuesFile, tests_dir: &str) -> Self {
        let values_path = chart.dir.join(tests_dir).join(values_file.as_str());
        Self {
            chart,
            values_file,
            values_path,
        }
    }

    pub fn chart_dir(&self) -> &Path {
        &self.chart.dir
    }

    /// `chart/values` label used in logs and summaries.
    pub fn label(&self) -> String {
        format!("{}/{}", self.chart.name, self.values_file)
    }
}

/// Rendered output of one case: zero or more concatenated manifest documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedManifest(Vec<u8>);

impl RenderedManifest {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for RenderedManifest {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}
