//! Chart discovery.
//!
//! Walks the charts root depth-first in name order. Each directory gets one
//! decision: skip it (name matches the skip pattern), treat it as a chart
//! root (contains `Chart.yaml`/`Chart.yml`; its subtree is not searched
//! further, so vendored subcharts are never validated on their own), descend
//! into its subdirectories, or report it unreadable.

use crate::types::{CHART_DESCRIPTORS, Chart, ChartFixtures, TestCase, ValuesFile};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default skip pattern: version-control metadata.
pub const DEFAULT_SKIP_PATTERN: &str = r"\.git";

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("charts directory {path} cannot be read: {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("charts directory {path} is not a directory")]
    RootNotDirectory { path: PathBuf },

    #[error("fixtures of chart {chart} cannot be read from {path}: {source}")]
    FixturesUnreadable {
        chart: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("directory {path} cannot be read: {source}")]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Directory-name pattern, anchored to the whole name.
#[derive(Debug, Clone)]
pub struct SkipPattern {
    pattern: String,
    regex: Regex,
}

impl SkipPattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{pattern})$"))?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    /// The pattern as configured, without anchors.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}

impl Default for SkipPattern {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_SKIP_PATTERN.to_string(),
            regex: Regex::new(&format!("^(?:{DEFAULT_SKIP_PATTERN})$"))
                .expect("default skip pattern is a valid regex"),
        }
    }
}

impl PartialEq for SkipPattern {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryOptions {
    pub skip_pattern: SkipPattern,
    /// Fixture subdirectory name inside each chart.
    pub tests_dir: String,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            skip_pattern: SkipPattern::default(),
            tests_dir: crate::types::DEFAULT_TESTS_DIRECTORY.to_string(),
        }
    }
}

/// A non-fatal discovery problem, kept for the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryIssue {
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<String>,
    pub message: String,
}

impl From<&DiscoveryError> for DiscoveryIssue {
    fn from(err: &DiscoveryError) -> Self {
        let (path, chart) = match err {
            DiscoveryError::RootUnreadable { path, .. }
            | DiscoveryError::RootNotDirectory { path }
            | DiscoveryError::DirectoryUnreadable { path, .. } => (path.clone(), None),
            DiscoveryError::FixturesUnreadable { chart, path, .. } => {
                (path.clone(), Some(chart.clone()))
            }
        };
        Self {
            path,
            chart,
            message: err.to_string(),
        }
    }
}

/// Everything found under the charts root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    pub charts: Vec<ChartFixtures>,
    pub issues: Vec<DiscoveryIssue>,
    tests_dir: String,
}

impl Discovery {
    /// Test cases in discovery order, fixtures in enumeration order.
    pub fn test_cases(&self) -> Vec<TestCase> {
        self.charts
            .iter()
            .flat_map(|entry| {
                entry.values_files.iter().map(|values| {
                    TestCase::new(entry.chart.clone(), values.clone(), &self.tests_dir)
                })
            })
            .collect()
    }

    pub fn case_count(&self) -> usize {
        self.charts.iter().map(|c| c.values_files.len()).sum()
    }
}

/// Per-directory traversal decision.
enum Visit {
    Descend(Vec<PathBuf>),
    ChartRoot,
    SkipSubtree,
    Unreadable(io::Error),
}

fn visit(dir: &Path, options: &DiscoveryOptions, is_root: bool) -> Visit {
    if !is_root
        && let Some(name) = dir.file_name()
        && options.skip_pattern.matches(&name.to_string_lossy())
    {
        return Visit::SkipSubtree;
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => return Visit::Unreadable(err),
    };

    let mut children = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => return Visit::Unreadable(err),
        };
        let is_descriptor = entry
            .file_name()
            .to_str()
            .is_some_and(|name| CHART_DESCRIPTORS.contains(&name));
        if is_descriptor && entry.path().is_file() {
            return Visit::ChartRoot;
        }
        // Symlinked directories are not followed.
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            children.push(entry.path());
        }
    }
    children.sort();
    Visit::Descend(children)
}

/// Find every chart under `root` and enumerate its fixtures.
///
/// Only problems with `root` itself are returned as errors; everything else
/// is logged and recorded in [`Discovery::issues`].
pub fn discover_charts(root: &Path, options: &DiscoveryOptions) -> Result<Discovery, DiscoveryError> {
    let meta = fs::metadata(root).map_err(|source| DiscoveryError::RootUnreadable {
        path: root.to_path_buf(),
        source,
    })?;
    if !meta.is_dir() {
        return Err(DiscoveryError::RootNotDirectory {
            path: root.to_path_buf(),
        });
    }

    let mut charts = Vec::new();
    let mut issues = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let is_root = dir.as_path() == root;
        match visit(&dir, options, is_root) {
            Visit::SkipSubtree => {
                info!(path = %dir.display(), "matching skip regex, skipping");
            }
            Visit::Descend(children) => {
                // Reverse so the lexically first child is popped first.
                stack.extend(children.into_iter().rev());
            }
            Visit::ChartRoot => {
                let chart = Chart::new(&dir);
                match enumerate_fixtures(&chart, &options.tests_dir) {
                    Ok(values_files) => {
                        if values_files.is_empty() {
                            warn!(chart = %chart.name, "chart has no fixture values files");
                        }
                        debug!(chart = %chart.name, fixtures = values_files.len(), "chart discovered");
                        charts.push(ChartFixtures {
                            chart,
                            values_files,
                        });
                    }
                    Err(source) => {
                        let err = DiscoveryError::FixturesUnreadable {
                            chart: chart.name.clone(),
                            path: chart.dir.join(&options.tests_dir),
                            source,
                        };
                        warn!(chart = %chart.name, error = %err, "could not open fixture directory");
                        issues.push(DiscoveryIssue::from(&err));
                    }
                }
            }
            Visit::Unreadable(source) if is_root => {
                return Err(DiscoveryError::RootUnreadable { path: dir, source });
            }
            Visit::Unreadable(source) => {
                let err = DiscoveryError::DirectoryUnreadable { path: dir, source };
                warn!(error = %err, "skipping path");
                issues.push(DiscoveryIssue::from(&err));
            }
        }
    }

    Ok(Discovery {
        charts,
        issues,
        tests_dir: options.tests_dir.clone(),
    })
}

/// List the values files directly inside the chart's fixture directory.
///
/// Does not recurse; entries named like the fixture directory itself and
/// entries that are not files are left out.
pub fn enumerate_fixtures(chart: &Chart, tests_dir: &str) -> io::Result<Vec<ValuesFile>> {
    let dir = chart.dir.join(tests_dir);
    let mut values = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == tests_dir {
            continue;
        }
        if !entry.path().is_file() {
            debug!(chart = %chart.name, entry = %name, "not a values file, skipping");
            continue;
        }
        values.push(ValuesFile::new(name));
    }
    values.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn chart(root: &Path, rel: &str, fixtures: &[&str]) -> PathBuf {
        let dir = root.join(rel);
        fs::create_dir_all(dir.join("tests")).unwrap();
        fs::write(dir.join("Chart.yaml"), "apiVersion: v2\nname: x\nversion: 0.1.0\n").unwrap();
        for f in fixtures {
            fs::write(dir.join("tests").join(f), "replicaCount: 1\n").unwrap();
        }
        dir
    }

    fn names(discovery: &Discovery) -> Vec<String> {
        discovery.charts.iter().map(|c| c.chart.name.clone()).collect()
    }

    #[test]
    fn skip_pattern_is_anchored() {
        let pattern = SkipPattern::default();
        assert!(pattern.matches(".git"));
        assert!(!pattern.matches(".github"));
        assert!(!pattern.matches("x.git"));

        let alt = SkipPattern::new(r"\.git|vendor").unwrap();
        assert!(alt.matches("vendor"));
        assert!(alt.matches(".git"));
        assert!(!alt.matches("vendored"));
    }

    #[test]
    fn invalid_skip_pattern_is_rejected() {
        assert!(SkipPattern::new("(unclosed").is_err());
    }

    #[test]
    fn discovers_charts_in_name_order() {
        let tmp = TempDir::new().unwrap();
        chart(tmp.path(), "zeta", &["a.yaml"]);
        chart(tmp.path(), "alpha", &["b.yaml", "a.yaml"]);
        chart(tmp.path(), "group/mid", &["only.yaml"]);

        let discovery = discover_charts(tmp.path(), &DiscoveryOptions::default()).unwrap();
        assert_eq!(names(&discovery), vec!["alpha", "mid", "zeta"]);
        assert_eq!(
            discovery.charts[0].values_files,
            vec![ValuesFile::new("a.yaml"), ValuesFile::new("b.yaml")]
        );
        assert_eq!(discovery.case_count(), 4);
        assert!(discovery.issues.is_empty());
    }

    #[test]
    fn subcharts_are_not_discovered() {
        let tmp = TempDir::new().unwrap();
        let parent = chart(tmp.path(), "parent", &["ok.yaml"]);
        chart(&parent, "charts/child", &["child.yaml"]);

        let discovery = discover_charts(tmp.path(), &DiscoveryOptions::default()).unwrap();
        assert_eq!(names(&discovery), vec!["parent"]);
        assert_eq!(discovery.case_count(), 1);
    }

    #[test]
    fn skipped_directories_are_never_visited() {
        let tmp = TempDir::new().unwrap();
        chart(tmp.path(), ".git/hidden", &["x.yaml"]);
        chart(tmp.path(), "visible", &["x.yaml"]);

        let discovery = discover_charts(tmp.path(), &DiscoveryOptions::default()).unwrap();
        assert_eq!(names(&discovery), vec!["visible"]);
    }

    #[test]
    fn skip_pattern_applies_before_descriptor_check() {
        let tmp = TempDir::new().unwrap();
        chart(tmp.path(), "vendor", &["x.yaml"]);
        chart(tmp.path(), "app", &["x.yaml"]);
        let options = DiscoveryOptions {
            skip_pattern: SkipPattern::new("vendor").unwrap(),
            ..DiscoveryOptions::default()
        };

        let discovery = discover_charts(tmp.path(), &options).unwrap();
        assert_eq!(names(&discovery), vec!["app"]);
    }

    #[test]
    fn alternate_descriptor_extension_is_accepted() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("legacy");
        fs::create_dir_all(dir.join("tests")).unwrap();
        fs::write(dir.join("Chart.yml"), "name: legacy\n").unwrap();
        fs::write(dir.join("tests/default.yaml"), "").unwrap();

        let discovery = discover_charts(tmp.path(), &DiscoveryOptions::default()).unwrap();
        assert_eq!(names(&discovery), vec!["legacy"]);
    }

    #[test]
    fn root_may_itself_be_a_chart() {
        let tmp = TempDir::new().unwrap();
        let dir = chart(tmp.path(), "single", &["ok.yaml"]);

        let discovery = discover_charts(&dir, &DiscoveryOptions::default()).unwrap();
        assert_eq!(names(&discovery), vec!["single"]);
    }

    #[test]
    fn fixtures_exclude_directories_and_do_not_recurse() {
        let tmp = TempDir::new().unwrap();
        let dir = chart(tmp.path(), "app", &["ok.yaml"]);
        fs::create_dir_all(dir.join("tests/nested")).unwrap();
        fs::write(dir.join("tests/nested/deep.yaml"), "").unwrap();
        fs::create_dir_all(dir.join("tests/tests")).unwrap();

        let values = enumerate_fixtures(&Chart::new(&dir), "tests").unwrap();
        assert_eq!(values, vec![ValuesFile::new("ok.yaml")]);
    }

    #[test]
    fn missing_fixture_directory_is_scoped_to_chart() {
        let tmp = TempDir::new().unwrap();
        let broken = tmp.path().join("broken");
        fs::create_dir_all(&broken).unwrap();
        fs::write(broken.join("Chart.yaml"), "name: broken\n").unwrap();
        chart(tmp.path(), "healthy", &["a.yaml", "b.yaml"]);

        let discovery = discover_charts(tmp.path(), &DiscoveryOptions::default()).unwrap();
        assert_eq!(names(&discovery), vec!["healthy"]);
        assert_eq!(discovery.case_count(), 2);
        assert_eq!(discovery.issues.len(), 1);
        assert_eq!(discovery.issues[0].chart.as_deref(), Some("broken"));
    }

    #[test]
    fn custom_tests_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("app");
        fs::create_dir_all(dir.join("ci")).unwrap();
        fs::write(dir.join("Chart.yaml"), "name: app\n").unwrap();
        fs::write(dir.join("ci/values.yaml"), "").unwrap();
        let options = DiscoveryOptions {
            tests_dir: "ci".to_string(),
            ..DiscoveryOptions::default()
        };

        let discovery = discover_charts(tmp.path(), &options).unwrap();
        let cases = discovery.test_cases();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].values_path, dir.join("ci/values.yaml"));
    }

    #[test]
    fn missing_root_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let err = discover_charts(&tmp.path().join("nope"), &DiscoveryOptions::default())
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::RootUnreadable { .. }));
    }

    #[test]
    fn file_root_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("Chart.yaml");
        fs::write(&file, "").unwrap();
        let err = discover_charts(&file, &DiscoveryOptions::default()).unwrap_err();
        assert!(matches!(err, DiscoveryError::RootNotDirectory { .. }));
    }

    #[test]
    fn discovery_is_repeatable() {
        let tmp = TempDir::new().unwrap();
        chart(tmp.path(), "b", &["2.yaml", "1.yaml"]);
        chart(tmp.path(), "a", &["x.yaml"]);
        let first = discover_charts(tmp.path(), &DiscoveryOptions::default()).unwrap();
        let second = discover_charts(tmp.path(), &DiscoveryOptions::default()).unwrap();
        assert_eq!(first, second);
    }
}
