use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Fake `helm`: `template` prints the values file, which the tests fill with
/// manifest YAML.
#[cfg(unix)]
const FAKE_HELM: &str = r#"#!/bin/sh
echo "$*" >> "$(dirname "$0")/helm.calls"
case "$1" in
  dependency) echo "Saving 0 charts"; exit 0 ;;
  template)
    if grep -q "render: broken" "$5"; then
      echo "Error: template: deployment.yaml:12: function \"nope\" not defined" >&2
      exit 1
    fi
    cat "$5" ;;
  *) echo "unexpected helm call: $*" >&2; exit 64 ;;
esac
"#;

/// Fake `kubeconform`: rejects manifests with a string replica count.
#[cfg(unix)]
const FAKE_KUBECONFORM: &str = r#"#!/bin/sh
echo "$*" >> "$(dirname "$0")/kubeconform.calls"
input=$(cat)
case "$input" in
  *"replicas: many"*)
    printf '%s\n' '{"resources":[{"filename":"stdin","kind":"Deployment","name":"app-a","version":"apps/v1","status":"statusInvalid","msg":"spec.replicas: Invalid type. Expected: integer, given: string"}],"summary":{"valid":0,"invalid":1,"errors":0,"skipped":0}}'
    exit 1 ;;
esac
printf '%s\n' '{"resources":[],"summary":{"valid":1,"invalid":0,"errors":0,"skipped":0}}'
"#;

pub const VALID_DEPLOYMENT: &str = "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: app-a\nspec:\n  replicas: 1\n";
pub const INVALID_DEPLOYMENT: &str = "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: app-a\nspec:\n  replicas: many\n";

/// A scratch repository with a charts root and a bin dir for fake tools.
pub struct ChartRepo {
    pub dir: TempDir,
    pub charts: PathBuf,
    pub bin: PathBuf,
}

impl ChartRepo {
    pub fn new() -> Self {
        crate::test_log!("FIXTURE: Creating chart repository");

        let dir = TempDir::new().expect("Failed to create temp dir");
        let charts = dir.path().join("charts");
        let bin = dir.path().join("bin");
        fs::create_dir_all(&charts).expect("Failed to create charts dir");
        fs::create_dir_all(&bin).expect("Failed to create bin dir");
        let repo = Self { dir, charts, bin };
        #[cfg(unix)]
        repo.install_fake_tools();
        repo
    }

    /// Add a chart at `rel` (relative to the charts root) with fixtures.
    pub fn add_chart(&self, rel: &str, values: &[(&str, &str)]) -> &Self {
        let chart_dir = self.charts.join(rel);
        let name = chart_dir
            .file_name()
            .expect("chart path has a name")
            .to_string_lossy()
            .into_owned();
        fs::create_dir_all(chart_dir.join("tests")).expect("Failed to create tests dir");
        fs::write(
            chart_dir.join("Chart.yaml"),
            format!("apiVersion: v2\nname: {name}\nversion: 0.1.0\n"),
        )
        .expect("Failed to write Chart.yaml");
        for (file, content) in values {
            fs::write(chart_dir.join("tests").join(file), content)
                .expect("Failed to write values file");
        }
        self
    }

    /// Write a `.env` file at the repository root.
    pub fn write_dotenv(&self, content: &str) -> PathBuf {
        let path = self.dir.path().join(".env");
        fs::write(&path, content).expect("Failed to write .env");
        path
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Lines recorded by the fake tool `name`, empty if it never ran.
    pub fn calls(&self, name: &str) -> Vec<String> {
        fs::read_to_string(self.bin.join(format!("{name}.calls")))
            .map(|content| content.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// `chartgate` with a clean environment pointing at this repository.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_chartgate"));
        cmd.env_clear()
            .current_dir(self.root())
            .env("PATH", std::env::var_os("PATH").unwrap_or_default())
            .env("CHARTS_DIRECTORY", &self.charts)
            .env("HELM", self.bin.join("helm"))
            .env("KUBECONFORM", self.bin.join("kubeconform"))
            .env("LOG_JSON", "false")
            .env("LOG_LEVEL", "info");
        cmd
    }

    #[cfg(unix)]
    fn install_fake_tools(&self) {
        use std::os::unix::fs::PermissionsExt;

        for (name, body) in [("helm", FAKE_HELM), ("kubeconform", FAKE_KUBECONFORM)] {
            let path = self.bin.join(name);
            fs::write(&path, body).expect("Failed to write fake tool");
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
                .expect("Failed to mark fake tool executable");
        }
    }
}
