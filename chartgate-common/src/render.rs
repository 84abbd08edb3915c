//! Renderer adapter: turns a chart plus one values file into manifests by
//! shelling out to `helm`.

use crate::errors::{ExitDisplay, RenderError};
use crate::process::{CommandRunner, Invocation};
use crate::types::{RenderedManifest, TestCase};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Release name passed to `helm template`.
pub const RELEASE_NAME: &str = "release";

/// Renders one test case into manifest bytes.
pub trait ManifestRenderer: Send + Sync {
    fn render(
        &self,
        case: &TestCase,
        refresh_dependencies: bool,
    ) -> impl Future<Output = Result<RenderedManifest, RenderError>> + Send;
}

/// Settings for [`HelmRenderer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub helm: PathBuf,
    pub timeout: Option<Duration>,
}

/// `helm dependency build`, run inside the chart directory.
pub fn build_dependency_invocation(options: &RenderOptions, case: &TestCase) -> Invocation {
    Invocation::new(&options.helm)
        .args(["dependency", "build"])
        .current_dir(case.chart_dir())
        .timeout(options.timeout)
}

/// `helm template release <chartDir> -f <valuesPath>`.
pub fn build_template_invocation(options: &RenderOptions, case: &TestCase) -> Invocation {
    Invocation::new(&options.helm)
        .args([
            "template".to_string(),
            RELEASE_NAME.to_string(),
            case.chart_dir().display().to_string(),
            "-f".to_string(),
            case.values_path.display().to_string(),
        ])
        .timeout(options.timeout)
}

/// [`ManifestRenderer`] that runs `helm` through a [`CommandRunner`].
#[derive(Debug, Clone)]
pub struct HelmRenderer<R> {
    runner: R,
    options: RenderOptions,
}

impl<R: CommandRunner> HelmRenderer<R> {
    pub fn new(runner: R, options: RenderOptions) -> Self {
        Self { runner, options }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }
}

impl<R: CommandRunner> ManifestRenderer for HelmRenderer<R> {
    async fn render(
        &self,
        case: &TestCase,
        refresh_dependencies: bool,
    ) -> Result<RenderedManifest, RenderError> {
        if refresh_dependencies {
            info!(chart = %case.chart.name, "updating chart dependencies");
            let output = self
                .runner
                .run(build_dependency_invocation(&self.options, case))
                .await?;
            if !output.success() {
                return Err(RenderError::DependencyBuild {
                    exit: ExitDisplay(output.exit_code),
                    stderr: output.combined().trim().to_string(),
                });
            }
        }

        let output = self
            .runner
            .run(build_template_invocation(&self.options, case))
            .await?;
        if !output.success() {
            return Err(RenderError::Template {
                exit: ExitDisplay(output.exit_code),
                stderr: output.stderr_lossy().trim().to_string(),
            });
        }

        debug!(
            chart = %case.chart.name,
            values = %case.values_file,
            bytes = output.stdout.len(),
            "chart rendered"
        );
        Ok(RenderedManifest::new(output.stdout))
    }
}
