use crate::common::{ChartRepo, assert_contains, assert_exit_code, init_test_logging};

#[test]
fn test_missing_charts_directory_is_a_configuration_error() {
    init_test_logging();
    crate::test_log!("TEST START: test_missing_charts_directory_is_a_configuration_error");

    let repo = ChartRepo::new();
    let output = repo
        .command()
        .env_remove("CHARTS_DIRECTORY")
        .output()
        .expect("Failed to run chartgate");

    assert_exit_code(&output, 2);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_contains(&stderr, "[CG-E001]");
    assert_contains(&stderr, "CHARTS_DIRECTORY");

    crate::test_log!("TEST PASS: test_missing_charts_directory_is_a_configuration_error");
}

#[test]
fn test_invalid_values_are_reported_together() {
    init_test_logging();
    let repo = ChartRepo::new();
    let output = repo
        .command()
        .env("REGEX_SKIP_DIR", "(")
        .env("KUBECONFORM_STRICT", "sometimes")
        .arg("config")
        .output()
        .expect("Failed to run chartgate config");

    assert_exit_code(&output, 2);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_contains(&stderr, "REGEX_SKIP_DIR");
    assert_contains(&stderr, "KUBECONFORM_STRICT");
}

#[test]
fn test_config_shows_value_origins() {
    init_test_logging();
    let repo = ChartRepo::new();
    repo.write_dotenv("KUBERNETES_VERSION=1.30.0\n# comment\nHELM_UPDATE_DEPENDENCIES=true\n");

    let output = repo
        .command()
        .env("KUBECONFORM_STRICT", "false")
        .args(["config", "--charts-dir", "charts"])
        .output()
        .expect("Failed to run chartgate config");

    assert_exit_code(&output, 0);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_contains(&stdout, "command line (--charts-dir)");
    assert_contains(&stdout, ".env (KUBERNETES_VERSION)");
    assert_contains(&stdout, "1.30.0");
    assert_contains(&stdout, "environment (KUBECONFORM_STRICT)");
    assert_contains(&stdout, "default");
}

#[test]
fn test_environment_wins_over_dotenv() {
    init_test_logging();
    let repo = ChartRepo::new();
    repo.write_dotenv("KUBERNETES_VERSION=1.29.0\n");

    let output = repo
        .command()
        .env("KUBERNETES_VERSION", "1.31.2")
        .args(["config", "--report", "json"])
        .output()
        .expect("Failed to run chartgate config");

    assert_exit_code(&output, 0);
    let rows: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("config output is JSON");
    let version = rows
        .as_array()
        .unwrap()
        .iter()
        .find(|row| row["name"] == "KUBERNETES_VERSION")
        .expect("KUBERNETES_VERSION row");
    assert_eq!(version["value"], "1.31.2");
    assert_eq!(version["origin"], "environment (KUBERNETES_VERSION)");
}

#[test]
fn test_explicit_env_file_must_exist() {
    init_test_logging();
    let repo = ChartRepo::new();
    let output = repo
        .command()
        .args(["config", "--env-file", "missing.env"])
        .output()
        .expect("Failed to run chartgate config");

    assert_exit_code(&output, 2);
    assert_contains(&String::from_utf8_lossy(&output.stderr), "missing.env");
}
