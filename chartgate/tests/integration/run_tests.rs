use crate::common::fixtures::{INVALID_DEPLOYMENT, VALID_DEPLOYMENT};
use crate::common::{ChartRepo, assert_contains, assert_exit_code, init_test_logging};

#[test]
fn test_bad_fixture_fails_the_run_with_diagnostics() {
    init_test_logging();
    crate::test_log!("TEST START: test_bad_fixture_fails_the_run_with_diagnostics");

    let repo = ChartRepo::new();
    repo.add_chart(
        "app-a",
        &[("ok.yaml", VALID_DEPLOYMENT), ("bad.yaml", INVALID_DEPLOYMENT)],
    );

    let output = repo.command().output().expect("Failed to run chartgate");

    assert_exit_code(&output, 1);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_contains(&stdout, "PASS  app-a/ok.yaml");
    assert_contains(&stdout, "FAIL  app-a/bad.yaml (invalid, exit 1)");
    assert_contains(
        &stdout,
        "Deployment app-a: spec.replicas: Invalid type. Expected: integer, given: string",
    );
    assert_contains(&stdout, "2 test case(s): 1 passed, 1 failed");

    crate::test_log!("TEST PASS: test_bad_fixture_fails_the_run_with_diagnostics");
}

#[test]
fn test_all_valid_fixtures_pass() {
    init_test_logging();
    let repo = ChartRepo::new();
    repo.add_chart("app-a", &[("ok.yaml", VALID_DEPLOYMENT)])
        .add_chart("nested/app-b", &[("one.yaml", VALID_DEPLOYMENT), ("two.yaml", VALID_DEPLOYMENT)]);

    let output = repo.command().arg("run").output().expect("Failed to run chartgate");

    assert_exit_code(&output, 0);
    assert_contains(
        &String::from_utf8_lossy(&output.stdout),
        "3 test case(s): 3 passed, 0 failed",
    );
    assert_eq!(repo.calls("helm").len(), 3);
    assert_eq!(repo.calls("kubeconform").len(), 3);
}

#[test]
fn test_render_failure_is_reported_and_run_continues() {
    init_test_logging();
    let repo = ChartRepo::new();
    repo.add_chart(
        "app-a",
        &[("a-broken.yaml", "render: broken\n"), ("b-ok.yaml", VALID_DEPLOYMENT)],
    );

    let output = repo.command().output().expect("Failed to run chartgate");

    assert_exit_code(&output, 1);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_contains(&stdout, "FAIL  app-a/a-broken.yaml (render failed)");
    assert_contains(&stdout, "function \"nope\" not defined");
    assert_contains(&stdout, "PASS  app-a/b-ok.yaml");
    // Only the case that rendered reached the validator.
    assert_eq!(repo.calls("kubeconform").len(), 1);
}

#[test]
fn test_validator_receives_configured_arguments() {
    init_test_logging();
    let repo = ChartRepo::new();
    repo.add_chart("app-a", &[("ok.yaml", VALID_DEPLOYMENT)]);

    let output = repo
        .command()
        .env("KUBERNETES_VERSION", "1.30.0")
        .env("ADDITIONAL_SCHEMA_PATHS", "/schemas/crds\n\n/schemas/extra")
        .output()
        .expect("Failed to run chartgate");

    assert_exit_code(&output, 0);
    let calls = repo.calls("kubeconform");
    assert_eq!(
        calls,
        vec![
            "-schema-location default -summary -strict -kubernetes-version 1.30.0 -output json \
             -schema-location /schemas/crds -schema-location /schemas/extra"
        ]
    );
}

#[test]
fn test_dependency_refresh_runs_before_each_template() {
    init_test_logging();
    let repo = ChartRepo::new();
    repo.add_chart("app-a", &[("one.yaml", VALID_DEPLOYMENT), ("two.yaml", VALID_DEPLOYMENT)]);

    let output = repo
        .command()
        .env("HELM_UPDATE_DEPENDENCIES", "true")
        .output()
        .expect("Failed to run chartgate");

    assert_exit_code(&output, 0);
    let calls = repo.calls("helm");
    assert_eq!(calls.len(), 4);
    assert_eq!(calls[0], "dependency build");
    assert!(calls[1].starts_with("template release "));
    assert_eq!(calls[2], "dependency build");
}

#[test]
fn test_json_report_is_machine_readable() {
    init_test_logging();
    let repo = ChartRepo::new();
    repo.add_chart(
        "app-a",
        &[("ok.yaml", VALID_DEPLOYMENT), ("bad.yaml", INVALID_DEPLOYMENT)],
    );

    let output = repo
        .command()
        .args(["run", "--report", "json"])
        .output()
        .expect("Failed to run chartgate");

    assert_exit_code(&output, 1);
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("report is JSON");
    let outcomes = report["outcomes"].as_array().expect("outcomes array");
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0]["values_file"], "bad.yaml");
    assert_eq!(outcomes[0]["status"], "invalid");
    assert_eq!(
        outcomes[0]["diagnostics"]["structured"]["resources"][0]["status"],
        "statusInvalid"
    );
    assert_eq!(outcomes[1]["status"], "passed");
}

#[test]
fn test_empty_charts_root_succeeds() {
    init_test_logging();
    let repo = ChartRepo::new();

    let output = repo.command().output().expect("Failed to run chartgate");

    assert_exit_code(&output, 0);
    assert_contains(&String::from_utf8_lossy(&output.stdout), "no test cases were found");
}
