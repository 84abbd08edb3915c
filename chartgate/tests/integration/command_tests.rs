use std::process::Command;

use crate::common::{ChartRepo, assert_contains, assert_exit_code, init_test_logging};

#[test]
fn test_help_includes_description() {
    init_test_logging();
    crate::test_log!("TEST START: test_help_includes_description");

    let output = Command::new(env!("CARGO_BIN_EXE_chartgate"))
        .arg("--help")
        .output()
        .expect("Failed to run chartgate --help");

    assert!(output.status.success(), "chartgate --help failed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_contains(&stdout, "kubeconform");
    for subcommand in ["run", "list", "config"] {
        assert_contains(&stdout, subcommand);
    }
    crate::test_log!("TEST PASS: test_help_includes_description");
}

#[test]
fn test_list_prints_matrix_without_running_tools() {
    init_test_logging();
    crate::test_log!("TEST START: test_list_prints_matrix_without_running_tools");

    let repo = ChartRepo::new();
    repo.add_chart("app-a", &[("ok.yaml", "{}\n"), ("bad.yaml", "{}\n")])
        .add_chart("platform/app-b", &[("default.yaml", "{}\n")])
        .add_chart(".git/ignored", &[("x.yaml", "{}\n")]);

    let output = repo
        .command()
        .arg("list")
        .output()
        .expect("Failed to run chartgate list");

    assert_exit_code(&output, 0);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_contains(&stdout, "app-a/bad.yaml");
    assert_contains(&stdout, "app-a/ok.yaml");
    assert_contains(&stdout, "app-b/default.yaml");
    assert_contains(&stdout, "3 test case(s) in 2 chart(s)");
    assert!(!stdout.contains("ignored"), "skipped chart listed: {stdout}");
    assert!(repo.calls("helm").is_empty());
    assert!(repo.calls("kubeconform").is_empty());

    crate::test_log!("TEST PASS: test_list_prints_matrix_without_running_tools");
}

#[test]
fn test_list_json_reports_values_paths() {
    init_test_logging();
    let repo = ChartRepo::new();
    repo.add_chart("app-a", &[("ok.yaml", "{}\n")]);

    let output = repo
        .command()
        .args(["list", "--report", "json"])
        .output()
        .expect("Failed to run chartgate list");

    assert_exit_code(&output, 0);
    let listing: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("list output is JSON");
    let cases = listing["cases"].as_array().expect("cases array");
    assert_eq!(cases.len(), 1);
    assert_eq!(cases[0]["chart"], "app-a");
    assert!(
        cases[0]["values_path"]
            .as_str()
            .unwrap()
            .ends_with("app-a/tests/ok.yaml")
    );
}

#[test]
fn test_missing_charts_root_exits_with_setup_error() {
    init_test_logging();
    let repo = ChartRepo::new();

    let output = repo
        .command()
        .env("CHARTS_DIRECTORY", repo.root().join("does-not-exist"))
        .output()
        .expect("Failed to run chartgate");

    assert_exit_code(&output, 2);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_contains(&stderr, "[CG-E100]");
    assert_contains(&stderr, "does-not-exist");
}
