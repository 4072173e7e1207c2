//! End-to-end CLI tests for the teams-inventory binary.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a command isolated from the caller's environment: no token, no
/// user config, no `.env` from the working tree.
fn isolated_cmd(work_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("teams-inventory").unwrap();
    cmd.current_dir(work_dir)
        .env("XDG_CONFIG_HOME", work_dir.join("config"))
        .env_remove("ACCESS_TOKEN")
        .env_remove("MS_ACCESS_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

async fn mount_json(server: &MockServer, route: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    let mut cmd = Command::cargo_bin("teams-inventory").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Export Teams metadata"))
        .stdout(predicate::str::contains("notebooks"))
        .stdout(predicate::str::contains("planner"))
        .stdout(predicate::str::contains("tasks"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    let mut cmd = Command::cargo_bin("teams-inventory").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("teams-inventory"));
}

/// Test that a subcommand is required.
#[test]
fn test_binary_without_subcommand_fails() {
    let mut cmd = Command::cargo_bin("teams-inventory").unwrap();
    cmd.assert().failure().stderr(predicate::str::contains("Usage"));
}

/// Test that a missing token stops the run before any output is written.
#[test]
fn test_binary_missing_token_fails_without_output() {
    let work = TempDir::new().unwrap();
    isolated_cmd(work.path())
        .args(["planner", "--base-url", "http://127.0.0.1:9/v1.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ACCESS_TOKEN"));

    assert!(!work.path().join("teams_planner_tabs.json").exists());
}

/// Test that an invalid config file is reported.
#[test]
fn test_binary_invalid_config_file_fails() {
    let work = TempDir::new().unwrap();
    let config_dir = work.path().join("config").join("teams-inventory");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "team_delay_ms = 99999\n").unwrap();

    isolated_cmd(work.path())
        .env("ACCESS_TOKEN", "test-token")
        .arg("planner")
        .assert()
        .failure()
        .stderr(predicate::str::contains("team_delay_ms"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_binary_planner_run_writes_default_output() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/v1.0/me/joinedTeams",
        json!({"value": [{"id": "t1", "displayName": "Ops"}]}),
    )
    .await;
    mount_json(
        &server,
        "/v1.0/teams/t1/channels",
        json!({"value": [{"id": "c1", "displayName": "General"}]}),
    )
    .await;
    mount_json(
        &server,
        "/v1.0/teams/t1/channels/c1/tabs",
        json!({"value": [{
            "id": "tab1",
            "displayName": "Tasks",
            "configuration": {"entityId": "tt.c_777", "contentUrl": null}
        }]}),
    )
    .await;

    let work = TempDir::new().unwrap();
    let work_path = work.path().to_path_buf();
    let base_url = format!("{}/v1.0", server.uri());

    tokio::task::spawn_blocking(move || {
        isolated_cmd(&work_path)
            .env("ACCESS_TOKEN", "test-token")
            .args(["planner", "--base-url", &base_url, "-l", "0", "-q"])
            .assert()
            .success();
    })
    .await
    .unwrap();

    let output = work.path().join("teams_planner_tabs.json");
    let document: Value = serde_json::from_slice(&std::fs::read(&output).unwrap()).unwrap();
    let rows = document.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["kind"], "planner");
    assert_eq!(rows[0]["planner_tabs"][0]["plan_id"], "tt.c_777");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_binary_rejected_token_exit_code_depends_on_flag() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1.0/me/joinedTeams"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let work = TempDir::new().unwrap();
    let work_path = work.path().to_path_buf();
    let base_url = format!("{}/v1.0", server.uri());

    tokio::task::spawn_blocking(move || {
        isolated_cmd(&work_path)
            .env("ACCESS_TOKEN", "expired")
            .args(["notebooks", "--base-url", &base_url, "-o", "strict.json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("credential rejected"));
        assert!(!work_path.join("strict.json").exists());

        isolated_cmd(&work_path)
            .env("ACCESS_TOKEN", "expired")
            .args([
                "notebooks",
                "--base-url",
                &base_url,
                "-o",
                "lenient.json",
                "--continue-on-auth-error",
            ])
            .assert()
            .success();
    })
    .await
    .unwrap();

    let text = std::fs::read_to_string(work.path().join("lenient.json")).unwrap();
    assert_eq!(text.trim(), "[]");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_binary_teams_file_and_config_output() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/v1.0/teams/t9/channels",
        json!({"value": [{"id": "c1", "displayName": "General"}]}),
    )
    .await;
    mount_json(
        &server,
        "/v1.0/teams/t9/channels/c1/tabs",
        json!({"value": [{"id": "tab1", "displayName": "Team Planner"}]}),
    )
    .await;

    let work = TempDir::new().unwrap();
    let config_dir = work.path().join("config").join("teams-inventory");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        format!(
            "base_url = \"{}/v1.0\"\nplanner_output = \"reports/planner.json\"\nteam_delay_ms = 0\n",
            server.uri()
        ),
    )
    .unwrap();
    std::fs::write(
        work.path().join("teams.json"),
        r#"{"value": [{"id": "t9", "displayName": "Preloaded"}]}"#,
    )
    .unwrap();

    let work_path = work.path().to_path_buf();
    tokio::task::spawn_blocking(move || {
        isolated_cmd(&work_path)
            .env("ACCESS_TOKEN", "test-token")
            .args(["planner", "--teams-file", "teams.json"])
            .assert()
            .success();
    })
    .await
    .unwrap();

    let output = work.path().join("reports").join("planner.json");
    let document: Value = serde_json::from_slice(&std::fs::read(&output).unwrap()).unwrap();
    assert_eq!(document[0]["team_name"], "Preloaded");
    assert!(document[0]["planner_tabs"][0]["plan_id"].is_null());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_binary_tasks_run_writes_plan_rows() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/v1.0/planner/plans/plan1/buckets",
        json!({"value": [{"id": "b1", "name": "Backlog"}]}),
    )
    .await;
    mount_json(
        &server,
        "/v1.0/planner/plans/plan1/tasks",
        json!({"value": [{"id": "k1", "title": "Book venue", "bucketId": "b1"}]}),
    )
    .await;
    mount_json(&server, "/v1.0/planner/tasks/k1/details", json!({"checklist": {}})).await;

    let work = TempDir::new().unwrap();
    let work_path = work.path().to_path_buf();
    let base_url = format!("{}/v1.0", server.uri());

    tokio::task::spawn_blocking(move || {
        isolated_cmd(&work_path)
            .env("ACCESS_TOKEN", "test-token")
            .args(["tasks", "--plan", "plan1", "--base-url", &base_url, "-q"])
            .assert()
            .success();
    })
    .await
    .unwrap();

    let output = work.path().join("planner_tasks.json");
    let document: Value = serde_json::from_slice(&std::fs::read(&output).unwrap()).unwrap();
    let rows = document.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["kind"], "plan_task");
    assert_eq!(rows[0]["bucket_name"], "Backlog");
    assert_eq!(rows[0]["checklist_item"], "(no checklist)");
}
