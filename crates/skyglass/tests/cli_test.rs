//! Integration tests for the `skyglass` CLI binary.
//!
//! Local commands run as-is; backend-bound commands run against a wiremock
//! server passed via `--origin`.
#![allow(clippy::unwrap_used)]

use std::process::Output;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `skyglass` binary with env isolation.
///
/// Clears all `SKYGLASS_*` env vars and points the config file at a
/// nonexistent path so tests never touch the user's real configuration.
fn skyglass_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("skyglass");
    cmd.env("SKYGLASS_CONFIG", "/tmp/skyglass-cli-test-nonexistent/config.toml")
        .env_remove("SKYGLASS_PROFILE")
        .env_remove("SKYGLASS_ORIGIN")
        .env_remove("SKYGLASS_DEV")
        .env_remove("SKYGLASS_OUTPUT")
        .env_remove("SKYGLASS_COLOR")
        .env_remove("SKYGLASS_INSECURE")
        .env_remove("SKYGLASS_TIMEOUT")
        .env_remove("SKYGLASS_POLL_INTERVAL")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run the binary against `server` without blocking the mock's runtime.
async fn run_against(server: &MockServer, args: &[&str]) -> Output {
    let mut argv = vec!["--origin".to_owned(), server.uri()];
    argv.extend(args.iter().map(|a| (*a).to_owned()));
    tokio::task::spawn_blocking(move || skyglass_cmd().args(argv).output().unwrap())
        .await
        .unwrap()
}

async fn backend(servers: &[&str]) -> MockServer {
    let server = MockServer::start().await;
    let list: Vec<Value> = servers.iter().map(|n| json!({ "name": n })).collect();
    Mock::given(method("GET"))
        .and(path("/api/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list))
        .mount(&server)
        .await;
    server
}

async fn mount_reference(server: &MockServer, name: &str, lat: f64, lng: f64) {
    Mock::given(method("GET"))
        .and(path(format!("/api/servers/{name}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entities": {
                "0": { "id": 0, "properties": { "ReferenceLatitude": lat, "ReferenceLongitude": lng } }
            }
        })))
        .mount(server)
        .await;
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = skyglass_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    skyglass_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("servers")
            .and(predicate::str::contains("connect"))
            .and(predicate::str::contains("maps")),
    );
}

#[test]
fn test_version_flag() {
    skyglass_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("skyglass"));
}

#[test]
fn test_completions_bash() {
    skyglass_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_build_generates_manpages_and_completions() {
    let out = std::path::Path::new(env!("OUT_DIR"));
    for page in ["skyglass.1", "skyglass-connect.1", "skyglass-maps-resolve.1"] {
        assert!(out.join("man").join(page).is_file(), "missing man page {page}");
    }
    assert!(!out.join("man").join("skyglass-completions.1").exists());
    for script in ["skyglass.bash", "_skyglass", "skyglass.fish"] {
        assert!(out.join("completions").join(script).is_file(), "missing {script}");
    }
}

#[test]
fn test_origin_conflicts_with_dev() {
    let output = skyglass_cmd()
        .args(["--dev", "--origin", "http://x", "servers", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Maps (local) ────────────────────────────────────────────────────

#[test]
fn test_maps_list() {
    skyglass_cmd()
        .args(["maps", "list", "-o", "plain"])
        .assert()
        .success()
        .stdout("Syria\nCaucasus\n");
}

#[test]
fn test_maps_resolve() {
    skyglass_cmd()
        .args(["maps", "resolve", "30", "31", "-o", "plain"])
        .assert()
        .success()
        .stdout("Syria\n");

    skyglass_cmd()
        .args(["maps", "resolve", "39", "36", "-o", "plain"])
        .assert()
        .success()
        .stdout("Caucasus\n");
}

#[test]
fn test_maps_resolve_outside_every_map() {
    skyglass_cmd()
        .args(["maps", "resolve", "0", "0"])
        .assert()
        .code(9)
        .stderr(predicate::str::contains("Failed to detect map."));
}

#[test]
fn test_maps_resolve_negative_coordinates() {
    skyglass_cmd()
        .args(["maps", "resolve", "-33.9", "151.2"])
        .assert()
        .code(9);
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honours_env() {
    skyglass_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("skyglass-cli-test-nonexistent"));
}

#[test]
fn test_config_show_no_config() {
    skyglass_cmd().args(["config", "show"]).assert().success();
}

#[test]
fn test_unknown_profile() {
    skyglass_cmd()
        .args(["-p", "nope", "servers", "list"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("nope"));
}

#[test]
fn test_config_profile_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("config.toml");
    std::fs::write(
        &file,
        "[profiles.ops]\nmode = \"co-located\"\norigin = \"https://ops.example.org\"\n\n\
         [profiles.lab]\n",
    )
    .unwrap();

    skyglass_cmd()
        .env("SKYGLASS_CONFIG", &file)
        .args(["config", "use", "ops"])
        .assert()
        .success();

    skyglass_cmd()
        .env("SKYGLASS_CONFIG", &file)
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout("lab\nops *\n");
}

// ── Backend-bound ───────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_servers_list_plain() {
    let server = backend(&["Alpha", "Bravo Two"]).await;

    let output = run_against(&server, &["servers", "list", "-o", "plain"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "Alpha\nBravo Two\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_servers_list_backend_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/servers"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let output = run_against(&server, &["servers", "list"]).await;
    assert_eq!(output.status.code(), Some(7));
    assert!(combined_output(&output).contains("backend server"));
}

#[test]
fn test_unreachable_backend() {
    let output = skyglass_cmd()
        .args(["--origin", "http://127.0.0.1:1", "--timeout", "2", "servers", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(7), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_state_json() {
    let server = backend(&["Alpha"]).await;
    mount_reference(&server, "Alpha", 35.0, 36.0).await;

    let output = run_against(&server, &["state", "Alpha", "-o", "json"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    let body: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["entities"]["0"]["properties"]["ReferenceLatitude"], 35.0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_state_missing_server() {
    let server = backend(&[]).await;
    Mock::given(method("GET"))
        .and(path("/api/servers/Ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let output = run_against(&server, &["state", "Ghost"]).await;
    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connect_once_reports_map() {
    let server = backend(&["Alpha"]).await;
    mount_reference(&server, "Alpha", 38.5, 35.0).await;

    let output = run_against(&server, &["connect", "Alpha", "--once", "-o", "json"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let line: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(line["server"], "Alpha");
    assert_eq!(line["map"], "Caucasus");
    assert_eq!(line["reference"]["latitude"], 38.5);
    assert!(line["updated_at"].is_string());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connect_detection_failure() {
    let server = backend(&["Alpha"]).await;
    mount_reference(&server, "Alpha", 0.0, 0.0).await;

    let output = run_against(&server, &["connect", "Alpha", "--once"]).await;
    assert_eq!(output.status.code(), Some(9));
    assert!(combined_output(&output).contains("Failed to detect map."));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connect_vanished_server_non_interactive() {
    let server = backend(&[]).await;
    Mock::given(method("GET"))
        .and(path("/api/servers/Ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let output = run_against(&server, &["connect", "Ghost", "--once"]).await;
    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
}

#[test]
fn test_connect_without_server_needs_terminal() {
    skyglass_cmd()
        .args(["--origin", "http://127.0.0.1:1", "connect"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("interactive terminal"));
}
