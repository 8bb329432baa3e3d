//! CLI Integration Tests
//!
//! Tests the command-line interface end-to-end.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

const CONFIG: &str = r#"
[general]
settings_file = "settings.json"
controllers_dir = "units"

[credentials]
backend = "env-file"
env_file = ".env"
env_key = "DISCORD_TOKEN"
"#;

/// Fresh working directory with a local config file.
fn workspace() -> TempDir {
    let temp = TempDir::new().unwrap();
    temp.child("ctrlbot.toml").write_str(CONFIG).unwrap();
    temp
}

/// Get the binary to test, running inside `temp`.
fn ctrlbot(temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ctrlbot").unwrap();
    cmd.current_dir(temp.path())
        .env("CTRLBOT_CONFIG", temp.child("ctrlbot.toml").path())
        .env_remove("DISCORD_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

/// Workspace that already ran `ctrlbot init`.
fn initialized() -> TempDir {
    let temp = workspace();
    ctrlbot(&temp).arg("init").assert().success();
    temp
}

// ============================================================================
// Help & Version Tests
// ============================================================================

#[test]
fn test_help_flag() {
    let temp = workspace();
    ctrlbot(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Controller plugin runtime"));
}

#[test]
fn test_version_flag() {
    let temp = workspace();
    ctrlbot(&temp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

// ============================================================================
// Init Tests
// ============================================================================

#[test]
fn test_init_writes_units_and_settings() {
    let temp = workspace();

    ctrlbot(&temp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("controller_ping.toml"))
        .stdout(predicate::str::contains("2 controller(s) ready"));

    temp.child("units/controller_admin.toml").assert(predicate::path::exists());
    temp.child("units/controller_ping.toml").assert(predicate::path::exists());
    temp.child("settings.json").assert(predicate::str::contains("ControllerBot"));
}

#[test]
fn test_init_keeps_existing_units() {
    let temp = initialized();

    ctrlbot(&temp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already present"));
}

// ============================================================================
// Plugins Tests
// ============================================================================

#[test]
fn test_plugins_json_in_discovery_order() {
    let temp = initialized();

    let output = ctrlbot(&temp).args(["plugins", "--format", "json"]).output().unwrap();
    assert!(output.status.success());

    let plugins: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> =
        plugins.as_array().unwrap().iter().map(|p| p["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["ControllerAdmin", "ControllerPing"]);
    assert_eq!(plugins[1]["defaults"]["response"], "Pong!");
}

#[test]
fn test_plugins_skips_broken_unit() {
    let temp = initialized();
    temp.child("units/controller_broken.toml").write_str("[unit\ncontrollers = ").unwrap();

    ctrlbot(&temp)
        .arg("plugins")
        .assert()
        .success()
        .stdout(predicate::str::contains("ControllerPing"))
        .stdout(predicate::str::contains("Total: 2 controllers"))
        .stderr(predicate::str::contains("Skipping controller unit"));
}

#[test]
fn test_plugins_without_units() {
    let temp = workspace();

    ctrlbot(&temp)
        .arg("plugins")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total: 0 controllers"));
}

// ============================================================================
// Settings Tests
// ============================================================================

#[test]
fn test_settings_set_and_show() {
    let temp = initialized();

    ctrlbot(&temp)
        .args(["settings", "set", "ControllerPing", "enabled", "false"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ControllerPing.enabled = false"));

    let output = ctrlbot(&temp).args(["settings", "show", "ControllerPing"]).output().unwrap();
    let settings: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(settings["enabled"], false);
    assert_eq!(settings["response"], "Pong!");
}

#[test]
fn test_settings_rejects_non_integer() {
    let temp = initialized();

    ctrlbot(&temp)
        .args(["settings", "set", "ControllerAdmin", "default_mute_duration", "ten"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("whole numbers"));

    temp.child("settings.json").assert(predicate::str::contains("\"default_mute_duration\": 60"));
}

#[test]
fn test_settings_reset() {
    let temp = initialized();
    ctrlbot(&temp)
        .args(["settings", "set", "ControllerPing", "response", "Pang!"])
        .assert()
        .success();

    ctrlbot(&temp)
        .args(["settings", "reset", "ControllerPing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("reset to defaults"));

    temp.child("settings.json").assert(predicate::str::contains("\"Pong!\""));
}

#[test]
fn test_settings_set_reports_unsaved_change() {
    let temp = initialized();
    std::fs::remove_file(temp.child("settings.json").path()).unwrap();
    temp.child("settings.json").create_dir_all().unwrap();

    ctrlbot(&temp)
        .args(["settings", "set", "ControllerPing", "enabled", "false"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Change not saved"));
}

#[test]
fn test_settings_unknown_plugin() {
    let temp = initialized();

    ctrlbot(&temp)
        .args(["settings", "show", "ControllerMusic"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown plugin"));
}

// ============================================================================
// Token Tests
// ============================================================================

#[test]
fn test_token_set_status_clear() {
    let temp = workspace();

    ctrlbot(&temp).args(["token", "set", "abc.def.ghi"]).assert().success();
    temp.child(".env").assert(predicate::str::contains("DISCORD_TOKEN=abc.def.ghi"));

    ctrlbot(&temp)
        .args(["token", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("***********"))
        .stdout(predicate::str::contains("abc.def.ghi").not());

    ctrlbot(&temp).args(["token", "clear"]).assert().success();
    ctrlbot(&temp)
        .args(["token", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No token configured"));
}

// ============================================================================
// Serve Tests
// ============================================================================

#[test]
fn test_serve_requires_token() {
    let temp = initialized();

    ctrlbot(&temp).arg("serve").assert().failure().stderr(predicate::str::contains("No token"));
}

#[test]
fn test_serve_answers_ping() {
    let temp = initialized();
    temp.child(".env").write_str("DISCORD_TOKEN=abc.def.ghi\n").unwrap();

    ctrlbot(&temp)
        .arg("serve")
        .write_stdin("hello\n!ping\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pong!"))
        .stdout(predicate::str::contains("Ping successful!"));
}

#[test]
fn test_serve_disabled_ping_is_silent() {
    let temp = initialized();
    temp.child(".env").write_str("DISCORD_TOKEN=abc.def.ghi\n").unwrap();
    ctrlbot(&temp)
        .args(["settings", "set", "ControllerPing", "enabled", "false"])
        .assert()
        .success();

    ctrlbot(&temp)
        .arg("serve")
        .write_stdin("!ping\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pong!").not());
}

#[test]
fn test_serve_admin_ban() {
    let temp = initialized();
    temp.child(".env").write_str("DISCORD_TOKEN=abc.def.ghi\n").unwrap();

    ctrlbot(&temp)
        .args(["serve", "--admin"])
        .write_stdin("!ban bob spamming\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("@bob has been banned. Reason: spamming"))
        .stdout(predicate::str::contains("-> ban"));
}

// ============================================================================
// Config & Completions Tests
// ============================================================================

#[test]
fn test_config_path() {
    let temp = workspace();

    ctrlbot(&temp)
        .args(["config", "--path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ctrlbot.toml"));
}

#[test]
fn test_config_show() {
    let temp = workspace();

    ctrlbot(&temp)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("controllers_dir = \"units\""));
}

#[test]
fn test_completions_bash() {
    let temp = workspace();

    ctrlbot(&temp)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ctrlbot"));
}
