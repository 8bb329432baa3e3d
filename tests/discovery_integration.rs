//! Discovery Integration Tests
//!
//! Controller units on disk, resolved against the compiled-in catalog.

use assert_fs::prelude::*;
use assert_fs::TempDir;
use ctrlbot::plugin::{ControllerRegistry, ControllerUnit};
use ctrlbot::settings::{SettingsStore, HOST_SETTINGS_KEY};
use predicates::prelude::*;

fn store(temp: &TempDir) -> SettingsStore {
    SettingsStore::new(temp.child("settings.json").path())
}

fn names(registry: &ControllerRegistry) -> Vec<String> {
    registry.names()
}

// ============================================================================
// Failure Isolation
// ============================================================================

#[test]
fn test_broken_unit_is_skipped() {
    let temp = TempDir::new().unwrap();
    let units = temp.child("modals");
    units.child("controller_aaa.toml").write_str("[unit\ncontrollers = [").unwrap();
    units
        .child("controller_ping.toml")
        .write_str("[unit]\ncontrollers = [\"ControllerPing\"]\n")
        .unwrap();

    let registry = ControllerRegistry::discover(units.path(), &store(&temp));

    assert_eq!(names(&registry), vec!["ControllerPing"]);
}

#[test]
fn test_unit_with_unknown_type_is_skipped_whole() {
    let temp = TempDir::new().unwrap();
    let units = temp.child("modals");
    units
        .child("controller_mixed.toml")
        .write_str("[unit]\ncontrollers = [\"ControllerAdmin\", \"ControllerMusic\"]\n")
        .unwrap();
    units
        .child("controller_ping.toml")
        .write_str("[unit]\ncontrollers = [\"ControllerPing\"]\n")
        .unwrap();

    let registry = ControllerRegistry::discover(units.path(), &store(&temp));

    assert_eq!(names(&registry), vec!["ControllerPing"]);
}

#[test]
fn test_unprefixed_type_name_is_rejected() {
    let temp = TempDir::new().unwrap();
    let units = temp.child("modals");
    units.child("controller_bad.toml").write_str("[unit]\ncontrollers = [\"Ping\"]\n").unwrap();

    let registry = ControllerRegistry::discover(units.path(), &store(&temp));

    assert!(registry.is_empty());
}

#[test]
fn test_other_files_are_ignored() {
    let temp = TempDir::new().unwrap();
    let units = temp.child("modals");
    units.child("README.md").write_str("# controllers").unwrap();
    units.child("ping.toml").write_str("[unit]\ncontrollers = [\"ControllerPing\"]\n").unwrap();
    units.child("controller_ping.txt").write_str("not a unit").unwrap();

    let registry = ControllerRegistry::discover(units.path(), &store(&temp));

    assert!(registry.is_empty());
}

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn test_order_follows_unit_names_then_declaration() {
    let temp = TempDir::new().unwrap();
    let units = temp.child("modals");
    units
        .child("controller_b.toml")
        .write_str(&ControllerUnit::new("Moderation commands", &["ControllerAdmin"]).to_toml().unwrap())
        .unwrap();
    units
        .child("controller_a.toml")
        .write_str(&ControllerUnit::new("Ping health check", &["ControllerPing"]).to_toml().unwrap())
        .unwrap();

    let registry = ControllerRegistry::discover(units.path(), &store(&temp));
    assert_eq!(names(&registry), vec!["ControllerPing", "ControllerAdmin"]);

    let temp = TempDir::new().unwrap();
    let units = temp.child("modals");
    units
        .child("controller_all.toml")
        .write_str("[unit]\ncontrollers = [\"ControllerPing\", \"ControllerAdmin\"]\n")
        .unwrap();

    let registry = ControllerRegistry::discover(units.path(), &store(&temp));
    assert_eq!(names(&registry), vec!["ControllerPing", "ControllerAdmin"]);
}

#[test]
fn test_duplicate_type_keeps_first_unit() {
    let temp = TempDir::new().unwrap();
    let units = temp.child("modals");
    units
        .child("controller_a.toml")
        .write_str("[unit]\ncontrollers = [\"ControllerPing\"]\n")
        .unwrap();
    units
        .child("controller_b.toml")
        .write_str("[unit]\ncontrollers = [\"ControllerPing\", \"ControllerAdmin\"]\n")
        .unwrap();

    let registry = ControllerRegistry::discover(units.path(), &store(&temp));

    assert_eq!(names(&registry), vec!["ControllerPing", "ControllerAdmin"]);
    assert_eq!(registry.get("ControllerPing").unwrap().unit(), "controller_a.toml");
}

// ============================================================================
// Introspection
// ============================================================================

#[test]
fn test_introspection_reads_defaults_without_writing() {
    let temp = TempDir::new().unwrap();
    let units = temp.child("modals");
    units
        .child("controller_ping.toml")
        .write_str("[unit]\ncontrollers = [\"ControllerPing\"]\n")
        .unwrap();

    let registry = ControllerRegistry::discover(units.path(), &store(&temp));

    let defaults = registry.get("ControllerPing").unwrap().defaults();
    assert_eq!(defaults.bool("enabled"), Some(true));
    assert_eq!(defaults.str_or("response", ""), "Pong!");
    temp.child("settings.json").assert(predicate::path::missing());

    let document = registry.defaults_document();
    assert!(document.contains(HOST_SETTINGS_KEY));
    assert!(document.contains("ControllerPing"));
}

#[test]
fn test_missing_directory_is_created() {
    let temp = TempDir::new().unwrap();
    let units = temp.child("controller").child("modals");

    let registry = ControllerRegistry::discover(units.path(), &store(&temp));

    assert!(registry.is_empty());
    units.assert(predicate::path::is_dir());
}
