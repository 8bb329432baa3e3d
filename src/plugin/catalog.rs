//! Compiled-in controller types.
//!
//! Source units can only export types listed here. The catalog also knows
//! which unit file ships each type by default, for `ctrlbot init`.

use std::path::{Path, PathBuf};

use tracing::info;

use super::{ControllerFactory, ControllerUnit, PluginResult};
use crate::controllers::{AdminController, PingController};

/// One controller type the binary can instantiate.
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    /// Exported type name, e.g. `ControllerPing`.
    pub type_name: &'static str,
    /// Unit file that ships this type by default.
    pub unit_file: &'static str,
    pub description: &'static str,
    pub factory: ControllerFactory,
}

/// Every known controller type.
pub const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        type_name: AdminController::TYPE_NAME,
        unit_file: "controller_admin.toml",
        description: "Moderation commands: ban, kick, mute",
        factory: AdminController::create,
    },
    CatalogEntry {
        type_name: PingController::TYPE_NAME,
        unit_file: "controller_ping.toml",
        description: "Ping health check",
        factory: PingController::create,
    },
];

/// Find a catalog entry by exported type name.
pub fn lookup(type_name: &str) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|entry| entry.type_name == type_name)
}

/// Default unit files, one per catalog entry.
pub fn default_units() -> Vec<(&'static str, ControllerUnit)> {
    CATALOG
        .iter()
        .map(|entry| (entry.unit_file, ControllerUnit::new(entry.description, &[entry.type_name])))
        .collect()
}

/// Write the default unit files into `dir`.
///
/// Existing files are left alone unless `force` is set. Returns the paths
/// written.
pub fn write_default_units(dir: &Path, force: bool) -> PluginResult<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let mut written = Vec::new();
    for (file, unit) in default_units() {
        let path = dir.join(file);
        if path.exists() && !force {
            continue;
        }
        std::fs::write(&path, unit.to_toml()?)?;
        info!(unit = file, "Wrote controller unit");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lookup() {
        assert!(lookup("ControllerPing").is_some());
        assert!(lookup("ControllerAdmin").is_some());
        assert!(lookup("ControllerMusic").is_none());
    }

    #[test]
    fn test_write_default_units() {
        let dir = TempDir::new().unwrap();
        let units = dir.path().join("controller/modals");

        let written = write_default_units(&units, false).unwrap();
        assert_eq!(written.len(), CATALOG.len());
        assert!(units.join("controller_ping.toml").exists());

        // Second run keeps existing files.
        assert!(write_default_units(&units, false).unwrap().is_empty());
        assert_eq!(write_default_units(&units, true).unwrap().len(), CATALOG.len());
    }
}
