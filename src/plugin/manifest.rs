//! Controller source units.
//!
//! A source unit is a TOML file in the controllers directory named
//! `controller_<something>.toml`. It lists, in order, the controller types
//! it exports:
//!
//! ```toml
//! [unit]
//! description = "Ping health check"
//! controllers = ["ControllerPing"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{PluginError, PluginResult};

/// File name prefix of a source unit.
pub const UNIT_PREFIX: &str = "controller_";

/// File extension of a source unit.
pub const UNIT_EXTENSION: &str = "toml";

/// Name prefix that marks an exported type as a controller.
pub const CONTROLLER_PREFIX: &str = "Controller";

/// Parsed source unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerUnit {
    /// Unit metadata.
    pub unit: UnitMetadata,
}

/// `[unit]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitMetadata {
    #[serde(default)]
    pub description: Option<String>,
    /// Exported controller types, in declaration order.
    #[serde(default)]
    pub controllers: Vec<String>,
}

impl ControllerUnit {
    /// Unit exporting the given controller types.
    pub fn new(description: &str, controllers: &[&str]) -> Self {
        Self {
            unit: UnitMetadata {
                description: Some(description.to_string()),
                controllers: controllers.iter().map(|c| (*c).to_string()).collect(),
            },
        }
    }

    /// Parse a unit from TOML. `id` names the unit in errors.
    pub fn from_toml(id: &str, content: &str) -> PluginResult<Self> {
        toml::from_str(content)
            .map_err(|e| PluginError::UnitLoad { unit: id.to_string(), reason: e.to_string() })
    }

    /// Parse and validate a unit file.
    pub fn from_file(path: &Path) -> PluginResult<Self> {
        let id = unit_id(path);
        let content = std::fs::read_to_string(path)
            .map_err(|e| PluginError::UnitLoad { unit: id.clone(), reason: e.to_string() })?;
        let unit = Self::from_toml(&id, &content)?;
        unit.validate(&id)?;
        Ok(unit)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> PluginResult<String> {
        toml::to_string_pretty(self).map_err(|e| PluginError::InvalidUnit {
            unit: self.unit.description.clone().unwrap_or_default(),
            reason: e.to_string(),
        })
    }

    /// Every exported name must carry the controller prefix.
    pub fn validate(&self, id: &str) -> PluginResult<()> {
        for name in &self.unit.controllers {
            let is_controller = name
                .strip_prefix(CONTROLLER_PREFIX)
                .is_some_and(|rest| !rest.is_empty() && rest.chars().all(char::is_alphanumeric));
            if !is_controller {
                return Err(PluginError::InvalidUnit {
                    unit: id.to_string(),
                    reason: format!("'{name}' is not a {CONTROLLER_PREFIX}* type"),
                });
            }
        }
        Ok(())
    }

    /// Exported controller type names.
    pub fn controllers(&self) -> &[String] {
        &self.unit.controllers
    }
}

/// Identifier of a unit: its file name.
pub fn unit_id(path: &Path) -> String {
    path.file_name().map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

/// Whether `path` looks like a controller source unit.
pub fn is_unit_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.starts_with(UNIT_PREFIX)
        && path.extension().and_then(|e| e.to_str()) == Some(UNIT_EXTENSION)
        && path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE_UNIT: &str = r#"
[unit]
description = "Moderation and health check"
controllers = ["ControllerAdmin", "ControllerPing"]
"#;

    #[test]
    fn test_parse_unit() {
        let unit = ControllerUnit::from_toml("controller_mod.toml", SAMPLE_UNIT).unwrap();

        assert_eq!(unit.unit.description.as_deref(), Some("Moderation and health check"));
        assert_eq!(unit.controllers(), ["ControllerAdmin", "ControllerPing"]);
        assert!(unit.validate("controller_mod.toml").is_ok());
    }

    #[test]
    fn test_syntax_error() {
        let result = ControllerUnit::from_toml("controller_bad.toml", "[unit\ncontrollers = ");
        assert!(matches!(result, Err(PluginError::UnitLoad { .. })));
    }

    #[test]
    fn test_missing_unit_section() {
        let result = ControllerUnit::from_toml("controller_bad.toml", "controllers = []");
        assert!(matches!(result, Err(PluginError::UnitLoad { .. })));
    }

    #[test]
    fn test_rejects_unprefixed_type() {
        let toml = r#"
[unit]
controllers = ["PingHelper"]
"#;
        let unit = ControllerUnit::from_toml("controller_x.toml", toml).unwrap();
        assert!(matches!(unit.validate("controller_x.toml"), Err(PluginError::InvalidUnit { .. })));

        let bare = ControllerUnit::new("bare prefix", &["Controller"]);
        assert!(bare.validate("controller_y.toml").is_err());
    }

    #[test]
    fn test_is_unit_file() {
        let dir = TempDir::new().unwrap();
        let unit = dir.path().join("controller_ping.toml");
        let other = dir.path().join("notes.toml");
        let wrong_ext = dir.path().join("controller_ping.json");
        for path in [&unit, &other, &wrong_ext] {
            std::fs::write(path, SAMPLE_UNIT).unwrap();
        }

        assert!(is_unit_file(&unit));
        assert!(!is_unit_file(&other));
        assert!(!is_unit_file(&wrong_ext));
        assert!(!is_unit_file(&dir.path().join("controller_missing.toml")));
    }

    #[test]
    fn test_serialize_unit() {
        let unit = ControllerUnit::new("Ping", &["ControllerPing"]);
        let serialized = unit.to_toml().unwrap();
        assert!(serialized.contains("ControllerPing"));
        assert_eq!(ControllerUnit::from_toml("x", &serialized).unwrap(), unit);
    }
}
