//! JSON-file persistence for plugin settings.
//!
//! The whole document lives in one UTF-8 JSON file whose top-level keys are
//! plugin names. Every write rewrites the file wholesale through a temp file
//! in the same directory, so readers never observe a half-written document.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{SettingValue, Settings, SettingsError, SettingsResult};

/// Reserved document entry holding the host service's own settings.
pub const HOST_SETTINGS_KEY: &str = "ControllerBot";

/// Default command prefix of the host service.
pub const DEFAULT_PREFIX: &str = "!";

/// Default settings of the host service.
pub fn host_defaults() -> Settings {
    Settings::new().with("default_prefix", DEFAULT_PREFIX)
}

/// In-memory copy of the settings document: plugin name -> settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SettingsDocument {
    plugins: BTreeMap<String, Settings>,
}

impl SettingsDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, plugin: &str) -> Option<&Settings> {
        self.plugins.get(plugin)
    }

    pub fn get_mut(&mut self, plugin: &str) -> Option<&mut Settings> {
        self.plugins.get_mut(plugin)
    }

    /// Replace a plugin's entry wholesale.
    pub fn insert(&mut self, plugin: impl Into<String>, settings: Settings) {
        self.plugins.insert(plugin.into(), settings);
    }

    pub fn contains(&self, plugin: &str) -> bool {
        self.plugins.contains_key(plugin)
    }

    /// Look up a single value.
    pub fn value(&self, plugin: &str, key: &str) -> Option<&SettingValue> {
        self.plugins.get(plugin).and_then(|s| s.get(key))
    }

    /// Iterate over plugin entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Settings)> {
        self.plugins.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

/// Overlay stored values on top of defaults.
///
/// A stored value replaces the default only when it is present, not `null`,
/// not the empty string, and of the same kind as the default. `false` and
/// `0` are kept. Stored keys unknown to the defaults are carried along.
pub fn merge_with_defaults(defaults: &Settings, stored: Option<&Value>) -> Settings {
    let mut merged = defaults.clone();
    let Some(Value::Object(stored)) = stored else {
        return merged;
    };

    for (key, raw) in stored {
        let Some(value) = SettingValue::from_json(raw) else {
            continue;
        };
        match defaults.get(key) {
            Some(default) if default.kind() != value.kind() => {
                warn!(
                    key = %key,
                    expected = %default.kind(),
                    found = %value.kind(),
                    "Stored setting has the wrong type, using default"
                );
            }
            _ => merged.set(key.clone(), value),
        }
    }

    merged
}

/// Reads and writes the persisted settings document.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Create a store backed by the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the settings file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the settings file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the raw document. A missing file is an empty document.
    pub fn read_raw(&self) -> SettingsResult<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|source| SettingsError::Io { path: self.path.clone(), source })?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        let value: Value = serde_json::from_str(&content)
            .map_err(|source| SettingsError::Json { path: self.path.clone(), source })?;

        match value {
            Value::Object(map) => Ok(map),
            _ => Err(SettingsError::Malformed(self.path.clone())),
        }
    }

    /// Load one plugin's settings merged over its defaults.
    ///
    /// Never fails: read or parse errors are logged and the defaults returned.
    pub fn load(&self, plugin: &str, defaults: &Settings) -> Settings {
        match self.read_raw() {
            Ok(document) => merge_with_defaults(defaults, document.get(plugin)),
            Err(e) => {
                warn!(plugin, error = %e, "Failed to load settings, using defaults");
                defaults.clone()
            }
        }
    }

    /// Load every plugin in `defaults` with a single read of the file.
    pub fn load_document(&self, defaults: &SettingsDocument) -> SettingsDocument {
        let raw = self.read_raw().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load settings document, using defaults");
            Map::new()
        });

        let mut document = SettingsDocument::new();
        for (plugin, plugin_defaults) in defaults.iter() {
            document.insert(plugin, merge_with_defaults(plugin_defaults, raw.get(plugin)));
        }
        document
    }

    /// Replace one plugin's entry on disk.
    ///
    /// Best-effort: failures are logged here and returned for callers that
    /// want to report them.
    pub fn save(&self, plugin: &str, settings: &Settings) -> SettingsResult<()> {
        let result = self.update_raw(|raw| {
            raw.insert(plugin.to_string(), settings.to_json());
        });

        match &result {
            Ok(()) => debug!(plugin, path = %self.path.display(), "Settings saved"),
            Err(e) => warn!(plugin, error = %e, "Failed to save settings"),
        }
        result
    }

    /// Replace every entry present in `document` on disk.
    ///
    /// Entries on disk that `document` does not know about are preserved.
    pub fn write_document(&self, document: &SettingsDocument) -> SettingsResult<()> {
        let result = self.update_raw(|raw| {
            for (plugin, settings) in document.iter() {
                raw.insert(plugin.to_string(), settings.to_json());
            }
        });

        if let Err(e) = &result {
            warn!(error = %e, "Failed to save settings document");
        }
        result
    }

    /// Write `document` only if no settings file exists yet.
    ///
    /// Returns whether the file was created.
    pub fn ensure_initialized(&self, document: &SettingsDocument) -> SettingsResult<bool> {
        if self.exists() {
            return Ok(false);
        }
        self.write_document(document)?;
        Ok(true)
    }

    fn update_raw(&self, apply: impl FnOnce(&mut Map<String, Value>)) -> SettingsResult<()> {
        let mut raw = match self.read_raw() {
            Ok(raw) => raw,
            Err(e @ (SettingsError::Json { .. } | SettingsError::Malformed(_))) => {
                warn!(error = %e, "Overwriting unreadable settings file");
                Map::new()
            }
            Err(e) => return Err(e),
        };

        apply(&mut raw);
        self.write_raw(&raw)
    }

    fn write_raw(&self, raw: &Map<String, Value>) -> SettingsResult<()> {
        let io_err = |source: std::io::Error| SettingsError::Io { path: self.path.clone(), source };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(io_err)?;

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        raw.serialize(&mut serializer)
            .map_err(|source| SettingsError::Json { path: self.path.clone(), source })?;
        buf.push(b'\n');

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(io_err)?;
        tmp.write_all(&buf).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;

        Ok(())
    }
}
