//! Controller discovery.
//!
//! The registry scans the controllers directory for source units, resolves
//! their exported types against the compiled-in catalog, and builds one
//! [`PluginDescriptor`] per type. Discovery order is the lexicographic order
//! of the unit file names, then declaration order inside a unit.
//!
//! A bad unit never aborts the scan: it is logged and skipped in full.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::catalog::{self, CatalogEntry};
use super::manifest::{is_unit_file, unit_id, ControllerUnit};
use super::{
    Controller, ControllerFactory, ControllerHost, ControllerOptions, PluginError, PluginHost,
    PluginResult,
};
use crate::settings::{host_defaults, Settings, SettingsDocument, SettingsStore, HOST_SETTINGS_KEY};

/// A discovered controller type.
#[derive(Debug, Clone)]
pub struct PluginDescriptor {
    name: String,
    unit: String,
    defaults: Settings,
    factory: ControllerFactory,
}

impl PluginDescriptor {
    /// Build a descriptor, reading defaults from an introspection instance.
    pub fn introspect(entry: &CatalogEntry, unit: &str, store: &SettingsStore) -> Self {
        let host: Arc<dyn PluginHost> = Arc::new(ControllerHost::detached(store.clone()));
        let instance = (entry.factory)(host, ControllerOptions::INTROSPECTION);

        Self {
            name: entry.type_name.to_string(),
            unit: unit.to_string(),
            defaults: instance.default_settings(),
            factory: entry.factory,
        }
    }

    /// Unique plugin name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unit file that exported this type.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn defaults(&self) -> &Settings {
        &self.defaults
    }

    /// Construct an instance bound to `host`.
    pub fn instantiate(
        &self,
        host: Arc<dyn PluginHost>,
        options: ControllerOptions,
    ) -> Box<dyn Controller> {
        (self.factory)(host, options)
    }
}

/// Ordered set of discovered controller types.
#[derive(Debug, Clone, Default)]
pub struct ControllerRegistry {
    dir: PathBuf,
    descriptors: Vec<PluginDescriptor>,
}

impl ControllerRegistry {
    /// Scan `dir` and build the registry.
    pub fn discover(dir: impl Into<PathBuf>, store: &SettingsStore) -> Self {
        let dir = dir.into();
        let descriptors = discover(&dir, store);
        info!(dir = %dir.display(), count = descriptors.len(), "Controllers discovered");
        Self { dir, descriptors }
    }

    /// Re-run discovery, keeping already known descriptors.
    ///
    /// Newly found types are appended; nothing is removed. Returns the names
    /// of the added types.
    pub fn rescan(&mut self, store: &SettingsStore) -> Vec<String> {
        let mut added = Vec::new();
        for descriptor in discover(&self.dir, store) {
            if self.get(descriptor.name()).is_none() {
                added.push(descriptor.name().to_string());
                self.descriptors.push(descriptor);
            }
        }
        added
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn descriptors(&self) -> &[PluginDescriptor] {
        &self.descriptors
    }

    /// Plugin names in discovery order.
    pub fn names(&self) -> Vec<String> {
        self.descriptors.iter().map(|d| d.name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&PluginDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Defaults of every plugin plus the reserved host entry.
    pub fn defaults_document(&self) -> SettingsDocument {
        let mut document = SettingsDocument::new();
        for descriptor in &self.descriptors {
            document.insert(descriptor.name.clone(), descriptor.defaults.clone());
        }
        document.insert(HOST_SETTINGS_KEY, host_defaults());
        document
    }

    /// Instantiate every plugin in registration mode, in discovery order.
    pub fn instantiate_all(&self, host: &Arc<dyn PluginHost>) -> Vec<Box<dyn Controller>> {
        self.descriptors
            .iter()
            .map(|d| d.instantiate(Arc::clone(host), ControllerOptions::REGISTRATION))
            .collect()
    }
}

/// Scan `dir` for source units and describe every exported controller type.
pub fn discover(dir: &Path, store: &SettingsStore) -> Vec<PluginDescriptor> {
    let units = match scan_units(dir) {
        Ok(units) => units,
        Err(e) => {
            warn!(error = %e, "Controller discovery skipped");
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut descriptors = Vec::new();

    for path in units {
        let id = unit_id(&path);
        let entries = match load_unit(&path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(unit = %id, error = %e, "Skipping controller unit");
                continue;
            }
        };

        for entry in entries {
            if !seen.insert(entry.type_name) {
                warn!(unit = %id, controller = entry.type_name, "Controller already discovered, ignoring duplicate");
                continue;
            }
            debug!(unit = %id, controller = entry.type_name, "Controller found");
            descriptors.push(PluginDescriptor::introspect(entry, &id, store));
        }
    }

    descriptors
}

/// Unit files in `dir`, sorted by file name. Creates `dir` if missing.
fn scan_units(dir: &Path) -> PluginResult<Vec<PathBuf>> {
    let directory_err =
        |source: std::io::Error| PluginError::Directory { path: dir.to_path_buf(), source };

    std::fs::create_dir_all(dir).map_err(directory_err)?;

    let mut units: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(directory_err)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| is_unit_file(path))
        .collect();

    units.sort_by_key(|path| unit_id(path));
    Ok(units)
}

/// Parse a unit and resolve all of its types, failing the unit as a whole.
fn load_unit(path: &Path) -> PluginResult<Vec<&'static CatalogEntry>> {
    let unit = ControllerUnit::from_file(path)?;
    unit.controllers()
        .iter()
        .map(|name| {
            catalog::lookup(name).ok_or_else(|| PluginError::UnknownController {
                unit: unit_id(path),
                name: name.clone(),
            })
        })
        .collect()
}
