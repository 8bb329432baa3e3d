//! Settings sync bridge.
//!
//! Every user edit goes through here. The order is fixed: update the pending
//! document, persist it, then mirror the value into the live controller (or
//! the live host settings) and let that object persist itself too. The same
//! path is taken for every setting kind.
//!
//! A failed write never rejects the edit. The store logs it and the manager
//! reports the edit as unsaved until a later write succeeds.

use tracing::{debug, info, warn};

use super::manager::LiveSet;
use super::{ServiceError, ServiceManager, ServiceResult};
use crate::settings::{SettingEdit, SettingKind, SettingValue, Settings, HOST_SETTINGS_KEY};

impl ServiceManager {
    /// Default settings of a plugin or the host entry.
    pub fn defaults_for(&self, plugin: &str) -> ServiceResult<Settings> {
        if plugin == HOST_SETTINGS_KEY {
            return Ok(crate::settings::host_defaults());
        }
        self.registry
            .read()
            .get(plugin)
            .map(|d| d.defaults().clone())
            .ok_or_else(|| ServiceError::UnknownPlugin(plugin.to_string()))
    }

    /// Kind a key is declared with in the plugin's defaults.
    pub fn setting_kind(&self, plugin: &str, key: &str) -> ServiceResult<SettingKind> {
        self.defaults_for(plugin)?.get(key).map(SettingValue::kind).ok_or_else(|| {
            ServiceError::UnknownSetting { plugin: plugin.to_string(), key: key.to_string() }
        })
    }

    /// Apply one user edit and return the stored value.
    ///
    /// A rejected edit leaves every copy of the setting untouched.
    pub fn apply_edit(&self, plugin: &str, key: &str, edit: &SettingEdit) -> ServiceResult<SettingValue> {
        let kind = self.setting_kind(plugin, key)?;

        let mut inner = self.inner.lock();
        let current = inner.pending.value(plugin, key).cloned();
        let value = edit.resolve(key, kind, current.as_ref()).inspect_err(|e| {
            debug!(plugin, key, error = %e, "Edit rejected");
        })?;

        match inner.pending.get_mut(plugin) {
            Some(settings) => settings.set(key, value.clone()),
            None => {
                let mut settings = self.defaults_for(plugin)?;
                settings.set(key, value.clone());
                inner.pending.insert(plugin, settings);
            }
        }

        let mut saved = self.store.write_document(&inner.pending).is_ok();
        if let Some(live) = &inner.live {
            saved &= mirror_value(self, live, plugin, key, &value);
        }
        inner.unsaved = !saved;

        debug!(plugin, key, value = %value, "Setting updated");
        Ok(value)
    }

    /// Set a key from an already-typed value.
    pub fn set_setting(&self, plugin: &str, key: &str, value: SettingValue) -> ServiceResult<SettingValue> {
        self.apply_edit(plugin, key, &SettingEdit::Set(value))
    }

    /// Restore a plugin's defaults in the pending, persisted, and live copies.
    pub fn reset_plugin(&self, plugin: &str) -> ServiceResult<Settings> {
        let defaults = self.defaults_for(plugin)?;

        let mut inner = self.inner.lock();
        inner.pending.insert(plugin, defaults.clone());
        let mut saved = match self.store.save(plugin, &defaults) {
            Ok(()) => true,
            Err(e) => {
                warn!(plugin, error = %e, "Reset not persisted");
                false
            }
        };

        if let Some(live) = &inner.live {
            if plugin == HOST_SETTINGS_KEY {
                *live.host_settings.write() = defaults.clone();
                saved &= self.store.save(HOST_SETTINGS_KEY, &defaults).is_ok();
            } else if let Some(controller) = live.controller(plugin) {
                *controller.settings().write() = defaults.clone();
                saved &= controller.save_settings().is_ok();
            }
        }
        inner.unsaved = !saved;

        info!(plugin, "Settings reset to defaults");
        Ok(defaults)
    }
}

/// Copy an edit into the live set. Returns whether the live copy was saved.
fn mirror_value(
    manager: &ServiceManager,
    live: &LiveSet,
    plugin: &str,
    key: &str,
    value: &SettingValue,
) -> bool {
    if plugin == HOST_SETTINGS_KEY {
        let snapshot = {
            let mut settings = live.host_settings.write();
            settings.set(key, value.clone());
            settings.clone()
        };
        return manager.store.save(HOST_SETTINGS_KEY, &snapshot).is_ok();
    }

    match live.controller(plugin) {
        Some(controller) => {
            controller.settings().write().set(key, value.clone());
            controller.save_settings().is_ok()
        }
        None => {
            warn!(plugin, "No live controller to mirror the edit into");
            true
        }
    }
}
