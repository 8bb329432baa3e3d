//! The controller contract.
//!
//! A controller owns a named set of settings and zero or more chat commands.
//! Concrete controllers embed a [`ControllerBase`] holding the shared
//! plumbing (defaults, live settings, host binding) and implement
//! [`Controller::register_commands`].

use std::fmt;
use std::sync::Arc;

use super::{CommandContext, CommandReply, LogLevel, PluginHost};
use crate::settings::{shared, Settings, SettingsResult, SharedSettings};

/// Construction flags for a controller instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    /// Register commands with the host's command table.
    pub auto_register: bool,
    /// Merge persisted values over the defaults.
    pub auto_load: bool,
}

impl ControllerOptions {
    /// Live instance for a running service.
    pub const REGISTRATION: Self = Self { auto_register: true, auto_load: true };

    /// Throwaway instance used to read default settings.
    pub const INTROSPECTION: Self = Self { auto_register: false, auto_load: false };
}

/// Factory producing a controller bound to a host.
pub type ControllerFactory = fn(Arc<dyn PluginHost>, ControllerOptions) -> Box<dyn Controller>;

/// State shared by every controller implementation.
pub struct ControllerBase {
    name: &'static str,
    defaults: Settings,
    settings: SharedSettings,
    host: Arc<dyn PluginHost>,
}

impl fmt::Debug for ControllerBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerBase")
            .field("name", &self.name)
            .field("settings", &*self.settings.read())
            .finish_non_exhaustive()
    }
}

impl ControllerBase {
    /// Build the base, loading persisted settings when `options.auto_load` is set.
    pub fn new(
        name: &'static str,
        defaults: Settings,
        host: Arc<dyn PluginHost>,
        options: ControllerOptions,
    ) -> Self {
        let initial = if options.auto_load {
            host.store().load(name, &defaults)
        } else {
            defaults.clone()
        };

        Self { name, defaults, settings: shared(initial), host }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn defaults(&self) -> &Settings {
        &self.defaults
    }

    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    pub fn host(&self) -> &Arc<dyn PluginHost> {
        &self.host
    }

    /// Log through the host, tagged with this controller's name.
    pub fn log(&self, level: LogLevel, message: &str) {
        self.host.log(self.name, level, message);
    }

    /// Register one command; a rejected registration is logged and skipped.
    pub fn register_command<F>(&self, command: &str, handler: F) -> bool
    where
        F: Fn(&CommandContext, &Settings) -> CommandReply + Send + Sync + 'static,
    {
        match self.host.commands().register(self.name, command, Arc::clone(&self.settings), handler) {
            Ok(()) => true,
            Err(e) => {
                self.log(LogLevel::Warn, &format!("Skipping command: {e}"));
                false
            }
        }
    }
}

/// Capability set every plugin variant provides.
pub trait Controller: Send + Sync {
    /// Shared controller state.
    fn base(&self) -> &ControllerBase;

    /// Register this controller's commands, honouring its enable flags as
    /// they are right now. Returns the names actually registered.
    fn register_commands(&self) -> Vec<String>;

    fn name(&self) -> &str {
        self.base().name()
    }

    fn default_settings(&self) -> Settings {
        self.base().defaults().clone()
    }

    /// Live settings shared with this controller's command handlers.
    fn settings(&self) -> SharedSettings {
        Arc::clone(self.base().settings())
    }

    /// Copy of the current settings.
    fn snapshot(&self) -> Settings {
        self.base().settings().read().clone()
    }

    /// Reload from the settings document, merging over defaults.
    fn load_settings(&self) -> Settings {
        let base = self.base();
        let loaded = base.host().store().load(base.name(), base.defaults());
        *base.settings().write() = loaded.clone();
        loaded
    }

    /// Persist the current settings under this controller's name.
    fn save_settings(&self) -> SettingsResult<()> {
        let base = self.base();
        let current = base.settings().read().clone();
        base.host().store().save(base.name(), &current)
    }
}

impl fmt::Debug for dyn Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller").field("name", &self.name()).finish()
    }
}

/// Finish construction: register commands if requested and box the controller.
pub fn into_boxed<C>(controller: C, options: ControllerOptions) -> Box<dyn Controller>
where
    C: Controller + 'static,
{
    if options.auto_register {
        let registered = controller.register_commands();
        tracing::debug!(plugin = controller.name(), commands = ?registered, "Controller constructed");
    }
    Box::new(controller)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::ControllerHost;
    use crate::settings::SettingsStore;
    use tempfile::TempDir;

    struct Echo {
        base: ControllerBase,
    }

    impl Controller for Echo {
        fn base(&self) -> &ControllerBase {
            &self.base
        }

        fn register_commands(&self) -> Vec<String> {
            let mut names = Vec::new();
            if self.base.settings().read().bool_or("enabled", true)
                && self.base.register_command("echo", |ctx, s| {
                    CommandReply::text(format!("{} {}", s.str_or("prefix", ""), ctx.args.join(" ")))
                })
            {
                names.push("echo".to_string());
            }
            names
        }
    }

    fn echo(host: Arc<dyn PluginHost>, options: ControllerOptions) -> Box<dyn Controller> {
        let defaults = Settings::new().with("enabled", true).with("prefix", ">");
        into_boxed(Echo { base: ControllerBase::new("ControllerEcho", defaults, host, options) }, options)
    }

    fn host(dir: &TempDir) -> Arc<ControllerHost> {
        Arc::new(ControllerHost::detached(SettingsStore::new(dir.path().join("settings.json"))))
    }

    #[test]
    fn test_introspection_skips_load_and_register() {
        let dir = TempDir::new().unwrap();
        let host = host(&dir);
        host.store().save("ControllerEcho", &Settings::new().with("prefix", "#")).unwrap();

        let controller = echo(host.clone(), ControllerOptions::INTROSPECTION);

        assert_eq!(controller.snapshot().str_or("prefix", ""), ">");
        assert!(host.commands().is_empty());
    }

    #[test]
    fn test_registration_loads_and_registers() {
        let dir = TempDir::new().unwrap();
        let host = host(&dir);
        host.store().save("ControllerEcho", &Settings::new().with("prefix", "#")).unwrap();

        let controller = echo(host.clone(), ControllerOptions::REGISTRATION);

        assert_eq!(controller.snapshot().str_or("prefix", ""), "#");
        assert_eq!(host.commands().names(), vec!["echo".to_string()]);
    }

    #[test]
    fn test_disabled_flag_suppresses_command() {
        let dir = TempDir::new().unwrap();
        let host = host(&dir);
        host.store().save("ControllerEcho", &Settings::new().with("enabled", false)).unwrap();

        let _controller = echo(host.clone(), ControllerOptions::REGISTRATION);

        assert!(!host.commands().contains("echo"));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let host = host(&dir);
        let controller = echo(host.clone(), ControllerOptions::REGISTRATION);

        controller.settings().write().set("prefix", "$");
        controller.save_settings().unwrap();
        controller.settings().write().set("prefix", "?");

        assert_eq!(controller.load_settings().str_or("prefix", ""), "$");
        assert_eq!(controller.snapshot().str_or("prefix", ""), "$");
    }
}
