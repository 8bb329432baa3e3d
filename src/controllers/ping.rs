//! `ping` health check.

use std::sync::Arc;

use crate::plugin::{
    into_boxed, CommandReply, Controller, ControllerBase, ControllerOptions, PluginHost,
};
use crate::settings::Settings;

/// Replies to `ping` with two configurable lines.
#[derive(Debug)]
pub struct PingController {
    base: ControllerBase,
}

impl PingController {
    /// Exported type name.
    pub const TYPE_NAME: &'static str = "ControllerPing";

    pub fn default_settings() -> Settings {
        Settings::new()
            .with("enabled", true)
            .with("response", "Pong!")
            .with("response2", "Ping successful!")
    }

    pub fn new(host: Arc<dyn PluginHost>, options: ControllerOptions) -> Self {
        Self { base: ControllerBase::new(Self::TYPE_NAME, Self::default_settings(), host, options) }
    }

    /// Catalog factory.
    pub fn create(host: Arc<dyn PluginHost>, options: ControllerOptions) -> Box<dyn Controller> {
        into_boxed(Self::new(host, options), options)
    }
}

impl Controller for PingController {
    fn base(&self) -> &ControllerBase {
        &self.base
    }

    fn register_commands(&self) -> Vec<String> {
        if !self.base.settings().read().bool_or("enabled", true) {
            return Vec::new();
        }

        let registered = self.base.register_command("ping", |_, settings| {
            CommandReply::text(settings.str_or("response", "Pong!"))
                .and_text(settings.str_or("response2", "Ping successful!"))
        });
        if registered {
            vec!["ping".to_string()]
        } else {
            Vec::new()
        }
    }
}
