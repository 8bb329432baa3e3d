//! Host functions for controllers.
//!
//! This module defines the interface that controllers use to interact
//! with the service that owns them: the settings store, the command
//! table of the current run, and the console log.

use std::fmt;
use std::sync::Arc;

use super::CommandTable;
use crate::service::{EventSender, ServiceEvent};
use crate::settings::SettingsStore;

/// Log level for controller logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level (most verbose).
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Short label used in the console view.
    pub fn label(self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Host interface for controllers.
///
/// Controllers only see the host through this trait, so a run can hand them
/// a host bound to its own command table while introspection hands them a
/// detached one.
pub trait PluginHost: Send + Sync {
    /// Log a message on behalf of `source`.
    fn log(&self, source: &str, level: LogLevel, message: &str);

    /// Settings store backing this host.
    fn store(&self) -> &SettingsStore;

    /// Command table controllers register against.
    fn commands(&self) -> &Arc<CommandTable>;
}

/// Host bound to one run of the service, or detached for introspection.
#[derive(Clone)]
pub struct ControllerHost {
    store: SettingsStore,
    commands: Arc<CommandTable>,
    events: Option<EventSender>,
}

impl fmt::Debug for ControllerHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerHost")
            .field("store", &self.store.path())
            .field("commands", &self.commands.len())
            .field("attached", &self.events.is_some())
            .finish()
    }
}

impl ControllerHost {
    /// Create a host for a live run.
    pub fn new(store: SettingsStore, commands: Arc<CommandTable>, events: EventSender) -> Self {
        Self { store, commands, events: Some(events) }
    }

    /// Create a host with a private command table and no console.
    pub fn detached(store: SettingsStore) -> Self {
        Self { store, commands: Arc::new(CommandTable::new()), events: None }
    }

    /// Whether log lines reach the console.
    pub fn is_attached(&self) -> bool {
        self.events.is_some()
    }
}

impl PluginHost for ControllerHost {
    fn log(&self, source: &str, level: LogLevel, message: &str) {
        match level {
            LogLevel::Trace => tracing::trace!(plugin = source, "{}", message),
            LogLevel::Debug => tracing::debug!(plugin = source, "{}", message),
            LogLevel::Info => tracing::info!(plugin = source, "{}", message),
            LogLevel::Warn => tracing::warn!(plugin = source, "{}", message),
            LogLevel::Error => tracing::error!(plugin = source, "{}", message),
        }

        if let Some(events) = &self.events {
            // Receiver gone means the control surface is shutting down.
            let _ = events.send(ServiceEvent::Log {
                source: source.to_string(),
                level,
                message: message.to_string(),
            });
        }
    }

    fn store(&self) -> &SettingsStore {
        &self.store
    }

    fn commands(&self) -> &Arc<CommandTable> {
        &self.commands
    }
}
