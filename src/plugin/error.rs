//! Plugin system error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for plugin operations.
pub type PluginResult<T> = Result<T, PluginError>;

/// Errors that can occur while discovering or wiring up controllers.
#[derive(Debug, Error)]
pub enum PluginError {
    /// Controller source unit could not be loaded.
    #[error("Failed to load {unit}: {reason}")]
    UnitLoad { unit: String, reason: String },

    /// Controller source unit parsed but is not usable.
    #[error("Invalid controller unit {unit}: {reason}")]
    InvalidUnit { unit: String, reason: String },

    /// Unit exports a controller type the catalog does not provide.
    #[error("Unknown controller type '{name}' exported by {unit}")]
    UnknownController { unit: String, name: String },

    /// Command name already taken in this run's command table.
    #[error("Command '{command}' is already registered by {owner}")]
    DuplicateCommand { command: String, owner: String },

    /// Scan directory is not accessible.
    #[error("Controller directory {path} is not accessible: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
