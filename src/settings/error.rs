//! Settings error types.

use std::path::PathBuf;

use thiserror::Error;

use super::SettingKind;

/// Result type for settings persistence.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Errors reading or writing the settings document.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read or written.
    #[error("Settings file {path} is not accessible: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid JSON.
    #[error("Settings file {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The settings file is valid JSON but not an object of plugin entries.
    #[error("Settings file {0} must contain a JSON object at the top level")]
    Malformed(PathBuf),
}

/// A user edit that does not fit the type of the setting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("'{key}' is a flag and only accepts true/false")]
    NotABoolean { key: String },

    #[error("'{key}' accepts only whole numbers (got '{input}')")]
    NotAnInteger { key: String, input: String },

    #[error("'{key}' does not accept non-printable characters")]
    NonPrintable { key: String },

    #[error("'{key}' expects a {expected} value, not a {found} value")]
    TypeMismatch { key: String, expected: SettingKind, found: SettingKind },
}
