//! Per-plugin settings.
//!
//! Every plugin owns a flat map of boolean, integer, and text settings. The
//! maps are persisted together in one JSON document, and loading always
//! merges stored values over the plugin's defaults:
//!
//! - a missing key, `null`, or `""` means "use the default"
//! - `false` and `0` are real values and are kept
//!
//! # Example document
//!
//! ```json
//! {
//!     "ControllerBot": { "default_prefix": "!" },
//!     "ControllerPing": { "enabled": true, "response": "Pong!" }
//! }
//! ```

mod error;
mod store;
mod value;

pub use error::{SettingsError, SettingsResult, ValidationError};
pub use store::{
    host_defaults, merge_with_defaults, SettingsDocument, SettingsStore, DEFAULT_PREFIX,
    HOST_SETTINGS_KEY,
};
pub use value::{sanitize_text, SettingEdit, SettingKind, SettingValue, Settings};

/// Settings shared between a live controller and its command handlers.
pub type SharedSettings = std::sync::Arc<parking_lot::RwLock<Settings>>;

/// Wrap settings for sharing.
pub fn shared(settings: Settings) -> SharedSettings {
    std::sync::Arc::new(parking_lot::RwLock::new(settings))
}
