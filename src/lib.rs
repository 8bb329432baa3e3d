//! # ctrlbot
//!
//! Controller plugin runtime and control surface for a chat bot.
//!
//! ctrlbot discovers command-handling controllers, gives each one a private,
//! persisted settings map, and starts and stops the chat connection on
//! demand. Settings edited from the control surface stay consistent across
//! the settings file, the pending copy shown while the bot is stopped, and
//! the live controllers of a running bot.
//!
//! ## Features
//!
//! - **Controllers**: Ping and moderation controllers, declared in `controller_*.toml` units
//! - **Typed settings**: Boolean, integer, and text settings merged over defaults
//! - **Lifecycle**: Start, stop, and restart the bot within one process
//! - **Control surface**: Terminal UI with live settings editing and a console
//! - **Credentials**: Token kept in `.env` or the OS keychain
//!
//! ## Quick Start
//!
//! ```bash
//! # Write the default controller units and settings file
//! ctrlbot init
//!
//! # Store the bot token
//! ctrlbot token set <TOKEN>
//!
//! # Open the control surface
//! ctrlbot
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::derivable_impls)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::significant_drop_in_scrutinee)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::cast_possible_truncation)]

pub mod app;
pub mod controllers;
pub mod core;
pub mod plugin;
pub mod security;
pub mod service;
pub mod settings;
pub mod tui;

// Re-export commonly used types
pub use app::{App, AppMode, Intent, Outcome};
pub use core::AppConfig;
pub use plugin::{Controller, ControllerRegistry, PluginDescriptor};
pub use security::{CredentialStore, SecretValue};
pub use service::{ServiceError, ServiceManager, ServiceState};
pub use settings::{SettingEdit, SettingValue, Settings, SettingsStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "ctrlbot";
