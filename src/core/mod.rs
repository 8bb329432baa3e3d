//! Core application types for ctrlbot.
//!
//! Currently this is the configuration layer shared by the CLI, the TUI,
//! and the service.

mod config;

pub use config::{
    AppConfig, CredentialBackend, CredentialsConfig, GeneralConfig, ServiceConfig, UiConfig,
    LOCAL_CONFIG_FILE,
};
