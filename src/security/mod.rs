//! Credential handling for ctrlbot.
//!
//! The bot token is the only secret the application deals with. This module
//! stores it (see [`CredentialStore`]) and keeps it out of anything shown to
//! the user.

mod secrets;

pub use secrets::{
    CredentialError, CredentialResult, CredentialStore, EnvFileCredentialStore,
    KeyringCredentialStore, MemoryCredentialStore, SecretValue, DEFAULT_TOKEN_KEY, SERVICE_NAME,
};

use crate::core::{AppConfig, CredentialBackend};

/// Replacement text for a redacted token.
pub const REDACTED: &str = "[HIDDEN]";

/// Open the credential store selected in the configuration.
pub fn open_credential_store(config: &AppConfig) -> Box<dyn CredentialStore> {
    let key = config.credentials.env_key.clone();
    match config.credentials.backend {
        CredentialBackend::EnvFile => Box::new(EnvFileCredentialStore::new(config.env_file_path(), key)),
        CredentialBackend::Keyring => Box::new(KeyringCredentialStore::new(key)),
    }
}

/// Replace every occurrence of `secret` in `text`.
///
/// Secrets shorter than four characters are left alone; masking them would
/// mangle ordinary words.
pub fn redact(text: &str, secret: Option<&SecretValue>) -> String {
    match secret {
        Some(secret) if secret.expose().trim().len() >= 4 => {
            text.replace(secret.expose().trim(), REDACTED)
        }
        _ => text.to_string(),
    }
}
