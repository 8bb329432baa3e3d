//! Bot token storage.
//!
//! The service only needs `get` and `set` on an opaque secret. Backends:
//! - `.env` file (plus the process environment), the default
//! - OS keychain via `keyring` (feature `secrets`)
//! - in-memory, for tests and one-off runs
//!
//! # Security Features
//!
//! - Memory is zeroed when secrets are dropped (using zeroize)
//! - Secrets are never logged: `Debug` and `Display` are redacted

#[cfg(feature = "secrets")]
use keyring::Entry;
use zeroize::Zeroize;

use std::fmt;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

/// The service name used for keyring entries.
pub const SERVICE_NAME: &str = "ctrlbot";

/// Default variable holding the bot token.
pub const DEFAULT_TOKEN_KEY: &str = "DISCORD_TOKEN";

/// Result type for credential operations.
pub type CredentialResult<T> = Result<T, CredentialError>;

/// Errors that can occur during credential operations.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The env file could not be read or written.
    #[error("Credential file {path} is not accessible: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The env file has a syntax error.
    #[error("Credential file {path} could not be parsed: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// Failed to access the system keychain.
    #[error("Failed to access system keychain: {0}")]
    KeychainAccess(String),

    /// Failed to store secret.
    #[error("Failed to store secret: {0}")]
    StoreFailed(String),

    /// Failed to delete secret.
    #[error("Failed to delete secret: {0}")]
    DeleteFailed(String),

    /// Refusing to store an empty secret.
    #[error("Refusing to store an empty token")]
    Empty,

    /// Feature not available.
    #[error("Keychain support not available - compile with 'secrets' feature")]
    FeatureNotAvailable,
}

/// A secret value that is zeroed on drop.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue {
    value: String,
}

impl SecretValue {
    /// Create a new secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }

    /// Get the secret value.
    ///
    /// Note: Use sparingly and ensure the value is not logged.
    pub fn expose(&self) -> &str {
        &self.value
    }

    /// Get the length of the secret.
    pub fn len(&self) -> usize {
        self.value.len()
    }

    /// Check if the secret is empty.
    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }

    /// Fixed-width mask for display in input fields.
    pub fn masked(&self) -> String {
        "*".repeat(self.value.chars().count().min(32))
    }
}

impl PartialEq for SecretValue {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for SecretValue {}

// Prevent accidental logging of secrets
impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretValue([REDACTED])")
    }
}

impl fmt::Display for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

/// Where the bot token comes from and goes to.
pub trait CredentialStore: Send + Sync {
    /// Current token, if any.
    fn get(&self) -> CredentialResult<Option<SecretValue>>;

    /// Persist a token.
    fn set(&self, secret: &SecretValue) -> CredentialResult<()>;

    /// Forget the stored token.
    fn clear(&self) -> CredentialResult<()>;

    /// Human-readable location, e.g. `.env (DISCORD_TOKEN)`.
    fn describe(&self) -> String;
}

/// Token kept in a `KEY=value` env file.
///
/// Lookups check the process environment first unless disabled.
#[derive(Debug, Clone)]
pub struct EnvFileCredentialStore {
    path: PathBuf,
    key: String,
    use_process_env: bool,
}

impl EnvFileCredentialStore {
    pub fn new(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self { path: path.into(), key: key.into(), use_process_env: true }
    }

    /// Ignore the process environment and only read the file.
    pub fn file_only(mut self) -> Self {
        self.use_process_env = false;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn io_err(&self, source: std::io::Error) -> CredentialError {
        CredentialError::Io { path: self.path.clone(), source }
    }

    fn read_file(&self) -> CredentialResult<Option<SecretValue>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let parse_err =
            |e: dotenvy::Error| CredentialError::Parse { path: self.path.clone(), reason: e.to_string() };

        for item in dotenvy::from_path_iter(&self.path).map_err(parse_err)? {
            let (key, value) = item.map_err(parse_err)?;
            if key == self.key {
                let secret = SecretValue::new(value);
                return Ok((!secret.is_empty()).then_some(secret));
            }
        }
        Ok(None)
    }

    /// Existing lines without any assignment to our key.
    fn other_lines(&self) -> CredentialResult<Vec<String>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|e| self.io_err(e))?;
        Ok(content.lines().filter(|line| !self.assigns_key(line)).map(str::to_string).collect())
    }

    fn assigns_key(&self, line: &str) -> bool {
        let line = line.trim_start();
        let line = line.strip_prefix("export ").unwrap_or(line).trim_start();
        line.strip_prefix(self.key.as_str())
            .is_some_and(|rest| rest.trim_start().starts_with('='))
    }

    fn write_lines(&self, lines: &[String]) -> CredentialResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }

        let mut content = lines.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        std::fs::write(&self.path, content).map_err(|e| self.io_err(e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.path, permissions).map_err(|e| self.io_err(e))?;
        }
        Ok(())
    }
}

/// Quote a value for an env file if it needs it.
fn quote_env_value(value: &str) -> String {
    let plain = value.chars().all(|c| c.is_ascii_alphanumeric() || "._-:/+".contains(c));
    if plain {
        value.to_string()
    } else {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    }
}

impl CredentialStore for EnvFileCredentialStore {
    fn get(&self) -> CredentialResult<Option<SecretValue>> {
        if self.use_process_env {
            if let Ok(value) = std::env::var(&self.key) {
                let secret = SecretValue::new(value);
                if !secret.is_empty() {
                    return Ok(Some(secret));
                }
            }
        }
        self.read_file()
    }

    fn set(&self, secret: &SecretValue) -> CredentialResult<()> {
        if secret.is_empty() {
            return Err(CredentialError::Empty);
        }

        let mut lines = self.other_lines()?;
        lines.push(format!("{}={}", self.key, quote_env_value(secret.expose())));
        self.write_lines(&lines)?;
        debug!(path = %self.path.display(), key = %self.key, "Token saved");
        Ok(())
    }

    fn clear(&self) -> CredentialResult<()> {
        if !self.path.exists() {
            return Ok(());
        }
        let lines = self.other_lines()?;
        self.write_lines(&lines)
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.path.display(), self.key)
    }
}

/// Token kept in the OS keychain.
#[derive(Debug, Clone)]
pub struct KeyringCredentialStore {
    service: String,
    key: String,
}

impl KeyringCredentialStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self::with_service(SERVICE_NAME, key)
    }

    /// Create a store with a custom service name.
    pub fn with_service(service: impl Into<String>, key: impl Into<String>) -> Self {
        Self { service: service.into(), key: key.into() }
    }

    #[cfg(feature = "secrets")]
    fn entry(&self) -> CredentialResult<Entry> {
        Entry::new(&self.service, &self.key).map_err(|e| CredentialError::KeychainAccess(e.to_string()))
    }
}

#[cfg(feature = "secrets")]
impl CredentialStore for KeyringCredentialStore {
    fn get(&self) -> CredentialResult<Option<SecretValue>> {
        match self.entry()?.get_password() {
            Ok(password) => Ok(Some(SecretValue::new(password))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(CredentialError::KeychainAccess(e.to_string())),
        }
    }

    fn set(&self, secret: &SecretValue) -> CredentialResult<()> {
        if secret.is_empty() {
            return Err(CredentialError::Empty);
        }
        self.entry()?
            .set_password(secret.expose())
            .map_err(|e| CredentialError::StoreFailed(e.to_string()))
    }

    fn clear(&self) -> CredentialResult<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(CredentialError::DeleteFailed(e.to_string())),
        }
    }

    fn describe(&self) -> String {
        format!("keychain ({}/{})", self.service, self.key)
    }
}

#[cfg(not(feature = "secrets"))]
impl CredentialStore for KeyringCredentialStore {
    fn get(&self) -> CredentialResult<Option<SecretValue>> {
        Err(CredentialError::FeatureNotAvailable)
    }

    fn set(&self, _secret: &SecretValue) -> CredentialResult<()> {
        Err(CredentialError::FeatureNotAvailable)
    }

    fn clear(&self) -> CredentialResult<()> {
        Err(CredentialError::FeatureNotAvailable)
    }

    fn describe(&self) -> String {
        format!("keychain ({}/{}, unavailable)", self.service, self.key)
    }
}

/// Token held in memory only.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    secret: Mutex<Option<SecretValue>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(secret: SecretValue) -> Self {
        Self { secret: Mutex::new(Some(secret)) }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> CredentialResult<Option<SecretValue>> {
        Ok(self.secret.lock().clone())
    }

    fn set(&self, secret: &SecretValue) -> CredentialResult<()> {
        if secret.is_empty() {
            return Err(CredentialError::Empty);
        }
        *self.secret.lock() = Some(secret.clone());
        Ok(())
    }

    fn clear(&self) -> CredentialResult<()> {
        *self.secret.lock() = None;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
