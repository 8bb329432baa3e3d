//! Service error types.

use thiserror::Error;

use super::ServiceState;
use crate::settings::ValidationError;

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Start or stop requested at the wrong time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("A bot token is required to start")]
    MissingCredential,

    #[error("Cannot go from {from} to {to}")]
    InvalidTransition { from: ServiceState, to: ServiceState },

    #[error("Bot is already {0}")]
    NotStopped(ServiceState),

    #[error("Bot is not running (currently {0})")]
    NotRunning(ServiceState),
}

/// Failure reported by the chat client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Timed out after {0} ms")]
    Timeout(u64),

    #[error("Client is already connected")]
    AlreadyConnected,

    #[error("Connection closed: {0}")]
    Closed(String),
}

/// Any failure of a control-surface operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("Unknown plugin '{0}'")]
    UnknownPlugin(String),

    #[error("Plugin '{plugin}' has no setting '{key}'")]
    UnknownSetting { plugin: String, key: String },
}

impl ServiceError {
    /// Whether the user's input was at fault rather than the service.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::UnknownPlugin(_) | Self::UnknownSetting { .. })
    }

    /// Whether the request was rejected because of the current state.
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Self::Lifecycle(_))
    }
}
