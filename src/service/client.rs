//! Network client collaborator.
//!
//! The lifecycle manager does not talk to a chat network itself. It hands a
//! [`ClientSession`] to a [`ChatClient`], which signals readiness through the
//! session and then serves until it is stopped or the connection drops.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::oneshot;

use super::NetworkError;
use crate::plugin::{CommandReply, CommandTable, IncomingMessage};
use crate::security::SecretValue;
use crate::settings::{SharedSettings, DEFAULT_PREFIX};

/// What a client needs for one run.
pub struct ClientSession {
    /// Command table filled by this run's live controllers.
    pub commands: Arc<CommandTable>,
    /// Live host settings (command prefix).
    pub host_settings: SharedSettings,
    /// Resolve with the logged-in account name once connected.
    pub ready: oneshot::Sender<String>,
}

impl ClientSession {
    /// Current command prefix.
    pub fn prefix(&self) -> String {
        command_prefix(&self.host_settings)
    }
}

/// Command prefix from live host settings, falling back to the default when cleared.
pub fn command_prefix(host_settings: &SharedSettings) -> String {
    host_settings.read().str_or("default_prefix", DEFAULT_PREFIX).to_string()
}

/// Route a message through `commands` with the current prefix.
pub fn dispatch_message(
    commands: &CommandTable,
    host_settings: &SharedSettings,
    message: &IncomingMessage,
) -> Option<CommandReply> {
    commands.dispatch(&command_prefix(host_settings), message)
}

/// A long-lived chat connection.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Connect with `credential`, send on `session.ready` once the handshake
    /// succeeds, then serve until [`ChatClient::stop`] is called.
    ///
    /// Returning before `ready` is sent means the start failed.
    async fn start(&self, credential: SecretValue, session: ClientSession) -> Result<(), NetworkError>;

    /// Ask the connection to close and wait until it has.
    async fn stop(&self) -> Result<(), NetworkError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{shared, Settings};

    #[test]
    fn test_session_prefix_follows_live_settings() {
        let (ready, _rx) = oneshot::channel();
        let host_settings = shared(Settings::new().with("default_prefix", "?"));
        let session =
            ClientSession { commands: Arc::new(CommandTable::new()), host_settings: host_settings.clone(), ready };

        assert_eq!(session.prefix(), "?");

        host_settings.write().set("default_prefix", "");
        assert_eq!(session.prefix(), "!");
    }
}
