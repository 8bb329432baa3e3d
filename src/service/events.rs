//! Events emitted by the service for the control surface.

use tokio::sync::mpsc;

use crate::plugin::LogLevel;

/// Sending half of the service event channel.
pub type EventSender = mpsc::UnboundedSender<ServiceEvent>;

/// Receiving half of the service event channel.
pub type EventReceiver = mpsc::UnboundedReceiver<ServiceEvent>;

/// Create a service event channel.
pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Event from the service lifecycle manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceEvent {
    /// Start accepted, connecting
    Starting,
    /// Handshake done, commands are live
    Ready {
        /// Account the client is logged in as
        user: String,
        /// Active plugins in discovery order
        plugins: Vec<String>,
    },
    /// Stop accepted, shutting down
    Stopping,
    /// Fully stopped
    Stopped,
    /// Start failed; the service is stopped again
    StartFailed { reason: String },
    /// Network task ended on its own while running
    Disconnected { reason: String },
    /// Log line from the service or a controller
    Log { source: String, level: LogLevel, message: String },
}

impl ServiceEvent {
    /// Console line for this event.
    pub fn describe(&self) -> String {
        match self {
            Self::Starting => "Starting bot...".to_string(),
            Self::Ready { user, plugins } => {
                format!("Logged in as {user}. Active controllers: {}", plugins.join(", "))
            }
            Self::Stopping => "Stopping bot...".to_string(),
            Self::Stopped => "Bot stopped".to_string(),
            Self::StartFailed { reason } => format!("Failed to start bot: {reason}"),
            Self::Disconnected { reason } => format!("Bot disconnected: {reason}"),
            Self::Log { source, level, message } => format!("[{level}] {source}: {message}"),
        }
    }
}
