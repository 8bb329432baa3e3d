//! Service state machine.

use std::fmt;

use super::LifecycleError;

/// Lifecycle state of the chat service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    /// Not connected
    #[default]
    Stopped,
    /// Connecting and building live controllers
    Starting,
    /// Connected, commands live
    Running,
    /// Shutting down
    Stopping,
}

impl ServiceState {
    /// Whether `self -> next` is an allowed transition.
    ///
    /// `Starting -> Stopped` covers a failed start.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Stopped, Self::Starting)
                | (Self::Starting, Self::Running)
                | (Self::Starting, Self::Stopped)
                | (Self::Running, Self::Stopping)
                | (Self::Stopping, Self::Stopped)
        )
    }

    /// Move to `next`, or report the illegal transition.
    pub fn transition(&mut self, next: Self) -> Result<(), LifecycleError> {
        if !self.can_transition_to(next) {
            return Err(LifecycleError::InvalidTransition { from: *self, to: next });
        }
        *self = next;
        Ok(())
    }

    /// Whether a live controller set may exist.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Starting | Self::Running)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Stopped => "Stopped",
            Self::Starting => "Starting",
            Self::Running => "Running",
            Self::Stopping => "Stopping",
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
