//! In-process chat client.
//!
//! Messages are pushed in through a [`LoopbackHandle`] and replies come back
//! out of it. Used by `ctrlbot serve` (stdin as the chat channel) and by the
//! tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, info};

use super::client::{dispatch_message, ChatClient, ClientSession};
use super::NetworkError;
use crate::plugin::{CommandReply, IncomingMessage};
use crate::security::SecretValue;

/// Reply produced for one incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingReply {
    pub channel: String,
    pub reply: CommandReply,
}

/// Test/console side of a [`LoopbackClient`].
#[derive(Debug)]
pub struct LoopbackHandle {
    inbox: mpsc::UnboundedSender<IncomingMessage>,
    outbox: mpsc::UnboundedReceiver<OutgoingReply>,
}

impl LoopbackHandle {
    /// Deliver a message to the client. Returns false once the client is gone.
    pub fn send(&self, message: IncomingMessage) -> bool {
        self.inbox.send(message).is_ok()
    }

    /// Wait for the next reply, up to `timeout`.
    pub async fn recv_reply(&mut self, timeout: Duration) -> Option<OutgoingReply> {
        tokio::time::timeout(timeout, self.outbox.recv()).await.ok().flatten()
    }

    /// Next reply if one is already waiting.
    pub fn try_recv_reply(&mut self) -> Option<OutgoingReply> {
        self.outbox.try_recv().ok()
    }
}

/// Chat client that never leaves the process.
#[derive(Debug)]
pub struct LoopbackClient {
    user: String,
    expected_token: Option<SecretValue>,
    handshake_delay: Duration,
    inbox: Mutex<mpsc::UnboundedReceiver<IncomingMessage>>,
    outbox: mpsc::UnboundedSender<OutgoingReply>,
    shutdown: watch::Sender<bool>,
    connected: AtomicBool,
}

impl LoopbackClient {
    /// Create a client logged in as `user`, plus the handle that feeds it.
    pub fn new(user: impl Into<String>) -> (Self, LoopbackHandle) {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();
        let (shutdown, _) = watch::channel(false);

        let client = Self {
            user: user.into(),
            expected_token: None,
            handshake_delay: Duration::ZERO,
            inbox: Mutex::new(inbox_rx),
            outbox: outbox_tx,
            shutdown,
            connected: AtomicBool::new(false),
        };
        (client, LoopbackHandle { inbox: inbox_tx, outbox: outbox_rx })
    }

    /// Reject any other token with an authentication error.
    pub fn with_expected_token(mut self, token: SecretValue) -> Self {
        self.expected_token = Some(token);
        self
    }

    /// Delay the ready signal, to exercise start timeouts.
    pub fn with_handshake_delay(mut self, delay: Duration) -> Self {
        self.handshake_delay = delay;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn serve(&self, credential: SecretValue, session: ClientSession) -> Result<(), NetworkError> {
        if let Some(expected) = &self.expected_token {
            if expected != &credential {
                return Err(NetworkError::Authentication("Improper token has been passed".into()));
            }
        }

        let ClientSession { commands, host_settings, ready } = session;
        self.shutdown.send_replace(false);
        let mut shutdown = self.shutdown.subscribe();
        let mut inbox = self.inbox.lock().await;

        if !self.handshake_delay.is_zero() {
            tokio::select! {
                () = tokio::time::sleep(self.handshake_delay) => {}
                _ = shutdown.changed() => {
                    return Err(NetworkError::Closed("stopped before the handshake finished".into()));
                }
            }
        }

        info!(user = %self.user, "Loopback client connected");
        if ready.send(self.user.clone()).is_err() {
            return Err(NetworkError::Closed("start was abandoned".into()));
        }

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                message = inbox.recv() => {
                    let Some(message) = message else {
                        return Err(NetworkError::Closed("message source closed".into()));
                    };
                    if let Some(reply) = dispatch_message(&commands, &host_settings, &message) {
                        debug!(channel = %message.channel, "Command handled");
                        let _ = self.outbox.send(OutgoingReply { channel: message.channel, reply });
                    }
                }
            }
        }

        info!(user = %self.user, "Loopback client disconnected");
        Ok(())
    }
}

struct ConnectedGuard<'a>(&'a AtomicBool);

impl Drop for ConnectedGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChatClient for LoopbackClient {
    async fn start(&self, credential: SecretValue, session: ClientSession) -> Result<(), NetworkError> {
        if self.connected.swap(true, Ordering::SeqCst) {
            return Err(NetworkError::AlreadyConnected);
        }
        // Cleared on return and when the start future is dropped mid-await.
        let _connected = ConnectedGuard(&self.connected);
        self.serve(credential, session).await
    }

    async fn stop(&self) -> Result<(), NetworkError> {
        self.shutdown.send_replace(true);
        // The serve loop holds the inbox until it exits.
        let _inbox = self.inbox.lock().await;
        Ok(())
    }
}
