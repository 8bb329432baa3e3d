//! Chat service lifecycle.
//!
//! [`ServiceManager`] runs the state machine
//! `Stopped -> Starting -> Running -> Stopping -> Stopped`, owns the pending
//! settings document, and builds a fresh live controller set for every run.
//! The settings sync bridge (`apply_edit`, `reset_plugin`) keeps the pending,
//! persisted, and live copies of every setting congruent.
//!
//! The network side is a [`ChatClient`]; [`LoopbackClient`] is the
//! in-process implementation used by `ctrlbot serve` and the tests.

mod bridge;
mod client;
mod error;
mod events;
mod loopback;
mod manager;
mod state;

pub use client::{command_prefix, dispatch_message, ChatClient, ClientSession};
pub use error::{LifecycleError, NetworkError, ServiceError, ServiceResult};
pub use events::{channel as event_channel, EventReceiver, EventSender, ServiceEvent};
pub use loopback::{LoopbackClient, LoopbackHandle, OutgoingReply};
pub use manager::{ServiceManager, ServiceOptions};
pub use state::ServiceState;
