//! Controller plugin system.
//!
//! Controllers are compiled into the binary and listed in a static catalog.
//! Which of them are active, and in what order, is decided by the source
//! units found in the controllers directory at startup.
//!
//! # Lifecycle
//!
//! - **Discovery**: every exported type gets a [`PluginDescriptor`], built
//!   from a throwaway introspection instance that only reports its defaults
//! - **Registration**: when the service starts, each descriptor produces a
//!   live controller bound to that run's [`ControllerHost`]; live controllers
//!   load their settings and register their enabled commands
//! - **Teardown**: the live set is dropped when the service stops
//!
//! # Example unit
//!
//! ```toml
//! [unit]
//! description = "Ping health check"
//! controllers = ["ControllerPing"]
//! ```

pub mod catalog;
mod command;
mod controller;
mod error;
mod host;
mod manifest;
mod registry;

pub use command::{
    parse_invocation, CommandContext, CommandHandler, CommandReply, CommandTable, IncomingMessage,
    ModerationAction,
};
pub use controller::{into_boxed, Controller, ControllerBase, ControllerFactory, ControllerOptions};
pub use error::{PluginError, PluginResult};
pub use host::{ControllerHost, LogLevel, PluginHost};
pub use manifest::{ControllerUnit, UnitMetadata, CONTROLLER_PREFIX, UNIT_EXTENSION, UNIT_PREFIX};
pub use registry::{discover, ControllerRegistry, PluginDescriptor};
