//! Built-in controllers.

mod admin;
mod ping;

pub use admin::AdminController;
pub use ping::PingController;
