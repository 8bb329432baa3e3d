//! Terminal User Interface module.
//!
//! Renders the control surface with ratatui and turns key presses into
//! intents on [`crate::App`].

mod app;
mod input;
mod theme;
mod ui;

pub use app::run_tui;
pub use input::{handle_events, handle_paste};
pub use theme::Theme;
pub use ui::draw;
