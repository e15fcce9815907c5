//! TUI module for lanyard-cli
//!
//! Live presence view using Ratatui.

mod app;
mod card;
mod ui;

pub use app::run;
