// Terminal UI implementation using ratatui
// The face of the release tracker

pub mod app;
pub mod runner;
pub mod ui;

pub use app::{Action, App, InputMode};
pub use runner::run_tui;
