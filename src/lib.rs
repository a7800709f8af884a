//! Study tracker for the terminal. Register tasks, break them into
//! checklist cards, record Pomodoro-style focus sessions, and get daily,
//! weekly, and monthly rollups of where the time went.
//!

pub mod cli;
pub mod progress;
pub mod store;
pub mod utils;
