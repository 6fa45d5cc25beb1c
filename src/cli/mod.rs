//! Terminal host for the dashboard controller

pub mod coins;
pub mod history;
pub mod render;
pub mod setup;
pub mod ui;
pub mod watch;
