//! Library crate for aegis-scan-rs exposing reusable modules.
pub mod actions;
pub mod ai;
pub mod config;
pub mod history;
pub mod probe;
pub mod progress;
pub mod risk;
pub mod server;
pub mod types;
