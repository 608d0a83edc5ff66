//! CLI command handlers.

pub mod client;
pub mod config;
