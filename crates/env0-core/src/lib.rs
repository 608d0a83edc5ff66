//! Core services for the env0 client: configuration, logging and the
//! backend transport.

pub mod config;
pub mod logging;
pub mod transport;
