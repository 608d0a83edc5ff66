//! Full-screen TUI for the env0 story client.

pub mod common;
pub mod effects;
pub mod events;
pub mod features;
pub mod render;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod update;

use std::io::{IsTerminal, stderr};

use anyhow::Result;
use env0_core::config::Config;
use env0_core::transport::{self, ReconnectPolicy, TransportConfig};
pub use runtime::TuiRuntime;
use tokio_util::sync::CancellationToken;

/// Connects to the backend and runs the TUI until the user quits.
///
/// # Errors
/// Returns an error if stderr is not a terminal, the server URL is invalid,
/// or terminal I/O fails.
pub async fn run_interactive(config: Config) -> Result<()> {
    if !stderr().is_terminal() {
        anyhow::bail!("env0 requires a terminal.");
    }

    let url = config.server_url()?;
    tracing::info!(%url, typing = config.typing.enabled, "starting env0");

    let cancel = CancellationToken::new();
    let handle = transport::spawn(
        TransportConfig {
            url,
            reconnect: ReconnectPolicy::from(&config.reconnect),
        },
        cancel.clone(),
    );

    let result = TuiRuntime::new(&config, handle).and_then(|mut runtime| {
        // The event loop blocks on terminal polling; the transport keeps
        // running on the other worker threads.
        tokio::task::block_in_place(|| runtime.run())
    });
    cancel.cancel();
    result
}
