//! Interactive client handler.

use anyhow::{Context, Result};
use env0_core::config::Config;

pub async fn run(config: Config) -> Result<()> {
    env0_tui::run_interactive(config)
        .await
        .context("interactive client failed")
}
