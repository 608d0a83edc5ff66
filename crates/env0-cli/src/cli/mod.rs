//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use env0_core::config::{self, Config};
use env0_core::logging;

mod commands;

#[derive(Parser)]
#[command(name = "env0")]
#[command(version)]
#[command(about = "Terminal client for the env0 story backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Backend WebSocket URL (overrides `server_url` from config)
    #[arg(long, env = "ENV0_URL", value_name = "URL")]
    url: Option<String>,

    /// Show lines immediately instead of typing them out
    #[arg(long = "no-typing")]
    no_typing: bool,

    /// Path to the config file (default: $ENV0_HOME/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config_path = config::resolve_path(cli.config.as_deref());

    match cli.command {
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Path => {
                commands::config::path(&config_path);
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(&config_path),
        },
        None => {
            let mut config = Config::load_from(&config_path).context("load config")?;
            if let Some(url) = cli.url {
                config.server_url = url;
            }
            if cli.no_typing {
                config.typing.enabled = false;
            }
            config.validate()?;

            // Held until exit so buffered log lines are flushed.
            let _log_guard = logging::init(&config::paths::logs_dir())?;

            tracing::info!(
                config = %config_path.display(),
                url = %config.server_url,
                typing = config.typing.enabled,
                "env0 starting"
            );

            let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
            let result = rt.block_on(commands::client::run(config));
            match &result {
                Ok(()) => tracing::info!("env0 exited"),
                Err(err) => tracing::error!(error = %format!("{err:#}"), "env0 failed"),
            }
            result
        }
    }
}
