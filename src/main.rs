//! Fieldlink server
//!
//! Run with: cargo run -- serve
//!
//! # Configuration
//!
//! A TOML file given with `--config`, otherwise the first of
//! `$XDG_CONFIG/fieldlink/config.toml`, `/etc/fieldlink/config.toml` and
//! `./config.toml`. Environment variables override file values, see
//! `fieldlink config` for the list. `RUST_LOG` overrides the log level.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use fieldlink::api::{serve, AppState};
use fieldlink::config::{generate_default_config, Config};
use fieldlink::telemetry;

#[derive(Parser)]
#[command(name = "fieldlink")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "MQTT over WebSocket gateway for field devices")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the gateway (default)
    Serve {
        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve {
        config: None,
        host: None,
        port: None,
    }) {
        Commands::Serve { config, host, port } => run_server(config, host, port).await,
        Commands::Config { output } => write_config(output),
    }
}

async fn run_server(
    config_path: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    // a file that exists but does not parse stops startup
    let mut config = match &config_path {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default()?,
    };

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    telemetry::init_tracing(&config.logging).context("Failed to install tracing subscriber")?;

    tracing::info!("Starting Fieldlink gateway v{}", env!("CARGO_PKG_VERSION"));
    match config_path.or_else(Config::locate_default) {
        Some(path) => tracing::info!(path = ?path, "Loaded config"),
        None => tracing::info!("Using default config with environment overrides"),
    }
    config.validate()?;
    tracing::info!(
        transport_path = %config.broker.transport_path,
        status_topic = %config.broker.status_topic,
        command_topic = %config.broker.command_topic,
        "Broker configured"
    );

    let state = AppState::with_broker(
        config.api_config(),
        config.router_config(),
        config.session_config(),
    );
    let event_logger = telemetry::spawn_event_logger(state.events());

    serve(state).await?;

    event_logger.abort();
    tracing::info!("Fieldlink gateway stopped");

    Ok(())
}

fn write_config(output: Option<PathBuf>) -> anyhow::Result<()> {
    let template = generate_default_config();

    match output {
        Some(path) => {
            std::fs::write(&path, template)
                .with_context(|| format!("Failed to write config to {}", path.display()))?;
            println!("Config written to {}", path.display());
        }
        None => print!("{}", template),
    }

    Ok(())
}
