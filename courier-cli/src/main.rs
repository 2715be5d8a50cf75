//! Courier CLI

mod demo;

use anyhow::Result;
use clap::{Parser, Subcommand};
use courier_config::{load_config, Config, LogFormat, LoggingConfig};
use courier_runtime::{ServerBuilder, SignalHandler};
use courier_session::InMemorySessionStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "courier")]
#[command(about = "Courier demo server", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the demo handlers
    Serve {
        /// Path to configuration file (defaults apply when omitted)
        #[arg(short, long, env = "COURIER_CONFIG")]
        config: Option<PathBuf>,

        /// Log level, overrides the configuration file
        #[arg(short, long)]
        log_level: Option<String>,
    },

    /// Validate configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long, default_value = "courier.yaml")]
        config: PathBuf,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, log_level } => {
            let config = match &config {
                Some(path) => load_config(path)?,
                None => Config::default(),
            };

            let mut logging = config.logging.clone();
            if let Some(level) = log_level {
                logging.level = level;
            }
            init_tracing(&logging)?;

            tracing::info!(
                listen = %config.server.listen,
                threshold = config.compression.threshold,
                session_ttl = ?config.session.ttl,
                "Configuration loaded"
            );

            let sessions = Arc::new(InMemorySessionStore::with_cleanup(Duration::from_secs(60)));
            let server = ServerBuilder::new()
                .config(config)
                .router(demo::router())
                .sessions(sessions)
                .build()?;

            let shutdown_signal = server.shutdown_signal();
            tokio::spawn(async move {
                let handler = SignalHandler::new(shutdown_signal);
                handler.run().await;
            });

            server.run().await?;
            Ok(())
        }

        Commands::Validate { config } => {
            tracing_subscriber::fmt().with_target(false).init();

            tracing::info!("Validating configuration: {}", config.display());

            match load_config(&config) {
                Ok(cfg) => {
                    tracing::info!("✓ Configuration is valid");
                    tracing::info!("  Listen: {}", cfg.server.listen);
                    tracing::info!(
                        "  Compression: {} ({} bytes, {})",
                        cfg.compression.enabled,
                        cfg.compression.threshold,
                        cfg.compression.algorithm
                    );
                    tracing::info!("  Session cookie: {}", cfg.session.cookie_name);
                    Ok(())
                }
                Err(e) => {
                    tracing::error!("✗ Configuration validation failed: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Version => {
            println!("Courier");
            println!("Version: {}", env!("CARGO_PKG_VERSION"));
            println!("Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
            Ok(())
        }
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&logging.level))?;

    let registry = tracing_subscriber::registry().with(filter);
    match logging.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .init(),
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_level(true),
            )
            .init(),
    }

    Ok(())
}
