//! Energy Advisor CLI server
//!
//! ```sh
//! # Default config (~/.config/energy-advisor/config.toml)
//! energy-advisor-service
//!
//! # Custom config, port and log level
//! energy-advisor-service --config /etc/energy-advisor/config.toml --port 8080 -l debug
//!
//! # Validate config without starting
//! energy-advisor-service --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use energy_advisor::config::AppConfig;
use energy_advisor::server::{init_tracing, ServerHandle, ServerOptions};

/// Energy Advisor: energy usage tracking and recommendations.
#[derive(Parser, Debug)]
#[command(
    name = "energy-advisor-service",
    version,
    about = "Energy usage tracking API with statistics and recommendations",
    long_about = "Energy Advisor: REST API for users, devices and energy readings, \
                  with statistics, period comparison and recommendations.\n\n\
                  Default config: ~/.config/energy-advisor/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "ENERGY_ADVISOR_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .unwrap_or_else(energy_advisor::default_config_path);

    let mut config = match AppConfig::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) if cli.check => {
            eprintln!("Configuration is invalid: {}", e);
            std::process::exit(1);
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new("info"))
                .init();
            error!("Failed to load config from {}: {}", config_path.display(), e);
            return Err(e.into());
        }
    };

    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }

    if cli.check {
        println!("Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   API address : {}", config.address());
        println!("   Database    : {}", config.database.url);
        println!("   Log level   : {}", config.logging.level);
        println!(
            "   AI          : {}",
            if config.ai.has_api_key() {
                config.ai.model.as_str()
            } else {
                "fallback only (no API key)"
            }
        );
        return Ok(());
    }

    init_tracing(&config.logging);
    info!("Configuration loaded from {}", config_path.display());
    if cli.port.is_some() || cli.log_level.is_some() {
        info!(port = ?cli.port, log_level = ?cli.log_level, "CLI overrides applied");
    }

    let auto_migrate = config.database.run_migrations && !cli.no_migrate;
    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate,
    })
    .await?;

    handle.install_signal_handler();
    info!("Press Ctrl+C to shut down gracefully.");

    handle.wait().await;
    Ok(())
}
