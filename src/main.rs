//! Energy Advisor server
//!
//! Reads `~/.config/energy-advisor/config.toml` (or `$ENERGY_ADVISOR_CONFIG`)
//! and serves until SIGINT/SIGTERM. See the `energy-advisor-service` binary
//! for command-line overrides.

use energy_advisor::server::{init_tracing, ServerHandle, ServerOptions};
use energy_advisor::{default_config_path, AppConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = default_config_path();
    let config = AppConfig::load(&config_path)?;
    init_tracing(&config.logging);
    info!("Configuration loaded from {}", config_path.display());

    let auto_migrate = config.database.run_migrations;
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
