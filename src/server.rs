//! Server runtime
//!
//! [`ServerHandle`] owns the whole lifecycle: record store, migrations,
//! services, the REST API and graceful shutdown. The CLI binary and
//! `main.rs` both start the service through it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sea_orm::DatabaseConnection;
use tracing::{error, info, warn};

use crate::application::{AnalyticsService, RecommendationClient, RecommendationService, RecordService};
use crate::config::{AppConfig, LoggingConfig};
use crate::domain::RepositoryProvider;
use crate::infrastructure::{
    init_database, run_migrations, InMemoryRepositoryProvider, OpenAiClient,
    SeaOrmRepositoryProvider,
};
use crate::interfaces::{create_api_router, AppState};
use crate::shared::{listen_for_shutdown_signals, ShutdownSignal};

/// Options for starting the service.
pub struct ServerOptions {
    pub config: AppConfig,
    /// Run database migrations on startup. Ignored for the memory backend.
    pub auto_migrate: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
        }
    }
}

/// Wired application state plus the connection backing it, if any.
pub struct Runtime {
    pub state: AppState,
    pub db: Option<DatabaseConnection>,
}

/// Connect the record store and build every service from `config`.
pub async fn build_runtime(
    config: &AppConfig,
    auto_migrate: bool,
) -> Result<Runtime, Box<dyn std::error::Error>> {
    let db_config = config.database.connection();

    let (repos, db): (Arc<dyn RepositoryProvider>, Option<DatabaseConnection>) =
        if db_config.is_memory() {
            warn!("Using the in-memory record store; data is lost on exit");
            (Arc::new(InMemoryRepositoryProvider::new()), None)
        } else {
            let db = init_database(&db_config).await?;
            if auto_migrate {
                info!("Running database migrations...");
                run_migrations(&db).await?;
            }
            (Arc::new(SeaOrmRepositoryProvider::new(db.clone())), Some(db))
        };

    let generator = OpenAiClient::new(
        &config.ai.base_url,
        config.ai.api_key.clone(),
        config.ai.timeout(),
    )?;
    let client = RecommendationClient::new(Arc::new(generator), config.ai.client_settings());
    if client.is_configured() {
        info!(model = %client.model(), "Text generation enabled");
    } else {
        info!("No AI API key configured; recommendations use the rule-based fallback");
    }

    let records = Arc::new(RecordService::new(repos.clone(), config.billing.pricing()));
    let analytics = Arc::new(AnalyticsService::new(
        repos.clone(),
        config.analytics.default_window_days,
    ));
    let recommendations = Arc::new(RecommendationService::new(
        analytics.clone(),
        Arc::new(client),
    ));

    Ok(Runtime {
        state: AppState {
            repos,
            records,
            analytics,
            recommendations,
            started_at: Arc::new(Instant::now()),
        },
        db,
    })
}

/// Handle to a running service.
pub struct ServerHandle {
    pub repos: Arc<dyn RepositoryProvider>,
    /// The configuration the server was started with.
    pub config: AppConfig,
    /// Address the API is listening on.
    pub local_addr: SocketAddr,

    db: Option<DatabaseConnection>,
    shutdown: ShutdownSignal,
    api_task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let config = opts.config;
        info!("Starting Energy Advisor...");

        let runtime = build_runtime(&config, opts.auto_migrate).await?;
        let repos = runtime.state.repos.clone();
        let router = create_api_router(runtime.state);

        let listener = tokio::net::TcpListener::bind(config.address()).await?;
        let local_addr = listener.local_addr()?;
        info!("REST API listening on http://{}", local_addr);
        info!("Swagger UI available at http://{}/docs/", local_addr);

        let shutdown = ShutdownSignal::new();
        let api_shutdown = shutdown.clone();
        let api_server = axum::serve(listener, router).with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("REST API received shutdown signal");
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("REST API server error: {}", e);
            }
        });

        Ok(Self {
            repos,
            config,
            local_addr,
            db: runtime.db,
            shutdown,
            api_task,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Trigger shutdown on SIGTERM or SIGINT.
    pub fn install_signal_handler(&self) {
        tokio::spawn(listen_for_shutdown_signals(self.shutdown.clone()));
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.trigger();
    }

    /// Wait for the API to drain, at most `server.shutdown_timeout` seconds
    /// once shutdown has been triggered.
    pub async fn wait(self) {
        self.shutdown.wait().await;
        let grace = Duration::from_secs(self.config.server.shutdown_timeout);
        let mut api_task = self.api_task;

        match tokio::time::timeout(grace, &mut api_task).await {
            Ok(Ok(())) => info!("REST API server stopped"),
            Ok(Err(e)) => error!("REST API server task panicked: {}", e),
            Err(_) => {
                warn!(timeout_secs = grace.as_secs(), "Shutdown timed out; aborting in-flight requests");
                api_task.abort();
            }
        }

        if let Some(db) = self.db {
            match db.close().await {
                Ok(()) => info!("Database connection closed"),
                Err(e) => warn!("Error closing database connection: {}", e),
            }
        }

        info!("Energy Advisor shutdown complete");
    }

    pub async fn shutdown(self) {
        info!("Shutting down Energy Advisor...");
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

/// Initialize tracing from the logging config. `RUST_LOG` wins over
/// `logging.level` when set.
pub fn init_tracing(config: &LoggingConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    let result = match config.format.to_lowercase().as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init(),
    };
    if let Err(e) = result {
        eprintln!("tracing already initialized: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.server.host = "127.0.0.1".into();
        config.server.port = 0;
        config.server.shutdown_timeout = 5;
        config.database.url = "memory".into();
        config
    }

    #[tokio::test]
    async fn memory_runtime_has_no_connection() {
        let runtime = build_runtime(&memory_config(), true).await.unwrap();
        assert!(runtime.db.is_none());
        assert_eq!(runtime.state.repos.backend(), "memory");
        assert!(!runtime.state.recommendations.status().configured);
    }

    #[tokio::test]
    async fn sqlite_runtime_migrates() {
        let mut config = memory_config();
        config.database.url = "sqlite::memory:".into();
        let runtime = build_runtime(&config, true).await.unwrap();
        assert!(runtime.db.is_some());
        runtime.state.repos.ping().await.unwrap();
    }

    #[tokio::test]
    async fn start_and_shutdown() {
        let handle = ServerHandle::start(ServerOptions {
            config: memory_config(),
            auto_migrate: false,
        })
        .await
        .unwrap();
        assert_ne!(handle.local_addr.port(), 0);
        assert!(handle.is_running());

        tokio::time::timeout(Duration::from_secs(5), handle.shutdown())
            .await
            .expect("shutdown completes");
    }
}
