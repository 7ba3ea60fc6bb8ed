pub mod entities;
pub mod migrator;
pub mod repositories;

pub use repositories::SeaOrmRepositoryProvider;

use sea_orm::{Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use migrator::Migrator;

/// `database.url` value that selects the in-memory backend.
pub const MEMORY_URL: &str = "memory";

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database URL (e.g., "sqlite://./energy.db?mode=rwc") or "memory"
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::sqlite("./energy.db")
    }
}

impl DatabaseConfig {
    /// Create config for SQLite
    pub fn sqlite(path: &str) -> Self {
        Self {
            url: format!("sqlite://{}?mode=rwc", path),
        }
    }

    pub fn is_memory(&self) -> bool {
        self.url.eq_ignore_ascii_case(MEMORY_URL)
    }
}

/// Initialize database connection
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    info!(url = %config.url, "Connecting to database");
    let db = Database::connect(&config.url).await?;
    info!("Database connected successfully");
    Ok(db)
}

/// Apply pending migrations.
pub async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    let pending = Migrator::get_pending_migrations(db).await?.len();
    Migrator::up(db, None).await?;
    info!(applied = pending, "Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_url() {
        assert_eq!(DatabaseConfig::sqlite("/tmp/e.db").url, "sqlite:///tmp/e.db?mode=rwc");
        assert!(!DatabaseConfig::default().is_memory());
        assert!(DatabaseConfig { url: "MEMORY".into() }.is_memory());
    }

    #[tokio::test]
    async fn migrations_apply_once() {
        let db = init_database(&DatabaseConfig {
            url: "sqlite::memory:".into(),
        })
        .await
        .unwrap();
        run_migrations(&db).await.unwrap();
        run_migrations(&db).await.unwrap();
        assert!(Migrator::get_pending_migrations(&db).await.unwrap().is_empty());
    }
}
