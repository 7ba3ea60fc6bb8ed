//! Infrastructure layer - external concerns

pub mod ai;
pub mod database;
pub mod storage;

pub use ai::OpenAiClient;
pub use database::{init_database, run_migrations, DatabaseConfig, SeaOrmRepositoryProvider};
pub use storage::InMemoryRepositoryProvider;
