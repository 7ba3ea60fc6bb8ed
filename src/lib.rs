//! # Energy Advisor
//!
//! Energy usage tracking backend: users, devices and timestamped readings,
//! with aggregate statistics, period comparison and recommendations from an
//! external text generator or a rule-based fallback.
//!
//! ## Architecture
//!
//! - **domain**: entities, repository traits and time windows
//! - **application**: record management, analytics and recommendations
//! - **infrastructure**: SeaORM/SQLite and in-memory storage, OpenAI client
//! - **interfaces**: REST API with Swagger documentation
//! - **server**: runtime wiring and graceful shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

pub use infrastructure::{init_database, DatabaseConfig, InMemoryRepositoryProvider, SeaOrmRepositoryProvider};

pub use interfaces::{create_api_router, AppState};
