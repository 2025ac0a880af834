//! SQLite persistence layer: entity models, DTOs, and repositories.
//!
//! Every read-invariant-then-write operation in the workflow layer runs
//! inside a single transaction obtained from [`DbPool::begin`]; the
//! repositories therefore accept any [`sqlx::SqliteExecutor`] so the same
//! method serves both pool-level reads and transactional writes.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

pub mod models;
pub mod repositories;

/// Shared connection pool type.
pub type DbPool = sqlx::SqlitePool;

/// Create a connection pool with WAL journaling, foreign keys, and a
/// busy timeout suitable for concurrent request handlers.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5))
        .create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}

/// Apply all pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}

/// Cheap connectivity probe used by the health endpoint and at startup.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
