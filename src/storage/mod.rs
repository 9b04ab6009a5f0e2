//! Storage: connection pool, report tables and transaction helpers.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{error, info};

use crate::config::StorageConfig;
use crate::error::Result;

pub mod schema;

/// Path value selecting an in-memory database.
pub const IN_MEMORY_PATH: &str = ":memory:";

/// Open the database described by `config` and create the report tables.
///
/// File databases are created (with their parent directory) if missing.
/// An in-memory database is pinned to a single connection, since every
/// SQLite in-memory connection is a separate database.
pub async fn init_storage(config: &StorageConfig) -> std::result::Result<SqlitePool, Box<dyn std::error::Error>> {
    info!(path = %config.path, "Storage: sqlite");

    let pool = if config.path == IN_MEMORY_PATH {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?
    } else {
        if let Some(parent) = std::path::Path::new(&config.path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect(&format!("sqlite:{}?mode=rwc", config.path))
            .await?
    };

    create_report_tables(&pool).await?;
    Ok(pool)
}

/// Create the detail and summary tables if they do not exist.
pub async fn create_report_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(&schema::create_detailed_report_table())
        .execute(pool)
        .await?;
    sqlx::query(&schema::create_summary_report_table())
        .execute(pool)
        .await?;
    info!("Report tables initialized");
    Ok(())
}

/// Start a write transaction on `conn`.
///
/// BEGIN IMMEDIATE acquires the write lock upfront, so a second writer waits
/// here instead of failing when it tries to upgrade a DEFERRED transaction.
pub async fn begin_immediate(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
    Ok(())
}

/// Commit on success, roll back on failure, and hand the result back.
///
/// A failed COMMIT is rolled back too, so the connection never returns to the
/// pool with an open transaction.
pub async fn finish_transaction<T>(conn: &mut SqliteConnection, result: Result<T>) -> Result<T> {
    match result {
        Ok(value) => match sqlx::query("COMMIT").execute(&mut *conn).await {
            Ok(_) => Ok(value),
            Err(e) => {
                error!(error = %e, "Commit failed, rolling back report transaction");
                rollback(conn).await;
                Err(e.into())
            }
        },
        Err(e) => {
            error!(error = %e, "Rolling back report transaction");
            rollback(conn).await;
            Err(e)
        }
    }
}

async fn rollback(conn: &mut SqliteConnection) {
    if let Err(e) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
        error!(error = %e, "Rollback failed");
    }
}
