//! SQLite connection pool
//!
//! Builds the shared [`SqlitePool`] from configuration. Foreign keys are
//! enabled on every connection so comment rows cascade with their post and
//! author. File databases run in WAL mode so readers never hold up a commit.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use std::str::FromStr;
use std::time::Duration;

use crate::config::DatabaseConfig;

/// Create a database connection pool based on configuration.
///
/// Accepts either a bare file path (`data/quillpad.db`), a `sqlite:` URL or
/// `:memory:`. The parent directory of a file database is created when missing.
pub async fn create_pool(config: &DatabaseConfig) -> Result<SqlitePool> {
    let url = config.url.trim();
    let memory = is_memory(url);

    if !memory {
        let path = url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
        let path = path.split('?').next().unwrap_or(path);
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory: {:?}", parent)
                })?;
            }
        }
    }

    let connection_url = if memory {
        "sqlite::memory:".to_string()
    } else if url.starts_with("sqlite:") {
        url.to_string()
    } else {
        format!("sqlite:{}", url)
    };

    let mut options = SqliteConnectOptions::from_str(&connection_url)
        .with_context(|| format!("Invalid SQLite database url: {}", url))?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));
    if !memory {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    // Every connection to `:memory:` is its own database, so tests pin a
    // single connection.
    let max_connections = if memory { 1 } else { config.max_connections.max(1) };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to connect to SQLite database: {}", url))?;

    Ok(pool)
}

/// Create a SQLite in-memory database pool for testing
pub async fn create_test_pool() -> Result<SqlitePool> {
    let config = DatabaseConfig {
        url: ":memory:".to_string(),
        max_connections: 1,
    };
    create_pool(&config).await
}

/// Begin a transaction that holds the database write lock from its first
/// statement.
///
/// A plain `BEGIN` only asks for the lock at the first write, and a
/// transaction that has already read cannot take it once another connection
/// has committed. Here concurrent writers queue on the busy timeout instead,
/// and each one starts from the rows the previous one committed.
pub async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    sqlx::query("UPDATE _migrations SET version = version WHERE 0")
        .execute(&mut *tx)
        .await
        .context("Failed to take the database write lock")?;
    Ok(tx)
}

fn is_memory(url: &str) -> bool {
    url == ":memory:" || url.starts_with("sqlite::memory:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_test_pool() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        let one: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&pool)
            .await
            .expect("Ping should succeed");
        assert_eq!(one, 1);
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[tokio::test]
    async fn test_sqlite_nested_directory_creation() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("nested").join("dir").join("test.db");

        let config = DatabaseConfig {
            url: db_path.to_string_lossy().to_string(),
            max_connections: 2,
        };

        let pool = create_pool(&config).await.expect("Failed to create pool");
        sqlx::query("SELECT 1").execute(&pool).await.unwrap();

        assert!(db_path.exists());
        pool.close().await;
    }

    #[tokio::test]
    async fn test_file_database_uses_wal() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = DatabaseConfig {
            url: temp_dir.path().join("wal.db").to_string_lossy().to_string(),
            max_connections: 2,
        };

        let pool = create_pool(&config).await.expect("Failed to create pool");
        let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(mode, "wal");
        pool.close().await;
    }

    #[tokio::test]
    async fn test_open_reader_does_not_block_writer() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = DatabaseConfig {
            url: temp_dir.path().join("readers.db").to_string_lossy().to_string(),
            max_connections: 4,
        };
        let pool = create_pool(&config).await.expect("Failed to create pool");
        crate::db::migrations::run_migrations(&pool).await.unwrap();

        let mut reader = pool.begin().await.unwrap();
        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *reader)
            .await
            .unwrap();
        assert_eq!(users, 0);

        let mut writer = begin_write(&pool).await.unwrap();
        sqlx::query("INSERT INTO tags (name) VALUES ('rust')")
            .execute(&mut *writer)
            .await
            .unwrap();
        let started = std::time::Instant::now();
        writer.commit().await.expect("Commit should not wait on the reader");
        assert!(started.elapsed() < Duration::from_secs(1));

        reader.rollback().await.unwrap();
        pool.close().await;
    }
}
