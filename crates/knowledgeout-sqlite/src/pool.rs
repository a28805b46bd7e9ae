//! SQLite connection management
//!
//! A single connection behind a mutex instead of a pooling crate. With WAL
//! mode and one writer this covers the request volumes a community Q&A
//! board sees.

use crate::error::StoreResult;
use crate::schema;
use knowledgeout_config::DatabaseConfig;
use knowledgeout_core::{Error, Result};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::sync::Arc;
use tracing::{debug, info};

/// Thread-safe SQLite connection wrapper.
#[derive(Clone)]
pub struct SqlitePool {
    conn: Arc<Mutex<Connection>>,
    config: DatabaseConfig,
}

impl SqlitePool {
    /// Open the database, configure pragmas and apply migrations.
    pub fn new(config: DatabaseConfig) -> Result<Self> {
        info!(path = %config.path.display(), "opening SQLite database");

        let conn = if config.path.to_str() == Some(":memory:") {
            Connection::open_in_memory().map_err(storage_err)?
        } else {
            if let Some(parent) = config.path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::Storage(format!("failed to create database directory: {e}"))
                })?;
            }
            Connection::open(&config.path).map_err(storage_err)?
        };

        let pool = Self {
            conn: Arc::new(Mutex::new(conn)),
            config,
        };
        pool.initialize()?;

        Ok(pool)
    }

    /// In-memory pool for tests.
    pub fn memory() -> Result<Self> {
        Self::new(DatabaseConfig::memory())
    }

    /// Execute a closure with the connection.
    pub fn with_connection<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// Execute a closure with mutable access, for explicit transactions.
    pub fn with_connection_mut<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection) -> StoreResult<T>,
    {
        let mut conn = self.conn.lock();
        f(&mut conn)
    }

    fn initialize(&self) -> Result<()> {
        self.with_connection(|conn| {
            self.configure_pragmas(conn)?;
            schema::apply_migrations(conn)?;
            info!("SQLite database initialized");
            Ok(())
        })
        .map_err(Into::into)
    }

    fn configure_pragmas(&self, conn: &Connection) -> StoreResult<()> {
        debug!("configuring SQLite pragmas");

        if self.config.wal_mode {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
            conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        }

        if self.config.foreign_keys {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        }

        conn.execute_batch(&format!(
            "PRAGMA busy_timeout = {};",
            self.config.busy_timeout_ms
        ))?;

        conn.execute_batch("PRAGMA temp_store = MEMORY;")?;

        Ok(())
    }
}

fn storage_err(e: rusqlite::Error) -> Error {
    Error::Storage(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_pool_works() {
        let pool = SqlitePool::memory().expect("memory pool");

        pool.with_connection(|conn| {
            let result: i64 = conn.query_row("SELECT 1 + 1", [], |row| row.get(0))?;
            assert_eq!(result, 2);
            Ok(())
        })
        .expect("query");
    }

    #[test]
    fn file_pool_enables_wal() {
        let dir = TempDir::new().unwrap();
        let config = DatabaseConfig {
            path: dir.path().join("test.db"),
            ..DatabaseConfig::default()
        };

        let pool = SqlitePool::new(config).expect("file pool");

        pool.with_connection(|conn| {
            let mode: String = conn.query_row("PRAGMA journal_mode;", [], |row| row.get(0))?;
            assert_eq!(mode.to_lowercase(), "wal");
            Ok(())
        })
        .expect("query");
    }

    #[test]
    fn schema_tables_exist() {
        let pool = SqlitePool::memory().expect("memory pool");

        pool.with_connection(|conn| {
            let tables: Vec<String> = {
                let mut stmt = conn
                    .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.filter_map(std::result::Result::ok).collect()
            };

            for table in [
                "members",
                "categories",
                "tags",
                "questions",
                "answers",
                "question_tags",
                "answer_tags",
                "question_likes",
            ] {
                assert!(tables.contains(&table.to_string()), "missing {table}");
            }

            Ok(())
        })
        .expect("schema check");
    }
}
