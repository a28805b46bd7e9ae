//! CategoryStore implementation for SQLite

use crate::error::StoreResult;
use crate::member::join_err;
use crate::pool::SqlitePool;
use async_trait::async_trait;
use knowledgeout_core::store::CategoryStore;
use knowledgeout_core::{Category, Error, ErrorCode, Result};
use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

/// SQLite implementation of CategoryStore.
#[derive(Clone)]
pub struct SqliteCategoryStore {
    pool: SqlitePool,
}

impl SqliteCategoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryStore for SqliteCategoryStore {
    async fn list(&self) -> Result<Vec<Category>> {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            pool.with_connection(|conn| {
                let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY id")?;
                let categories = stmt
                    .query_map([], row_to_category)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;

                Ok(categories)
            })
        })
        .await
        .map_err(join_err)?
        .map_err(Into::into)
    }

    async fn get(&self, id: i64) -> Result<Category> {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            pool.with_connection(|conn| get_category(conn, id))
        })
        .await
        .map_err(join_err)?
        .map_err(Into::into)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Category>> {
        let pool = self.pool.clone();
        let name = name.to_string();

        tokio::task::spawn_blocking(move || {
            pool.with_connection(|conn| {
                let category = conn
                    .query_row(
                        "SELECT id, name FROM categories WHERE name = ?1",
                        [&name],
                        row_to_category,
                    )
                    .optional()?;

                Ok(category)
            })
        })
        .await
        .map_err(join_err)?
        .map_err(Into::into)
    }

    async fn ensure(&self, names: &[String]) -> Result<()> {
        let pool = self.pool.clone();
        let names = names.to_vec();

        tokio::task::spawn_blocking(move || {
            pool.with_connection(|conn| {
                for name in &names {
                    conn.execute(
                        "INSERT INTO categories (name) VALUES (?1)
                         ON CONFLICT(name) DO NOTHING",
                        [name],
                    )?;
                }

                debug!(count = names.len(), "category vocabulary ensured");
                Ok(())
            })
        })
        .await
        .map_err(join_err)?
        .map_err(Into::into)
    }
}

/// Load a category or fail NotFound.
pub(crate) fn get_category(conn: &Connection, id: i64) -> StoreResult<Category> {
    conn.query_row(
        "SELECT id, name FROM categories WHERE id = ?1",
        [id],
        row_to_category,
    )
    .optional()?
    .ok_or_else(|| Error::NotFound(ErrorCode::CategoryNotFound).into())
}

fn row_to_category(row: &rusqlite::Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}
