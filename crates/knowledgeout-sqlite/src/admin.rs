//! Admin dashboard aggregation
//!
//! Read-only rollups recomputed from the store on every call. The top lists
//! are bounded to a trailing window and exclude soft-deleted questions; the
//! all-time counts are cumulative and keep them.

use crate::error::StoreResult;
use crate::member::join_err;
use crate::pool::SqlitePool;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use knowledgeout_core::store::AdminStore;
use knowledgeout_core::{Dashboard, ItemCount, Result};
use rusqlite::Connection;
use std::collections::BTreeMap;

const TOP_LIST_LIMIT: u32 = 5;
const TAG_COUNT_LIMIT: u32 = 10;

/// SQLite implementation of AdminStore.
#[derive(Clone)]
pub struct SqliteAdminStore {
    pool: SqlitePool,
}

impl SqliteAdminStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminStore for SqliteAdminStore {
    async fn dashboard(&self, window_days: u32) -> Result<Dashboard> {
        let pool = self.pool.clone();
        let cutoff = (Utc::now() - Duration::days(i64::from(window_days))).to_rfc3339();

        tokio::task::spawn_blocking(move || {
            pool.with_connection(|conn| {
                Ok(Dashboard {
                    top_tags: top_tags(conn, &cutoff)?,
                    top_categories: top_categories(conn, &cutoff)?,
                    category_counts: category_counts(conn)?,
                    tag_counts: tag_counts(conn)?,
                })
            })
        })
        .await
        .map_err(join_err)?
        .map_err(Into::into)
    }
}

fn top_tags(conn: &Connection, cutoff: &str) -> StoreResult<Vec<ItemCount>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT t.name, COUNT(*) AS n
        FROM questions q
        JOIN question_tags qt ON qt.question_id = q.id
        JOIN tags t ON t.id = qt.tag_id
        WHERE q.deleted = 0 AND q.created_at >= ?1
        GROUP BY t.name
        ORDER BY n DESC, t.name ASC
        LIMIT ?2
        "#,
    )?;

    collect_counts(&mut stmt, cutoff, TOP_LIST_LIMIT)
}

fn top_categories(conn: &Connection, cutoff: &str) -> StoreResult<Vec<ItemCount>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT c.name, COUNT(*) AS n
        FROM questions q
        JOIN categories c ON c.id = q.category_id
        WHERE q.deleted = 0 AND q.created_at >= ?1
        GROUP BY c.name
        ORDER BY n DESC, c.name ASC
        LIMIT ?2
        "#,
    )?;

    collect_counts(&mut stmt, cutoff, TOP_LIST_LIMIT)
}

fn category_counts(conn: &Connection) -> StoreResult<BTreeMap<String, i64>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT c.name, COUNT(*)
        FROM questions q
        JOIN categories c ON c.id = q.category_id
        GROUP BY c.name
        "#,
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut counts = BTreeMap::new();
    for row in rows {
        let (name, count) = row?;
        counts.insert(name, count);
    }

    Ok(counts)
}

fn tag_counts(conn: &Connection) -> StoreResult<Vec<ItemCount>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT t.name, COUNT(*) AS n
        FROM questions q
        JOIN question_tags qt ON qt.question_id = q.id
        JOIN tags t ON t.id = qt.tag_id
        GROUP BY t.name
        ORDER BY n DESC, t.name ASC
        LIMIT ?1
        "#,
    )?;

    let rows = stmt.query_map([TAG_COUNT_LIMIT], |row| {
        Ok(ItemCount {
            name: row.get(0)?,
            count: row.get(1)?,
        })
    })?;

    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn collect_counts(
    stmt: &mut rusqlite::Statement<'_>,
    cutoff: &str,
    limit: u32,
) -> StoreResult<Vec<ItemCount>> {
    let rows = stmt.query_map(rusqlite::params![cutoff, limit], |row| {
        Ok(ItemCount {
            name: row.get(0)?,
            count: row.get(1)?,
        })
    })?;

    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}
