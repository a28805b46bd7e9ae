//! TagStore implementation for SQLite
//!
//! Tags are find-or-create and never deleted. The resolver is written so a
//! concurrent first-use race on a new name is absorbed: the losing insert is
//! a no-op and the follow-up read returns the winner's row.

use crate::error::{StoreError, StoreResult};
use crate::member::join_err;
use crate::pool::SqlitePool;
use crate::util::now_rfc3339;
use async_trait::async_trait;
use knowledgeout_core::store::TagStore;
use knowledgeout_core::{Error, Result, Tag};
use rusqlite::{params, Connection, OptionalExtension};

/// SQLite implementation of TagStore.
#[derive(Clone)]
pub struct SqliteTagStore {
    pool: SqlitePool,
}

impl SqliteTagStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagStore for SqliteTagStore {
    async fn resolve(&self, name: &str) -> Result<Tag> {
        let pool = self.pool.clone();
        let name = name.to_string();

        tokio::task::spawn_blocking(move || {
            pool.with_connection(|conn| resolve_tag(conn, &name))
        })
        .await
        .map_err(join_err)?
        .map_err(Into::into)
    }

    async fn find(&self, name: &str) -> Result<Option<Tag>> {
        let pool = self.pool.clone();
        let name = name.to_string();

        tokio::task::spawn_blocking(move || {
            pool.with_connection(|conn| find_tag(conn, &name))
        })
        .await
        .map_err(join_err)?
        .map_err(Into::into)
    }
}

/// Find-or-create by exact name. Callable inside a transaction; the
/// conflict-tolerant insert means two racing first-uses both end up reading
/// the same row.
pub(crate) fn resolve_tag(conn: &Connection, name: &str) -> StoreResult<Tag> {
    if let Some(tag) = find_tag(conn, name)? {
        return Ok(tag);
    }

    conn.execute(
        "INSERT INTO tags (name, created_at) VALUES (?1, ?2)
         ON CONFLICT(name) DO NOTHING",
        params![name, now_rfc3339()],
    )?;

    find_tag(conn, name)?.ok_or_else(|| {
        StoreError::Domain(Error::Storage(format!("tag '{name}' vanished after insert")))
    })
}

/// Replace a question's tag set wholesale: delete the join rows, then
/// insert the deduplicated name list. Runs inside the caller's transaction.
pub(crate) fn set_question_tags(
    conn: &Connection,
    question_id: i64,
    names: &[String],
) -> StoreResult<()> {
    conn.execute(
        "DELETE FROM question_tags WHERE question_id = ?1",
        [question_id],
    )?;

    for name in dedupe(names) {
        let tag = resolve_tag(conn, name)?;
        conn.execute(
            "INSERT INTO question_tags (question_id, tag_id) VALUES (?1, ?2)
             ON CONFLICT(question_id, tag_id) DO NOTHING",
            params![question_id, tag.id],
        )?;
    }

    Ok(())
}

/// Same replacement for an answer's tag set.
pub(crate) fn set_answer_tags(
    conn: &Connection,
    answer_id: i64,
    names: &[String],
) -> StoreResult<()> {
    conn.execute("DELETE FROM answer_tags WHERE answer_id = ?1", [answer_id])?;

    for name in dedupe(names) {
        let tag = resolve_tag(conn, name)?;
        conn.execute(
            "INSERT INTO answer_tags (answer_id, tag_id) VALUES (?1, ?2)
             ON CONFLICT(answer_id, tag_id) DO NOTHING",
            params![answer_id, tag.id],
        )?;
    }

    Ok(())
}

/// First occurrence wins; blank names are dropped.
fn dedupe(names: &[String]) -> Vec<&str> {
    let mut seen = std::collections::HashSet::new();
    names
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .filter(|n| seen.insert(*n))
        .collect()
}

pub(crate) fn find_tag(conn: &Connection, name: &str) -> StoreResult<Option<Tag>> {
    let tag = conn
        .query_row(
            "SELECT id, name FROM tags WHERE name = ?1",
            [name],
            |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )
        .optional()?;

    Ok(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolve_is_idempotent() {
        let store = SqliteTagStore::new(SqlitePool::memory().unwrap());

        let first = store.resolve("react").await.unwrap();
        let second = store.resolve("react").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "react");
    }

    #[tokio::test]
    async fn names_are_case_sensitive_identities() {
        let store = SqliteTagStore::new(SqlitePool::memory().unwrap());

        let lower = store.resolve("mysql").await.unwrap();
        let upper = store.resolve("MySQL").await.unwrap();
        assert_ne!(lower.id, upper.id);
    }

    #[tokio::test]
    async fn find_does_not_create() {
        let store = SqliteTagStore::new(SqlitePool::memory().unwrap());

        assert!(store.find("ghost").await.unwrap().is_none());
        store.resolve("ghost").await.unwrap();
        assert!(store.find("ghost").await.unwrap().is_some());
    }

    #[test]
    fn dedupe_keeps_first_occurrence_and_drops_blanks() {
        let names: Vec<String> = ["react", " ", "jpa", "react", ""]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(dedupe(&names), vec!["react", "jpa"]);
    }
}
