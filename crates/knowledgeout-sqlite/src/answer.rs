//! AnswerStore implementation for SQLite

use crate::error::StoreResult;
use crate::member::{join_err, require_active};
use crate::pool::SqlitePool;
use crate::tag::set_answer_tags;
use crate::util::{now_rfc3339, parse_ts};
use async_trait::async_trait;
use knowledgeout_core::store::AnswerStore;
use knowledgeout_core::{
    AnswerDraft, AnswerView, Error, ErrorCode, MyAnswer, Result, Role,
};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::collections::HashMap;
use tracing::debug;

/// SQLite implementation of AnswerStore.
#[derive(Clone)]
pub struct SqliteAnswerStore {
    pool: SqlitePool,
}

impl SqliteAnswerStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnswerStore for SqliteAnswerStore {
    async fn create(&self, question_id: i64, author_id: i64, draft: AnswerDraft) -> Result<i64> {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            pool.with_connection_mut(|conn| {
                let tx = conn.transaction()?;

                require_active(&tx, author_id)?;
                require_question(&tx, question_id)?;

                let now = now_rfc3339();
                tx.execute(
                    r#"
                    INSERT INTO answers (question_id, member_id, content, created_at, updated_at)
                    VALUES (?1, ?2, ?3, ?4, ?4)
                    "#,
                    params![question_id, author_id, draft.content, now],
                )?;
                let id = tx.last_insert_rowid();

                set_answer_tags(&tx, id, &draft.tag_names)?;

                tx.commit()?;
                debug!(answer_id = id, question_id, "answer created");
                Ok(id)
            })
        })
        .await
        .map_err(join_err)?
        .map_err(Into::into)
    }

    async fn list_for_question(&self, question_id: i64) -> Result<Vec<AnswerView>> {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            pool.with_connection(|conn| active_answers(conn, question_id))
        })
        .await
        .map_err(join_err)?
        .map_err(Into::into)
    }

    async fn update(
        &self,
        question_id: i64,
        answer_id: i64,
        actor_id: i64,
        draft: AnswerDraft,
    ) -> Result<AnswerView> {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            pool.with_connection_mut(|conn| {
                let tx = conn.transaction()?;

                let actor = require_active(&tx, actor_id)?;
                let (owner_id, parent_id) = answer_refs(&tx, answer_id)?;

                if parent_id != question_id {
                    return Err(Error::Validation(ErrorCode::AnswerQuestionMismatch).into());
                }
                if owner_id != actor.id {
                    return Err(Error::Forbidden(ErrorCode::AccessDenied).into());
                }

                tx.execute(
                    "UPDATE answers SET content = ?1, updated_at = ?2 WHERE id = ?3",
                    params![draft.content, now_rfc3339(), answer_id],
                )?;

                set_answer_tags(&tx, answer_id, &draft.tag_names)?;

                let view = answer_view(&tx, answer_id)?;
                tx.commit()?;
                Ok(view)
            })
        })
        .await
        .map_err(join_err)?
        .map_err(Into::into)
    }

    async fn delete(&self, question_id: i64, answer_id: i64, actor_id: i64) -> Result<()> {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            pool.with_connection_mut(|conn| {
                let tx = conn.transaction()?;

                let actor = require_active(&tx, actor_id)?;
                let (owner_id, parent_id) = answer_refs(&tx, answer_id)?;

                if parent_id != question_id {
                    return Err(Error::Validation(ErrorCode::AnswerQuestionMismatch).into());
                }

                let is_admin = actor.role == Role::Admin;
                if !is_admin && owner_id != actor.id {
                    return Err(Error::Forbidden(ErrorCode::AccessDenied).into());
                }

                tx.execute(
                    "UPDATE answers SET deleted = 1, updated_at = ?1 WHERE id = ?2",
                    params![now_rfc3339(), answer_id],
                )?;

                tx.commit()?;
                debug!(answer_id, "answer soft-deleted");
                Ok(())
            })
        })
        .await
        .map_err(join_err)?
        .map_err(Into::into)
    }

    async fn by_member(&self, member_id: i64) -> Result<Vec<MyAnswer>> {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            pool.with_connection(|conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT a.id, a.question_id, q.title, a.content, a.created_at, a.updated_at
                    FROM answers a
                    JOIN questions q ON q.id = a.question_id
                    WHERE a.member_id = ?1 AND a.deleted = 0
                    ORDER BY a.created_at DESC, a.id DESC
                    "#,
                )?;

                let answers = stmt
                    .query_map([member_id], |row| {
                        let created_at: String = row.get(4)?;
                        let updated_at: String = row.get(5)?;
                        Ok(MyAnswer {
                            id: row.get(0)?,
                            question_id: row.get(1)?,
                            question_title: row.get(2)?,
                            content: row.get(3)?,
                            created_at: parse_ts(&created_at),
                            updated_at: parse_ts(&updated_at),
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;

                Ok(answers)
            })
        })
        .await
        .map_err(join_err)?
        .map_err(Into::into)
    }
}

const ANSWER_SELECT: &str = r#"
SELECT a.id, a.question_id, a.content, a.created_at, a.updated_at, m.id, m.nickname
FROM answers a
JOIN members m ON m.id = a.member_id
"#;

/// Active answers of a question, oldest first. Shared with the question
/// detail read.
pub(crate) fn active_answers(conn: &Connection, question_id: i64) -> StoreResult<Vec<AnswerView>> {
    let sql = format!(
        "{ANSWER_SELECT} WHERE a.question_id = ?1 AND a.deleted = 0
         ORDER BY a.created_at ASC, a.id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut answers = stmt
        .query_map([question_id], row_to_view)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    attach_tags(conn, &mut answers)?;
    Ok(answers)
}

fn answer_view(conn: &Connection, id: i64) -> StoreResult<AnswerView> {
    let sql = format!("{ANSWER_SELECT} WHERE a.id = ?1");
    let mut answers = {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([id], row_to_view)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows
    };
    attach_tags(conn, &mut answers)?;

    answers
        .pop()
        .ok_or_else(|| Error::NotFound(ErrorCode::AnswerNotFound).into())
}

/// (author id, question id) of a non-deleted answer, or NotFound.
fn answer_refs(conn: &Connection, id: i64) -> StoreResult<(i64, i64)> {
    conn.query_row(
        "SELECT member_id, question_id FROM answers WHERE id = ?1 AND deleted = 0",
        [id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()?
    .ok_or_else(|| Error::NotFound(ErrorCode::AnswerNotFound).into())
}

/// A non-deleted question must exist to answer under it.
fn require_question(conn: &Connection, id: i64) -> StoreResult<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM questions WHERE id = ?1 AND deleted = 0)",
        [id],
        |row| row.get(0),
    )?;
    if !exists {
        return Err(Error::NotFound(ErrorCode::QuestionNotFound).into());
    }
    Ok(())
}

fn row_to_view(row: &rusqlite::Row) -> rusqlite::Result<AnswerView> {
    let created_at: String = row.get(3)?;
    let updated_at: String = row.get(4)?;

    Ok(AnswerView {
        id: row.get(0)?,
        question_id: row.get(1)?,
        content: row.get(2)?,
        created_at: parse_ts(&created_at),
        updated_at: parse_ts(&updated_at),
        member_id: row.get(5)?,
        member_nickname: row.get(6)?,
        tag_names: Vec::new(),
    })
}

fn attach_tags(conn: &Connection, answers: &mut [AnswerView]) -> StoreResult<()> {
    if answers.is_empty() {
        return Ok(());
    }

    let placeholders = vec!["?"; answers.len()].join(",");
    let sql = format!(
        "SELECT at.answer_id, t.name FROM answer_tags at
         JOIN tags t ON t.id = at.tag_id
         WHERE at.answer_id IN ({placeholders})
         ORDER BY t.name"
    );

    let ids: Vec<i64> = answers.iter().map(|a| a.id).collect();
    let mut stmt = conn.prepare(&sql)?;
    let mut by_answer: HashMap<i64, Vec<String>> = HashMap::new();
    let rows = stmt.query_map(params_from_iter(ids.iter()), |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
    })?;
    for row in rows {
        let (answer_id, name) = row?;
        by_answer.entry(answer_id).or_default().push(name);
    }

    for answer in answers.iter_mut() {
        if let Some(names) = by_answer.remove(&answer.id) {
            answer.tag_names = names;
        }
    }

    Ok(())
}
