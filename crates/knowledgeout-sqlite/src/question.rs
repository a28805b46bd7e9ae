//! QuestionStore implementation for SQLite
//!
//! Multi-step writes (tag-set replacement, the admin delete cascade, the
//! view-count bump before a read) all run inside one transaction.

use crate::answer;
use crate::category::get_category;
use crate::error::StoreResult;
use crate::member::{join_err, require_active};
use crate::pool::SqlitePool;
use crate::search::{compose, order_by};
use crate::tag::set_question_tags;
use crate::util::{now_rfc3339, parse_ts};
use async_trait::async_trait;
use knowledgeout_core::store::QuestionStore;
use knowledgeout_core::{
    Error, ErrorCode, Page, PageRequest, QuestionCounts, QuestionDetail, QuestionDraft,
    QuestionFilter, QuestionSummary, Result, Role, StatusFilter,
};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, ToSql};
use std::collections::HashMap;
use tracing::debug;

/// SQLite implementation of QuestionStore.
#[derive(Clone)]
pub struct SqliteQuestionStore {
    pool: SqlitePool,
}

impl SqliteQuestionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuestionStore for SqliteQuestionStore {
    async fn create(&self, author_id: i64, draft: QuestionDraft) -> Result<i64> {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            pool.with_connection_mut(|conn| {
                let tx = conn.transaction()?;

                require_active(&tx, author_id)?;
                get_category(&tx, draft.category_id)?;

                let now = now_rfc3339();
                tx.execute(
                    r#"
                    INSERT INTO questions (member_id, category_id, title, content, created_at, updated_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                    "#,
                    params![author_id, draft.category_id, draft.title, draft.content, now],
                )?;
                let id = tx.last_insert_rowid();

                set_question_tags(&tx, id, &draft.tag_names)?;

                tx.commit()?;
                debug!(question_id = id, "question created");
                Ok(id)
            })
        })
        .await
        .map_err(join_err)?
        .map_err(Into::into)
    }

    async fn fetch(&self, id: i64) -> Result<QuestionDetail> {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            pool.with_connection_mut(|conn| {
                let tx = conn.transaction()?;

                // Relative increment first so the read below sees the new
                // value; a zero row count doubles as the existence check.
                let bumped = tx.execute(
                    "UPDATE questions SET view_count = view_count + 1
                     WHERE id = ?1 AND deleted = 0",
                    [id],
                )?;
                if bumped == 0 {
                    return Err(Error::NotFound(ErrorCode::QuestionNotFound).into());
                }

                let detail = load_detail(&tx, id)?;
                tx.commit()?;
                Ok(detail)
            })
        })
        .await
        .map_err(join_err)?
        .map_err(Into::into)
    }

    async fn update(&self, id: i64, actor_id: i64, draft: QuestionDraft) -> Result<QuestionDetail> {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            pool.with_connection_mut(|conn| {
                let tx = conn.transaction()?;

                let actor = require_active(&tx, actor_id)?;
                let author_id = question_author(&tx, id)?;
                if author_id != actor.id {
                    return Err(Error::Forbidden(ErrorCode::AccessDenied).into());
                }

                get_category(&tx, draft.category_id)?;

                tx.execute(
                    "UPDATE questions SET title = ?1, content = ?2, category_id = ?3, updated_at = ?4
                     WHERE id = ?5",
                    params![draft.title, draft.content, draft.category_id, now_rfc3339(), id],
                )?;

                set_question_tags(&tx, id, &draft.tag_names)?;

                let detail = load_detail(&tx, id)?;
                tx.commit()?;
                Ok(detail)
            })
        })
        .await
        .map_err(join_err)?
        .map_err(Into::into)
    }

    async fn delete(&self, id: i64, actor_id: i64) -> Result<()> {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            pool.with_connection_mut(|conn| {
                let tx = conn.transaction()?;

                let actor = require_active(&tx, actor_id)?;
                let author_id = question_author(&tx, id)?;

                let is_admin = actor.role == Role::Admin;
                if !is_admin && author_id != actor.id {
                    return Err(Error::Forbidden(ErrorCode::AccessDenied).into());
                }

                if is_admin {
                    // Cascade: retire every active answer with the question
                    let retired = tx.execute(
                        "UPDATE answers SET deleted = 1, updated_at = ?1
                         WHERE question_id = ?2 AND deleted = 0",
                        params![now_rfc3339(), id],
                    )?;
                    if retired > 0 {
                        debug!(question_id = id, retired, "admin delete cascaded to answers");
                    }
                } else {
                    let active_answers: i64 = tx.query_row(
                        "SELECT COUNT(*) FROM answers WHERE question_id = ?1 AND deleted = 0",
                        [id],
                        |row| row.get(0),
                    )?;
                    if active_answers > 0 {
                        return Err(
                            Error::Conflict(ErrorCode::QuestionHasActiveAnswers).into()
                        );
                    }
                }

                tx.execute(
                    "UPDATE questions SET deleted = 1, updated_at = ?1 WHERE id = ?2",
                    params![now_rfc3339(), id],
                )?;

                tx.commit()?;
                debug!(question_id = id, "question soft-deleted");
                Ok(())
            })
        })
        .await
        .map_err(join_err)?
        .map_err(Into::into)
    }

    async fn search(
        &self,
        page: PageRequest,
        filter: QuestionFilter,
    ) -> Result<Page<QuestionSummary>> {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            pool.with_connection(|conn| {
                let where_sql = compose(&filter).where_sql();

                let total: i64 = {
                    let sql = format!("SELECT COUNT(*) FROM questions q WHERE {where_sql}");
                    let comp = compose(&filter);
                    conn.query_row(
                        &sql,
                        params_from_iter(bind(&comp.into_params())),
                        |row| row.get(0),
                    )?
                };

                let sql = format!(
                    "{SUMMARY_SELECT} WHERE {where_sql} ORDER BY {} LIMIT ? OFFSET ?",
                    order_by(page.sort)
                );
                let mut query_params = compose(&filter).into_params();
                query_params.push(Box::new(i64::from(page.size)));
                query_params.push(Box::new(page.offset() as i64));

                let summaries = query_summaries(conn, &sql, &query_params)?;

                Ok(Page::new(summaries, &page, total as u64))
            })
        })
        .await
        .map_err(join_err)?
        .map_err(Into::into)
    }

    async fn counts(
        &self,
        category: Option<&str>,
        search: Option<&str>,
    ) -> Result<QuestionCounts> {
        let pool = self.pool.clone();
        let category = category.map(str::to_string);
        let search = search.map(str::to_string);

        tokio::task::spawn_blocking(move || {
            pool.with_connection(|conn| {
                let count_for = |status: StatusFilter| -> StoreResult<u64> {
                    let filter = QuestionFilter {
                        category: category.clone(),
                        tag: None,
                        status,
                        search: search.clone(),
                    };
                    let comp = compose(&filter);
                    let sql = format!("SELECT COUNT(*) FROM questions q WHERE {}", comp.where_sql());
                    let n: i64 = conn.query_row(
                        &sql,
                        params_from_iter(bind(&comp.into_params())),
                        |row| row.get(0),
                    )?;
                    Ok(n as u64)
                };

                Ok(QuestionCounts {
                    total: count_for(StatusFilter::All)?,
                    pending_count: count_for(StatusFilter::Waiting)?,
                    answered_count: count_for(StatusFilter::Answered)?,
                })
            })
        })
        .await
        .map_err(join_err)?
        .map_err(Into::into)
    }

    async fn by_member(&self, member_id: i64) -> Result<Vec<QuestionSummary>> {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            pool.with_connection(|conn| {
                let sql = format!(
                    "{SUMMARY_SELECT} WHERE q.member_id = ?1 AND q.deleted = 0
                     ORDER BY q.created_at DESC, q.id DESC"
                );
                let mut stmt = conn.prepare(&sql)?;
                let mut summaries = stmt
                    .query_map([member_id], row_to_summary)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                attach_tags(conn, &mut summaries)?;
                Ok(summaries)
            })
        })
        .await
        .map_err(join_err)?
        .map_err(Into::into)
    }

    async fn liked_by_member(&self, member_id: i64) -> Result<Vec<QuestionSummary>> {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            pool.with_connection(|conn| {
                let sql = format!(
                    "{SUMMARY_SELECT}
                     JOIN question_likes ql ON ql.question_id = q.id
                     WHERE ql.member_id = ?1 AND q.deleted = 0
                     ORDER BY ql.created_at DESC, ql.id DESC"
                );
                let mut stmt = conn.prepare(&sql)?;
                let mut summaries = stmt
                    .query_map([member_id], row_to_summary)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                attach_tags(conn, &mut summaries)?;
                Ok(summaries)
            })
        })
        .await
        .map_err(join_err)?
        .map_err(Into::into)
    }

    async fn toggle_like(&self, id: i64, member_id: i64) -> Result<i64> {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            pool.with_connection_mut(|conn| {
                let tx = conn.transaction()?;

                require_active(&tx, member_id)?;
                question_author(&tx, id)?;

                let removed = tx.execute(
                    "DELETE FROM question_likes WHERE member_id = ?1 AND question_id = ?2",
                    params![member_id, id],
                )?;
                if removed == 0 {
                    // A losing concurrent insert lands on the conflict arm
                    // and simply stays "already liked"
                    tx.execute(
                        "INSERT INTO question_likes (member_id, question_id, created_at)
                         VALUES (?1, ?2, ?3)
                         ON CONFLICT(member_id, question_id) DO NOTHING",
                        params![member_id, id, now_rfc3339()],
                    )?;
                }

                let count: i64 = tx.query_row(
                    "SELECT COUNT(*) FROM question_likes WHERE question_id = ?1",
                    [id],
                    |row| row.get(0),
                )?;

                tx.commit()?;
                Ok(count)
            })
        })
        .await
        .map_err(join_err)?
        .map_err(Into::into)
    }
}

/// Shared projection select. Counts are derived per row: answers from the
/// active set, likes from the ledger.
const SUMMARY_SELECT: &str = r#"
SELECT q.id, q.title, q.content, q.view_count, q.created_at, q.updated_at,
       m.id, m.nickname, c.id, c.name,
       (SELECT COUNT(*) FROM answers a WHERE a.question_id = q.id AND a.deleted = 0),
       (SELECT COUNT(*) FROM question_likes l WHERE l.question_id = q.id)
FROM questions q
JOIN members m ON m.id = q.member_id
JOIN categories c ON c.id = q.category_id
"#;

fn row_to_summary(row: &rusqlite::Row) -> rusqlite::Result<QuestionSummary> {
    let created_at: String = row.get(4)?;
    let updated_at: String = row.get(5)?;

    Ok(QuestionSummary {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        view_count: row.get(3)?,
        created_at: parse_ts(&created_at),
        updated_at: parse_ts(&updated_at),
        member_id: row.get(6)?,
        member_nickname: row.get(7)?,
        category_id: row.get(8)?,
        category_name: row.get(9)?,
        answer_count: row.get(10)?,
        like_count: row.get(11)?,
        tag_names: Vec::new(),
    })
}

fn bind(params: &[Box<dyn ToSql>]) -> impl Iterator<Item = &dyn ToSql> {
    params.iter().map(|p| p.as_ref())
}

fn query_summaries(
    conn: &Connection,
    sql: &str,
    params: &[Box<dyn ToSql>],
) -> StoreResult<Vec<QuestionSummary>> {
    let mut stmt = conn.prepare(sql)?;
    let mut summaries = stmt
        .query_map(params_from_iter(bind(params)), row_to_summary)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    attach_tags(conn, &mut summaries)?;
    Ok(summaries)
}

/// Fill in tag names for a batch of summaries with one query.
fn attach_tags(conn: &Connection, summaries: &mut [QuestionSummary]) -> StoreResult<()> {
    if summaries.is_empty() {
        return Ok(());
    }

    let placeholders = vec!["?"; summaries.len()].join(",");
    let sql = format!(
        "SELECT qt.question_id, t.name FROM question_tags qt
         JOIN tags t ON t.id = qt.tag_id
         WHERE qt.question_id IN ({placeholders})
         ORDER BY t.name"
    );

    let ids: Vec<i64> = summaries.iter().map(|s| s.id).collect();
    let mut stmt = conn.prepare(&sql)?;
    let mut by_question: HashMap<i64, Vec<String>> = HashMap::new();
    let rows = stmt.query_map(params_from_iter(ids.iter()), |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
    })?;
    for row in rows {
        let (question_id, name) = row?;
        by_question.entry(question_id).or_default().push(name);
    }

    for summary in summaries.iter_mut() {
        if let Some(names) = by_question.remove(&summary.id) {
            summary.tag_names = names;
        }
    }

    Ok(())
}

/// The author id of a non-deleted question, or NotFound.
fn question_author(conn: &Connection, id: i64) -> StoreResult<i64> {
    conn.query_row(
        "SELECT member_id FROM questions WHERE id = ?1 AND deleted = 0",
        [id],
        |row| row.get(0),
    )
    .optional()?
    .ok_or_else(|| Error::NotFound(ErrorCode::QuestionNotFound).into())
}

/// Summary plus active answers, oldest first.
fn load_detail(conn: &Connection, id: i64) -> StoreResult<QuestionDetail> {
    let sql = format!("{SUMMARY_SELECT} WHERE q.id = ?1");
    let mut summaries = {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([id], row_to_summary)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows
    };
    attach_tags(conn, &mut summaries)?;

    let summary = summaries
        .pop()
        .ok_or(Error::NotFound(ErrorCode::QuestionNotFound))?;

    let answers = answer::active_answers(conn, id)?;

    Ok(QuestionDetail { summary, answers })
}
