//! MemberStore implementation for SQLite

use crate::error::{is_constraint_violation, StoreError, StoreResult};
use crate::pool::SqlitePool;
use crate::util::{now_rfc3339, parse_ts};
use async_trait::async_trait;
use knowledgeout_core::store::MemberStore;
use knowledgeout_core::{
    Error, ErrorCode, Member, MemberProfile, MemberStatus, MemberUpdate, NewMember, Result, Role,
};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

const MIN_NICKNAME_CHARS: usize = 2;

/// SQLite implementation of MemberStore.
#[derive(Clone)]
pub struct SqliteMemberStore {
    pool: SqlitePool,
}

impl SqliteMemberStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Change a member's role. Not part of the store trait; only bootstrap
    /// seeding promotes accounts.
    pub async fn set_role(&self, id: i64, role: Role) -> Result<()> {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            pool.with_connection(|conn| {
                let changed = conn.execute(
                    "UPDATE members SET role = ?1, updated_at = ?2 WHERE id = ?3",
                    params![role.as_str(), now_rfc3339(), id],
                )?;
                if changed == 0 {
                    return Err(Error::NotFound(ErrorCode::MemberNotFound).into());
                }
                Ok(())
            })
        })
        .await
        .map_err(join_err)?
        .map_err(Into::into)
    }
}

#[async_trait]
impl MemberStore for SqliteMemberStore {
    async fn create(&self, new: NewMember) -> Result<MemberProfile> {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            pool.with_connection(|conn| {
                validate_nickname(&new.nickname)?;

                if email_taken(conn, &new.email)? {
                    return Err(Error::Conflict(ErrorCode::DuplicateEmail).into());
                }
                if nickname_taken(conn, &new.nickname, None)? {
                    return Err(Error::Conflict(ErrorCode::NicknameDuplicated).into());
                }

                let now = now_rfc3339();
                let inserted = conn.execute(
                    r#"
                    INSERT INTO members (email, password_hash, nickname, role, status, created_at, updated_at)
                    VALUES (?1, ?2, ?3, 'USER', 'ACTIVE', ?4, ?4)
                    "#,
                    params![new.email, new.password_hash, new.nickname, now],
                );

                // The pre-checks race against concurrent signups; a losing
                // insert still maps onto the right conflict code.
                match inserted {
                    Ok(_) => {}
                    Err(e) if is_constraint_violation(&e) => {
                        let code = if e.to_string().contains("members.email") {
                            ErrorCode::DuplicateEmail
                        } else {
                            ErrorCode::NicknameDuplicated
                        };
                        return Err(Error::Conflict(code).into());
                    }
                    Err(e) => return Err(e.into()),
                }

                let id = conn.last_insert_rowid();
                debug!(member_id = id, "member created");

                let member = get_member(conn, id)?;
                Ok(MemberProfile::from(&member))
            })
        })
        .await
        .map_err(join_err)?
        .map_err(Into::into)
    }

    async fn find_active_by_email(&self, email: &str) -> Result<Option<Member>> {
        let pool = self.pool.clone();
        let email = email.to_string();

        tokio::task::spawn_blocking(move || {
            pool.with_connection(|conn| {
                let member = conn
                    .query_row(
                        &format!("{MEMBER_SELECT} WHERE email = ?1 AND status = 'ACTIVE'"),
                        [&email],
                        row_to_member,
                    )
                    .optional()?;

                Ok(member)
            })
        })
        .await
        .map_err(join_err)?
        .map_err(Into::into)
    }

    async fn get(&self, id: i64) -> Result<MemberProfile> {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            pool.with_connection(|conn| {
                let member = get_member(conn, id)?;
                Ok(MemberProfile::from(&member))
            })
        })
        .await
        .map_err(join_err)?
        .map_err(Into::into)
    }

    async fn update(&self, id: i64, update: MemberUpdate) -> Result<MemberProfile> {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            pool.with_connection_mut(|conn| {
                let tx = conn.transaction()?;

                let member = get_member(&tx, id)?;
                if !member.is_active() {
                    return Err(Error::Conflict(ErrorCode::MemberAlreadyWithdrawn).into());
                }

                if let Some(nickname) = update
                    .nickname
                    .as_deref()
                    .filter(|n| !n.trim().is_empty())
                {
                    validate_nickname(nickname)?;
                    if nickname_taken(&tx, nickname, Some(id))? {
                        return Err(Error::Conflict(ErrorCode::NicknameDuplicated).into());
                    }
                    tx.execute(
                        "UPDATE members SET nickname = ?1 WHERE id = ?2",
                        params![nickname, id],
                    )?;
                }

                if let Some(hash) = update.password_hash.as_deref() {
                    tx.execute(
                        "UPDATE members SET password_hash = ?1 WHERE id = ?2",
                        params![hash, id],
                    )?;
                }

                tx.execute(
                    "UPDATE members SET updated_at = ?1 WHERE id = ?2",
                    params![now_rfc3339(), id],
                )?;

                let member = get_member(&tx, id)?;
                tx.commit()?;

                Ok(MemberProfile::from(&member))
            })
        })
        .await
        .map_err(join_err)?
        .map_err(Into::into)
    }

    async fn withdraw(&self, id: i64) -> Result<()> {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            pool.with_connection(|conn| {
                let member = get_member(conn, id)?;
                if !member.is_active() {
                    return Err(Error::Conflict(ErrorCode::MemberAlreadyWithdrawn).into());
                }

                conn.execute(
                    "UPDATE members SET status = 'DELETED', email = NULL, updated_at = ?1
                     WHERE id = ?2",
                    params![now_rfc3339(), id],
                )?;

                debug!(member_id = id, "member withdrawn");
                Ok(())
            })
        })
        .await
        .map_err(join_err)?
        .map_err(Into::into)
    }
}

const MEMBER_SELECT: &str = "SELECT id, email, password_hash, nickname, role, status, created_at, updated_at FROM members";

/// Load a member row or fail NotFound.
pub(crate) fn get_member(conn: &Connection, id: i64) -> StoreResult<Member> {
    conn.query_row(
        &format!("{MEMBER_SELECT} WHERE id = ?1"),
        [id],
        row_to_member,
    )
    .optional()?
    .ok_or_else(|| Error::NotFound(ErrorCode::MemberNotFound).into())
}

/// Re-validate that the acting member resolves and is ACTIVE. Every mutation
/// entry point calls this before touching anything else.
pub(crate) fn require_active(conn: &Connection, id: i64) -> StoreResult<Member> {
    let member = get_member(conn, id)?;
    if !member.is_active() {
        return Err(Error::NotFound(ErrorCode::MemberNotFound).into());
    }
    Ok(member)
}

fn validate_nickname(nickname: &str) -> StoreResult<()> {
    if nickname.chars().count() < MIN_NICKNAME_CHARS {
        return Err(Error::Validation(ErrorCode::NicknameLengthViolation).into());
    }
    Ok(())
}

fn email_taken(conn: &Connection, email: &str) -> StoreResult<bool> {
    let taken: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM members WHERE email = ?1)",
        [email],
        |row| row.get(0),
    )?;
    Ok(taken)
}

fn nickname_taken(conn: &Connection, nickname: &str, excluding: Option<i64>) -> StoreResult<bool> {
    let taken: bool = match excluding {
        Some(id) => conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM members WHERE nickname = ?1 AND id != ?2)",
            params![nickname, id],
            |row| row.get(0),
        )?,
        None => conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM members WHERE nickname = ?1)",
            [nickname],
            |row| row.get(0),
        )?,
    };
    Ok(taken)
}

fn row_to_member(row: &rusqlite::Row) -> rusqlite::Result<Member> {
    let role: String = row.get(4)?;
    let status: String = row.get(5)?;
    let created_at: String = row.get(6)?;
    let updated_at: String = row.get(7)?;

    Ok(Member {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        nickname: row.get(3)?,
        role: Role::parse(&role).unwrap_or(Role::User),
        status: MemberStatus::parse(&status).unwrap_or(MemberStatus::Active),
        created_at: parse_ts(&created_at),
        updated_at: parse_ts(&updated_at),
    })
}

pub(crate) fn join_err(e: tokio::task::JoinError) -> Error {
    Error::Storage(e.to_string())
}
