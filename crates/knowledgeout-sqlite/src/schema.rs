//! Schema management and migrations

use crate::error::StoreResult;
use rusqlite::Connection;
use tracing::{debug, info};

/// Schema version - increment when making schema changes
const SCHEMA_VERSION: i32 = 1;

/// Apply all pending migrations.
pub fn apply_migrations(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current_version = get_current_version(conn)?;
    debug!(current_version, target_version = SCHEMA_VERSION, "checking migrations");

    if current_version < SCHEMA_VERSION {
        info!(from = current_version, to = SCHEMA_VERSION, "applying schema migrations");
        apply_migration_v1(conn)?;
    }

    Ok(())
}

fn get_current_version(conn: &Connection) -> StoreResult<i32> {
    let version: Option<i32> = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })
        .unwrap_or(None);

    Ok(version.unwrap_or(0))
}

fn record_migration(conn: &Connection, version: i32) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version) VALUES (?)",
        [version],
    )?;
    Ok(())
}

fn apply_migration_v1(conn: &Connection) -> StoreResult<()> {
    debug!("applying migration v1: initial schema");

    conn.execute_batch(SCHEMA_V1)?;
    record_migration(conn, 1)?;

    info!("migration v1 applied");
    Ok(())
}

/// Initial schema.
///
/// Timestamps are RFC 3339 TEXT, written by the application so the format
/// stays uniform and lexicographically comparable. Soft deletes are INTEGER
/// flags filtered explicitly on every default read path.
const SCHEMA_V1: &str = r#"
-- ============================================================================
-- TABLE: members
-- ============================================================================
-- email goes NULL on withdrawal; the UNIQUE constraint permits multiple NULLs

CREATE TABLE IF NOT EXISTS members (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT UNIQUE,
    password_hash TEXT NOT NULL,
    nickname TEXT NOT NULL UNIQUE,
    role TEXT NOT NULL DEFAULT 'USER' CHECK (role IN ('USER', 'ADMIN')),
    status TEXT NOT NULL DEFAULT 'ACTIVE' CHECK (status IN ('ACTIVE', 'DELETED')),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- ============================================================================
-- TABLE: categories
-- ============================================================================
-- Fixed vocabulary, seeded at startup

CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

-- ============================================================================
-- TABLE: tags
-- ============================================================================
-- Created lazily on first use, never deleted

CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

-- ============================================================================
-- TABLE: questions
-- ============================================================================

CREATE TABLE IF NOT EXISTS questions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    member_id INTEGER NOT NULL REFERENCES members(id),
    category_id INTEGER NOT NULL REFERENCES categories(id),
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    view_count INTEGER NOT NULL DEFAULT 0,
    deleted INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_questions_member ON questions(member_id);
CREATE INDEX IF NOT EXISTS idx_questions_category ON questions(category_id);
CREATE INDEX IF NOT EXISTS idx_questions_deleted_created ON questions(deleted, created_at);

-- ============================================================================
-- TABLE: answers
-- ============================================================================

CREATE TABLE IF NOT EXISTS answers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    question_id INTEGER NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
    member_id INTEGER NOT NULL REFERENCES members(id),
    content TEXT NOT NULL,
    deleted INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_answers_question ON answers(question_id, deleted);
CREATE INDEX IF NOT EXISTS idx_answers_member ON answers(member_id);

-- ============================================================================
-- TABLE: question_tags / answer_tags
-- ============================================================================
-- The composite PK is a backstop; the application deduplicates tag sets
-- before insert and replaces them wholesale on update

CREATE TABLE IF NOT EXISTS question_tags (
    question_id INTEGER NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
    tag_id INTEGER NOT NULL REFERENCES tags(id),
    PRIMARY KEY (question_id, tag_id)
);

CREATE INDEX IF NOT EXISTS idx_question_tags_tag ON question_tags(tag_id);

CREATE TABLE IF NOT EXISTS answer_tags (
    answer_id INTEGER NOT NULL REFERENCES answers(id) ON DELETE CASCADE,
    tag_id INTEGER NOT NULL REFERENCES tags(id),
    PRIMARY KEY (answer_id, tag_id)
);

CREATE INDEX IF NOT EXISTS idx_answer_tags_tag ON answer_tags(tag_id);

-- ============================================================================
-- TABLE: question_likes
-- ============================================================================
-- Presence = liked; the UNIQUE pair absorbs duplicate concurrent inserts

CREATE TABLE IF NOT EXISTS question_likes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    member_id INTEGER NOT NULL REFERENCES members(id),
    question_id INTEGER NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    UNIQUE (member_id, question_id)
);

CREATE INDEX IF NOT EXISTS idx_question_likes_question ON question_likes(question_id);
"#;
