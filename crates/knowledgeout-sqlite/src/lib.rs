//! SQLite storage backend for KnowledgeOut
//!
//! Implements the `knowledgeout-core` store traits over a single WAL-mode
//! connection guarded by a mutex. All calls run the synchronous `rusqlite`
//! work on the blocking thread pool.

mod admin;
mod answer;
mod category;
mod error;
mod member;
mod pool;
mod question;
mod schema;
mod search;
mod tag;
mod util;

pub use admin::SqliteAdminStore;
pub use answer::SqliteAnswerStore;
pub use category::SqliteCategoryStore;
pub use error::StoreError;
pub use member::SqliteMemberStore;
pub use pool::SqlitePool;
pub use question::SqliteQuestionStore;
pub use tag::SqliteTagStore;

use knowledgeout_config::DatabaseConfig;
use knowledgeout_core::Result;

/// All stores over one shared pool. This is what the web layer holds.
#[derive(Clone)]
pub struct SqliteStores {
    pub members: SqliteMemberStore,
    pub categories: SqliteCategoryStore,
    pub tags: SqliteTagStore,
    pub questions: SqliteQuestionStore,
    pub answers: SqliteAnswerStore,
    pub admin: SqliteAdminStore,
}

impl SqliteStores {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            members: SqliteMemberStore::new(pool.clone()),
            categories: SqliteCategoryStore::new(pool.clone()),
            tags: SqliteTagStore::new(pool.clone()),
            questions: SqliteQuestionStore::new(pool.clone()),
            answers: SqliteAnswerStore::new(pool.clone()),
            admin: SqliteAdminStore::new(pool),
        }
    }

    /// Open (or create) the database described by `config` and build the
    /// store set on top of it.
    pub fn open(config: DatabaseConfig) -> Result<Self> {
        Ok(Self::new(SqlitePool::new(config)?))
    }

    /// In-memory store set for tests.
    pub fn memory() -> Result<Self> {
        Ok(Self::new(SqlitePool::memory()?))
    }
}
