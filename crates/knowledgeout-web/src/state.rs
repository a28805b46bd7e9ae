//! Shared application state

use knowledgeout_sqlite::SqliteStores;

/// State handed to every handler: the store set over one shared pool.
#[derive(Clone)]
pub struct AppState {
    pub stores: SqliteStores,
}

impl AppState {
    pub fn new(stores: SqliteStores) -> Self {
        Self { stores }
    }
}
