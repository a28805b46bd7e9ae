//! HTTP layer for KnowledgeOut
//!
//! Thin axum handlers over the store traits: resolve the principal at the
//! boundary, validate the request shape, delegate, map the domain error onto
//! a status code. No business rules live here.

pub mod routes;
pub mod server;

mod auth;
mod error;
mod state;

pub use auth::{hash_password, verify_password, Principal};
pub use error::{Result, WebError};
pub use server::{build_router, start_server};
pub use state::AppState;
