//! Category listing

use crate::state::AppState;
use crate::WebError;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use knowledgeout_core::store::CategoryStore;
use knowledgeout_core::Category;

pub fn category_routes() -> Router<AppState> {
    Router::new().route("/api/categories", get(list))
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<Category>>, WebError> {
    let categories = state.stores.categories.list().await?;
    Ok(Json(categories))
}
