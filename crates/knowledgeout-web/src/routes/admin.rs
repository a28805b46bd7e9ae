//! Admin dashboard route

use crate::auth::AdminAuth;
use crate::state::AppState;
use crate::WebError;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use knowledgeout_core::store::AdminStore;
use knowledgeout_core::Dashboard;
use serde::Deserialize;

const DEFAULT_WINDOW_DAYS: u32 = 7;

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/api/admin/dashboard", get(dashboard))
}

#[derive(Debug, Deserialize)]
struct DashboardQuery {
    days: Option<u32>,
}

async fn dashboard(
    AdminAuth(_principal): AdminAuth,
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Dashboard>, WebError> {
    let days = query.days.unwrap_or(DEFAULT_WINDOW_DAYS);
    let dashboard = state.stores.admin.dashboard(days).await?;
    Ok(Json(dashboard))
}
