//! Answer routes under a question

use crate::auth::Auth;
use crate::state::AppState;
use crate::WebError;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use knowledgeout_core::store::AnswerStore;
use knowledgeout_core::{AnswerDraft, AnswerView};
use serde::Deserialize;
use serde_json::json;

pub fn answer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/questions/{id}/answers",
            get(list).post(create),
        )
        .route(
            "/api/questions/{id}/answers/{answer_id}",
            put(update).delete(delete),
        )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnswerRequest {
    content: String,
    tag_names: Option<Vec<String>>,
}

impl From<AnswerRequest> for AnswerDraft {
    fn from(req: AnswerRequest) -> Self {
        Self {
            content: req.content,
            tag_names: req.tag_names.unwrap_or_default(),
        }
    }
}

async fn list(
    State(state): State<AppState>,
    Path(question_id): Path<i64>,
) -> Result<Json<Vec<AnswerView>>, WebError> {
    let answers = state.stores.answers.list_for_question(question_id).await?;
    Ok(Json(answers))
}

async fn create(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Path(question_id): Path<i64>,
    Json(req): Json<AnswerRequest>,
) -> Result<impl axum::response::IntoResponse, WebError> {
    let id = state
        .stores
        .answers
        .create(question_id, principal.id, req.into())
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn update(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Path((question_id, answer_id)): Path<(i64, i64)>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<AnswerView>, WebError> {
    let view = state
        .stores
        .answers
        .update(question_id, answer_id, principal.id, req.into())
        .await?;
    Ok(Json(view))
}

async fn delete(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Path((question_id, answer_id)): Path<(i64, i64)>,
) -> Result<StatusCode, WebError> {
    state
        .stores
        .answers
        .delete(question_id, answer_id, principal.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
