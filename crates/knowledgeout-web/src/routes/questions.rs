//! Question routes: search, counts, CRUD, like toggle

use crate::auth::Auth;
use crate::state::AppState;
use crate::WebError;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use knowledgeout_core::store::QuestionStore;
use knowledgeout_core::{
    Page, PageRequest, QuestionCounts, QuestionDetail, QuestionDraft, QuestionFilter,
    QuestionSummary, Sort, StatusFilter,
};
use serde::Deserialize;
use serde_json::json;

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

pub fn question_routes() -> Router<AppState> {
    Router::new()
        .route("/api/questions", get(search).post(create))
        .route("/api/questions/count-summary", get(count_summary))
        .route(
            "/api/questions/{id}",
            get(fetch).put(update).delete(delete),
        )
        .route("/api/questions/{id}/like", post(toggle_like))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    category: Option<String>,
    tag: Option<String>,
    status: Option<String>,
    search: Option<String>,
    page: Option<u32>,
    size: Option<u32>,
    sort: Option<String>,
}

impl SearchQuery {
    fn page_request(&self) -> PageRequest {
        let size = self.size.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);
        let sort = self.sort.as_deref().map(Sort::parse).unwrap_or_default();
        PageRequest::new(self.page.unwrap_or(0), size).with_sort(sort)
    }

    fn filter(&self) -> QuestionFilter {
        QuestionFilter {
            category: self.category.clone(),
            tag: self.tag.clone(),
            status: self
                .status
                .as_deref()
                .map(StatusFilter::parse)
                .unwrap_or_default(),
            search: self.search.clone(),
        }
    }
}

async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Page<QuestionSummary>>, WebError> {
    let page = state
        .stores
        .questions
        .search(query.page_request(), query.filter())
        .await?;
    Ok(Json(page))
}

#[derive(Debug, Deserialize)]
struct CountQuery {
    category: Option<String>,
    search: Option<String>,
}

async fn count_summary(
    State(state): State<AppState>,
    Query(query): Query<CountQuery>,
) -> Result<Json<QuestionCounts>, WebError> {
    let counts = state
        .stores
        .questions
        .counts(query.category.as_deref(), query.search.as_deref())
        .await?;
    Ok(Json(counts))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionRequest {
    title: String,
    content: String,
    category_id: i64,
    tag_names: Option<Vec<String>>,
}

impl From<QuestionRequest> for QuestionDraft {
    fn from(req: QuestionRequest) -> Self {
        Self {
            title: req.title,
            content: req.content,
            category_id: req.category_id,
            tag_names: req.tag_names.unwrap_or_default(),
        }
    }
}

async fn create(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Json(req): Json<QuestionRequest>,
) -> Result<impl axum::response::IntoResponse, WebError> {
    let id = state
        .stores
        .questions
        .create(principal.id, req.into())
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn fetch(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<QuestionDetail>, WebError> {
    let detail = state.stores.questions.fetch(id).await?;
    Ok(Json(detail))
}

async fn update(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<QuestionRequest>,
) -> Result<Json<QuestionDetail>, WebError> {
    let detail = state
        .stores
        .questions
        .update(id, principal.id, req.into())
        .await?;
    Ok(Json(detail))
}

async fn delete(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, WebError> {
    state.stores.questions.delete(id, principal.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_like(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, WebError> {
    let like_count = state
        .stores
        .questions
        .toggle_like(id, principal.id)
        .await?;
    Ok(Json(json!({ "likeCount": like_count })))
}
