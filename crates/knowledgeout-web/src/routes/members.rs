//! Member routes: signup, login, my-page, profile update, withdrawal

use crate::auth::{hash_password, Auth, MaybeAuth};
use crate::state::AppState;
use crate::WebError;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use knowledgeout_core::store::{AnswerStore, MemberStore, QuestionStore};
use knowledgeout_core::{Error, ErrorCode, MemberProfile, MemberUpdate, NewMember};
use serde::Deserialize;
use tracing::info;

const MIN_PASSWORD_CHARS: usize = 8;

pub fn member_routes() -> Router<AppState> {
    Router::new()
        .route("/api/members/signup", post(signup))
        .route("/api/members/login", post(login))
        .route("/api/members/current", get(current))
        .route("/api/members/mypage", get(my_page))
        .route("/api/members/mypage/questions", get(my_questions))
        .route("/api/members/mypage/answers", get(my_answers))
        .route("/api/members/mypage/likes", get(my_likes))
        .route("/api/members/mypage/withdraw", axum::routing::delete(withdraw))
        .route("/api/members/{id}", put(update_member))
}

#[derive(Debug, Deserialize)]
struct SignupRequest {
    email: String,
    password: String,
    nickname: String,
}

async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, WebError> {
    // Policy on the plaintext, before hashing
    if req.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(Error::Validation(ErrorCode::PasswordPolicyViolation).into());
    }

    let profile = state
        .stores
        .members
        .create(NewMember {
            email: req.email,
            password_hash: hash_password(&req.password)?,
            nickname: req.nickname,
        })
        .await?;

    info!(member_id = profile.id, "member signed up");
    Ok((StatusCode::CREATED, Json(profile)))
}

/// Credentials travel in the Basic header; a successful login just echoes
/// the profile so the client can confirm them.
async fn login(Auth(principal): Auth, State(state): State<AppState>) -> Result<Json<MemberProfile>, WebError> {
    let profile = state.stores.members.get(principal.id).await?;
    Ok(Json(profile))
}

async fn current(
    MaybeAuth(principal): MaybeAuth,
    State(state): State<AppState>,
) -> Result<Response, WebError> {
    match principal {
        Some(p) => {
            let profile = state.stores.members.get(p.id).await?;
            Ok(Json(profile).into_response())
        }
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

async fn my_page(
    Auth(principal): Auth,
    State(state): State<AppState>,
) -> Result<Json<MemberProfile>, WebError> {
    let profile = state.stores.members.get(principal.id).await?;
    Ok(Json(profile))
}

async fn my_questions(
    Auth(principal): Auth,
    State(state): State<AppState>,
) -> Result<Response, WebError> {
    let questions = state.stores.questions.by_member(principal.id).await?;
    Ok(Json(questions).into_response())
}

async fn my_answers(
    Auth(principal): Auth,
    State(state): State<AppState>,
) -> Result<Response, WebError> {
    let answers = state.stores.answers.by_member(principal.id).await?;
    Ok(Json(answers).into_response())
}

async fn my_likes(
    Auth(principal): Auth,
    State(state): State<AppState>,
) -> Result<Response, WebError> {
    let questions = state.stores.questions.liked_by_member(principal.id).await?;
    Ok(Json(questions).into_response())
}

#[derive(Debug, Deserialize)]
struct UpdateMemberRequest {
    nickname: Option<String>,
    password: Option<String>,
}

async fn update_member(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateMemberRequest>,
) -> Result<Json<MemberProfile>, WebError> {
    if principal.id != id {
        return Err(Error::Forbidden(ErrorCode::AccessDenied).into());
    }

    let password_hash = match req.password.as_deref().filter(|p| !p.trim().is_empty()) {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };

    let profile = state
        .stores
        .members
        .update(
            id,
            MemberUpdate {
                nickname: req.nickname,
                password_hash,
            },
        )
        .await?;

    Ok(Json(profile))
}

async fn withdraw(
    Auth(principal): Auth,
    State(state): State<AppState>,
) -> Result<StatusCode, WebError> {
    state.stores.members.withdraw(principal.id).await?;
    info!(member_id = principal.id, "member withdrew");
    Ok(StatusCode::NO_CONTENT)
}
