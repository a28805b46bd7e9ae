//! Router-level tests against an in-memory store

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use http_body_util::BodyExt;
use knowledgeout_core::store::CategoryStore;
use knowledgeout_sqlite::SqliteStores;
use knowledgeout_web::build_router;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn app() -> Router {
    let stores = SqliteStores::memory().unwrap();
    stores
        .categories
        .ensure(&["JAVA".into(), "REACT".into()])
        .await
        .unwrap();
    build_router(stores, &["http://localhost:3000".to_string()])
}

fn basic(email: &str, password: &str) -> String {
    format!("Basic {}", BASE64.encode(format!("{email}:{password}")))
}

fn json_request(method: &str, uri: &str, auth: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn signup(app: &Router, email: &str, password: &str, nickname: &str) -> StatusCode {
    let req = json_request(
        "POST",
        "/api/members/signup",
        None,
        json!({ "email": email, "password": password, "nickname": nickname }),
    );
    app.clone().oneshot(req).await.unwrap().status()
}

#[tokio::test]
async fn health_is_open() {
    let app = app().await;
    let response = app.oneshot(get_request("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn signup_validates_password_policy() {
    let app = app().await;

    assert_eq!(
        signup(&app, "a@b.com", "short", "abc").await,
        StatusCode::BAD_REQUEST
    );

    // The short-password attempt left no row behind
    assert_eq!(
        signup(&app, "a@b.com", "password123", "abc").await,
        StatusCode::CREATED
    );

    assert_eq!(
        signup(&app, "a@b.com", "password456", "other").await,
        StatusCode::CONFLICT
    );
}

#[tokio::test]
async fn signup_error_body_carries_stable_code() {
    let app = app().await;
    let req = json_request(
        "POST",
        "/api/members/signup",
        None,
        json!({ "email": "a@b.com", "password": "short", "nickname": "abc" }),
    );
    let response = app.oneshot(req).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["code"], "PASSWORD_POLICY_VIOLATION");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn mutations_require_authentication() {
    let app = app().await;

    let req = json_request(
        "POST",
        "/api/questions",
        None,
        json!({ "title": "t", "content": "c", "categoryId": 1 }),
    );
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let req = json_request(
        "POST",
        "/api/questions",
        Some(&basic("ghost@b.com", "password123")),
        json!({ "title": "t", "content": "c", "categoryId": 1 }),
    );
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn question_lifecycle_over_http() {
    let app = app().await;
    signup(&app, "a@b.com", "password123", "author").await;
    let auth = basic("a@b.com", "password123");

    // Create
    let req = json_request(
        "POST",
        "/api/questions",
        Some(&auth),
        json!({
            "title": "React state",
            "content": "How do I manage state?",
            "categoryId": 2,
            "tagNames": ["react"]
        }),
    );
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = body_json(response).await["id"].as_i64().unwrap();

    // Tag search finds it
    let response = app
        .clone()
        .oneshot(get_request("/api/questions?search=%23react", None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["totalElements"], 1);
    assert_eq!(body["content"][0]["id"], id);
    assert_eq!(body["content"][0]["memberNickname"], "author");

    // Fetching bumps the view counter
    let response = app
        .clone()
        .oneshot(get_request(&format!("/api/questions/{id}"), None))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["viewCount"], 1);

    // Like toggles on and off
    let like_uri = format!("/api/questions/{id}/like");
    let response = app
        .clone()
        .oneshot(json_request("POST", &like_uri, Some(&auth), json!({})))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["likeCount"], 1);
    let response = app
        .clone()
        .oneshot(json_request("POST", &like_uri, Some(&auth), json!({})))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["likeCount"], 0);

    // Delete, then the question is gone
    let req = json_request(
        "DELETE",
        &format!("/api/questions/{id}"),
        Some(&auth),
        json!({}),
    );
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(get_request(&format!("/api/questions/{id}"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn count_summary_shape() {
    let app = app().await;
    let response = app
        .oneshot(get_request("/api/questions/count-summary", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["total"], 0);
    assert_eq!(body["pendingCount"], 0);
    assert_eq!(body["answeredCount"], 0);
}

#[tokio::test]
async fn dashboard_is_admin_only() {
    let app = app().await;
    signup(&app, "user@b.com", "password123", "user").await;

    let response = app
        .clone()
        .oneshot(get_request("/api/admin/dashboard", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(get_request(
            "/api/admin/dashboard?days=7",
            Some(&basic("user@b.com", "password123")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn categories_are_listed_unauthenticated() {
    let app = app().await;
    let response = app
        .oneshot(get_request("/api/categories", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["JAVA", "REACT"]);
}

#[tokio::test]
async fn member_update_enforces_actor_equals_target() {
    let app = app().await;
    signup(&app, "a@b.com", "password123", "first").await;
    signup(&app, "c@d.com", "password123", "second").await;

    // The second member has id 2; the first may not touch it
    let req = json_request(
        "PUT",
        "/api/members/2",
        Some(&basic("a@b.com", "password123")),
        json!({ "nickname": "hijack" }),
    );
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
