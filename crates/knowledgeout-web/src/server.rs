//! Router assembly and server startup

use crate::routes::{
    admin_routes, answer_routes, category_routes, health_routes, member_routes, question_routes,
};
use crate::state::AppState;
use crate::{Result, WebError};
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use knowledgeout_config::ServerConfig;
use knowledgeout_sqlite::SqliteStores;
use std::net::SocketAddr;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

const MAX_BODY_SIZE_1MB: usize = 1024 * 1024;

/// Assemble the full application router. Health stays outside the stateful
/// sub-router so probes work without a database.
pub fn build_router(stores: SqliteStores, cors_origins: &[String]) -> Router {
    let state = AppState::new(stores);

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(parse_origins(cors_origins)))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .merge(member_routes())
        .merge(question_routes())
        .merge(answer_routes())
        .merge(category_routes())
        .merge(admin_routes())
        .with_state(state)
        .merge(health_routes())
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE_1MB))
        .layer(cors)
}

fn parse_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect()
}

/// Bind and serve until the process is stopped.
pub async fn start_server(config: &ServerConfig, stores: SqliteStores) -> Result<()> {
    let app = build_router(stores, &config.cors_origins);

    let addr = SocketAddr::new(config.host, config.port);
    info!("starting web server on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(WebError::Io)?;

    axum::serve(listener, app).await.map_err(WebError::Io)?;

    Ok(())
}
