use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method},
    middleware,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

use crate::{
    state::AppState,
    utils::middleware::{auth_middleware, rate_limit_middleware, request_id_middleware},
};

/// 组装完整的 HTTP 路由与中间件
pub fn build_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .allow_origin(allowed_origins(&app_state.config.cors_allowed_origins));

    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .nest("/api/users", routes::users::router())
        .nest("/api/posts", routes::posts::router())
        .nest("/api/comments", routes::comments::router())
        .nest("/api/reactions", routes::reactions::router())
        .nest("/api/follows", routes::follows::router())
        .nest("/api/reports", routes::reports::router())
        .nest("/api/feed", routes::feed::router())
        .nest("/api/messages", routes::messages::router())
        .nest("/api/status", routes::statuses::router())
        .nest("/api/notifications", routes::notifications::router())
        .nest("/api/measurements", routes::measurements::router())
        .nest("/api/vendors", routes::vendors::router())
        .nest("/api/articles", routes::articles::router())
        .nest("/api/orders", routes::orders::router())
        .nest("/api/payments", routes::payments::router())
        .nest("/api/maintenance", routes::maintenance::router())
        .layer(middleware::from_fn_with_state(app_state.clone(), auth_middleware))
        .layer(middleware::from_fn_with_state(app_state.clone(), rate_limit_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "success": true,
        "service": "agora",
        "status": "ok"
    }))
}

fn allowed_origins(raw: &str) -> Vec<HeaderValue> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_origins_skips_invalid_entries() {
        let origins = allowed_origins("http://localhost:3001, ,bad\norigin,https://agora.example");
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[0], "http://localhost:3001");
        assert_eq!(origins[1], "https://agora.example");
    }
}
