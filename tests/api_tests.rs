//! 不依赖数据库即可验证的 HTTP 行为：健康检查、认证拦截、维护入口保护。
//! 连接池为惰性连接，这些请求都不会真正访问数据库。

use std::sync::Arc;

use agora::{
    build_router,
    config::Config,
    services::{auth::AuthService, Database},
    state::AppState,
};
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

async fn test_app() -> Router {
    let config = Config::default();
    let db = Arc::new(Database::connect_lazy(&config).unwrap());
    let state = AppState::build(config, db).await.unwrap();
    build_router(Arc::new(state))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn health_check_reports_ok() {
    let app = test_app().await;

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn profile_requires_authentication() {
    let app = test_app().await;

    let request = Request::builder().uri("/api/users/me").body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn token_signed_with_foreign_secret_is_rejected() {
    let app = test_app().await;

    let foreign = Config {
        jwt_secret: "someone-elses-secret".to_string(),
        ..Config::default()
    };
    let db = Arc::new(Database::connect_lazy(&foreign).unwrap());
    let issuer = AuthService::new(&foreign, db).await.unwrap();
    let (token, _) = issuer.issue_token(Uuid::new_v4(), "mallory").unwrap();

    let request = Request::builder()
        .uri("/api/feed")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "AUTHENTICATION_ERROR");
}

#[tokio::test]
async fn reaction_toggle_requires_authentication() {
    let app = test_app().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/reactions")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({
                "post_id": Uuid::new_v4(),
                "reaction_type": "like"
            })
            .to_string(),
        ))
        .unwrap();
    let (status, _) = send(app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn maintenance_endpoint_requires_token() {
    let app = test_app().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/maintenance/purge-expired-statuses")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = test_app().await;

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    let request_id = response.headers().get("x-request-id").unwrap();
    assert!(Uuid::parse_str(request_id.to_str().unwrap()).is_ok());
}
