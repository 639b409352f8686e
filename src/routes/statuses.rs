use crate::{
    error::Result,
    models::status::CreateStatusRequest,
    services::auth::AuthUser,
    state::AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_status))
        .route("/all", get(get_feed_statuses))
        .route("/user/:user_id", get(get_user_statuses))
        .route("/:id", get(get_status).delete(delete_status))
}

/// 发布限时状态
/// POST /api/status
async fn create_status(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(request): Json<CreateStatusRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let status = state.status_service.create_status(user.id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": status
        })),
    ))
}

/// 自己和关注的人的有效状态，按用户分组
/// GET /api/status/all
async fn get_feed_statuses(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Value>> {
    let groups = state.status_service.get_feed_statuses(user.id).await?;

    Ok(Json(json!({
        "success": true,
        "data": groups
    })))
}

/// GET /api/status/user/:user_id
async fn get_user_statuses(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let statuses = state.status_service.get_user_statuses(user_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": statuses
    })))
}

/// GET /api/status/:id
async fn get_status(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(status_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let status = state.status_service.get_status_by_id(status_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": status
    })))
}

/// DELETE /api/status/:id
async fn delete_status(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(status_id): Path<Uuid>,
) -> Result<Json<Value>> {
    state.status_service.delete_status(status_id, user.id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Status deleted"
    })))
}
