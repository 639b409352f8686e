use crate::{
    error::Result,
    models::{notification::NotificationQuery, response::paginated_json},
    services::auth::AuthUser,
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/unread-count", get(unread_count))
        .route("/read-all", post(mark_all_read))
        .route("/:id/read", post(mark_read))
}

/// 通知列表
/// GET /api/notifications?unread_only=true
async fn list_notifications(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<Value>> {
    let (page, limit) = state.page_params(query.page, query.limit);

    let result = state
        .notification_service
        .list_notifications(user.id, query.unread_only, page, limit)
        .await?;

    Ok(Json(paginated_json(result)))
}

/// GET /api/notifications/unread-count
async fn unread_count(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Value>> {
    let count = state.notification_service.unread_count(user.id).await?;

    Ok(Json(json!({
        "success": true,
        "data": { "unread_count": count }
    })))
}

/// POST /api/notifications/:id/read
async fn mark_read(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let notification = state
        .notification_service
        .mark_read(user.id, notification_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": notification
    })))
}

/// 全部标为已读
/// POST /api/notifications/read-all
async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Value>> {
    let updated = state.notification_service.mark_all_read(user.id).await?;

    Ok(Json(json!({
        "success": true,
        "data": { "updated": updated }
    })))
}
