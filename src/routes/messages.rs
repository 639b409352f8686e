use crate::{
    error::Result,
    models::{message::SendMessageRequest, response::paginated_json},
    routes::PageQuery,
    services::auth::AuthUser,
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(send_message))
        .route("/conversations", get(list_conversations))
        .route("/conversations/:user_id", get(get_conversation))
        .route("/conversations/:user_id/read", post(mark_conversation_read))
}

/// 发送私信
/// POST /api/messages
async fn send_message(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(request): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    debug!("User {} messaging {}", user.id, request.recipient_id);

    let message = state.message_service.send_message(user.id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": message
        })),
    ))
}

/// 会话列表
/// GET /api/messages/conversations
async fn list_conversations(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Value>> {
    let conversations = state.message_service.list_conversations(user.id).await?;

    Ok(Json(json!({
        "success": true,
        "data": conversations
    })))
}

/// 与某个用户的消息记录，最新在前
/// GET /api/messages/conversations/:user_id
async fn get_conversation(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(partner_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>> {
    let (page, limit) = state.page_params(query.page, query.limit);

    let result = state
        .message_service
        .get_conversation(user.id, partner_id, page, limit)
        .await?;

    Ok(Json(paginated_json(result)))
}

/// 标记会话为已读
/// POST /api/messages/conversations/:user_id/read
async fn mark_conversation_read(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(partner_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let updated = state
        .message_service
        .mark_conversation_read(user.id, partner_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": { "updated": updated }
    })))
}
