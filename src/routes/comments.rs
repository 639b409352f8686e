use crate::{
    error::Result,
    models::{comment::*, response::paginated_json},
    routes::PageQuery,
    services::auth::AuthUser,
    state::AppState,
    utils::middleware::OptionalAuth,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_comment))
        .route("/post/:post_id", get(list_post_comments))
        .route("/:id", put(update_comment).delete(delete_comment))
}

/// 发表评论或回复
/// POST /api/comments
async fn create_comment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(request): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    debug!("User {} commenting on post {}", user.id, request.post_id);

    let comment = state.comment_service.create_comment(user.id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": comment
        })),
    ))
}

/// 帖子的评论列表
/// GET /api/comments/post/:post_id
async fn list_post_comments(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(post_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>> {
    let (page, limit) = state.page_params(query.page, query.limit);

    let result = state
        .comment_service
        .list_post_comments(post_id, user.map(|u| u.id), page, limit)
        .await?;

    Ok(Json(paginated_json(result)))
}

/// 编辑评论
/// PUT /api/comments/:id
async fn update_comment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(comment_id): Path<Uuid>,
    Json(request): Json<UpdateCommentRequest>,
) -> Result<Json<Value>> {
    let comment = state
        .comment_service
        .update_comment(comment_id, user.id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": comment
    })))
}

/// 删除评论（连同其回复）
/// DELETE /api/comments/:id
async fn delete_comment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(comment_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let removed = state.comment_service.delete_comment(comment_id, user.id).await?;

    Ok(Json(json!({
        "success": true,
        "data": { "removed": removed }
    })))
}
