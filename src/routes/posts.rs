use crate::{
    error::Result,
    models::{post::*, response::paginated_json},
    routes::PageQuery,
    services::auth::AuthUser,
    state::AppState,
    utils::middleware::OptionalAuth,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_post).get(list_posts))
        .route("/:id", get(get_post).put(update_post).delete(delete_post))
        .route("/:id/share", post(share_post))
        .route("/user/:user_id", get(list_user_posts))
        .route("/retweets/:id", delete(delete_retweet))
}

/// 发布帖子
/// POST /api/posts
async fn create_post(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(request): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    debug!("Creating post for user {}", user.id);

    let post = state.post_service.create_post(user.id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": post
        })),
    ))
}

/// 帖子列表（公开帖子，登录后包含自己的私密帖子）
/// GET /api/posts
async fn list_posts(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>> {
    let (page, limit) = state.page_params(query.page, query.limit);
    let viewer_id = user.map(|u| u.id);

    let result = state.post_service.list_posts(viewer_id, page, limit).await?;

    Ok(Json(paginated_json(result)))
}

/// 帖子详情
/// GET /api/posts/:id
async fn get_post(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let post = state
        .post_service
        .get_post(post_id, user.map(|u| u.id))
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": post
    })))
}

/// 编辑帖子
/// PUT /api/posts/:id
async fn update_post(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(post_id): Path<Uuid>,
    Json(request): Json<UpdatePostRequest>,
) -> Result<Json<Value>> {
    let post = state
        .post_service
        .update_post(post_id, user.id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": post
    })))
}

/// 删除帖子
/// DELETE /api/posts/:id
async fn delete_post(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Value>> {
    state.post_service.delete_post(post_id, user.id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Post deleted"
    })))
}

/// 转发帖子
/// POST /api/posts/:id/share
async fn share_post(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(post_id): Path<Uuid>,
    request: Option<Json<SharePostRequest>>,
) -> Result<(StatusCode, Json<Value>)> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let retweet = state
        .post_service
        .share_post(user.id, post_id, request)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": retweet
        })),
    ))
}

/// 某个用户的帖子
/// GET /api/posts/user/:user_id
async fn list_user_posts(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(user_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>> {
    let (page, limit) = state.page_params(query.page, query.limit);

    let result = state
        .post_service
        .list_user_posts(user_id, user.map(|u| u.id), page, limit)
        .await?;

    Ok(Json(paginated_json(result)))
}

/// 撤销转发
/// DELETE /api/posts/retweets/:id
async fn delete_retweet(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(retweet_id): Path<Uuid>,
) -> Result<Json<Value>> {
    state.post_service.delete_retweet(user.id, retweet_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Retweet removed"
    })))
}
