use crate::{
    error::Result,
    models::response::paginated_json,
    routes::PageQuery,
    services::auth::AuthUser,
    state::AppState,
    utils::middleware::OptionalAuth,
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
        .route("/user/:user_id/follow", post(follow_user).delete(unfollow_user))
        .route("/user/:user_id/followers", get(get_followers))
        .route("/user/:user_id/following", get(get_following))
        .route("/user/:user_id/stats", get(get_follow_stats))
}

/// 关注用户
/// POST /api/follows/user/:user_id/follow
async fn follow_user(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Value>)> {
    debug!("User {} following user {}", user.id, user_id);

    let follow = state.follow_service.follow_user(user.id, user_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": follow
        })),
    ))
}

/// 取消关注用户
/// DELETE /api/follows/user/:user_id/follow
async fn unfollow_user(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Value>> {
    debug!("User {} unfollowing user {}", user.id, user_id);

    state.follow_service.unfollow_user(user.id, user_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "User unfollowed successfully"
    })))
}

/// 获取用户的关注者列表
/// GET /api/follows/user/:user_id/followers
async fn get_followers(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(user_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>> {
    let (page, limit) = state.page_params(query.page, query.limit);

    let result = state
        .follow_service
        .get_followers(user_id, user.map(|u| u.id), page, limit)
        .await?;

    Ok(Json(paginated_json(result)))
}

/// 获取用户关注的人列表
/// GET /api/follows/user/:user_id/following
async fn get_following(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(user_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>> {
    let (page, limit) = state.page_params(query.page, query.limit);

    let result = state
        .follow_service
        .get_following(user_id, user.map(|u| u.id), page, limit)
        .await?;

    Ok(Json(paginated_json(result)))
}

/// 获取关注统计
/// GET /api/follows/user/:user_id/stats
async fn get_follow_stats(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let stats = state
        .follow_service
        .get_follow_stats(user_id, user.map(|u| u.id))
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": stats
    })))
}
