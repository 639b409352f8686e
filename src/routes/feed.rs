use crate::{
    error::Result,
    models::feed::FeedQuery,
    services::auth::AuthUser,
    state::AppState,
};
use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_feed))
        .route("/follow", get(get_following_feed))
}

/// 时间线：除已举报用户外的公开帖子与关注者的转发
/// GET /api/feed
async fn get_feed(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Value>> {
    feed_response(&state, user, query, false).await
}

/// 仅关注者的时间线
/// GET /api/feed/follow
async fn get_following_feed(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Value>> {
    feed_response(&state, user, query, true).await
}

async fn feed_response(
    state: &AppState,
    user: AuthUser,
    query: FeedQuery,
    following_only: bool,
) -> Result<Json<Value>> {
    let (page, limit) = state.page_params(query.page, query.limit);

    let feed = state
        .feed_service
        .get_feed(user.id, page, limit, following_only)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": feed
    })))
}
