use crate::{
    error::Result,
    models::reaction::*,
    services::auth::AuthUser,
    state::AppState,
    utils::middleware::OptionalAuth,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", post(toggle_reaction).get(reaction_summary))
}

/// 切换反应：新增、更换或取消
/// POST /api/reactions
///
/// 取消时返回 204，其余情况返回当前反应。
async fn toggle_reaction(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(request): Json<ToggleReactionRequest>,
) -> Result<Response> {
    debug!("User {} toggling {} reaction", user.id, request.reaction_type);

    let outcome = state.reaction_service.toggle_reaction(user.id, request).await?;

    let response = match outcome.reaction {
        Some(reaction) => Json(json!({
            "success": true,
            "data": reaction
        }))
        .into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    };

    Ok(response)
}

/// 反应统计
/// GET /api/reactions?post_id=...|comment_id=...
async fn reaction_summary(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<ReactionTargetQuery>,
) -> Result<Json<serde_json::Value>> {
    let summary = state
        .reaction_service
        .reaction_summary(query, user.map(|u| u.id))
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": summary
    })))
}
