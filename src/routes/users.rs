use crate::{
    error::Result,
    models::user::*,
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
use tracing::{debug, info};
use uuid::Uuid;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        // 公开路由
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/:id", get(get_user_profile))
        // 需要认证的路由
        .route("/logout", post(logout))
        .route("/me", get(get_current_user).put(update_current_user))
        .route("/me/premium", post(subscribe_premium))
}

/// 注册
/// POST /api/users/register
async fn register(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    debug!("Registration attempt for {}", request.username);

    let auth = app_state.user_service.register(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": auth
        })),
    ))
}

/// 登录
/// POST /api/users/login
async fn login(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>> {
    let auth = app_state.user_service.login(request).await?;

    Ok(Json(json!({
        "success": true,
        "data": auth
    })))
}

/// 注销：吊销当前令牌
/// POST /api/users/logout
async fn logout(
    State(app_state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Value>> {
    app_state.auth_service.revoke(&user.claims).await?;
    info!("User {} logged out", user.id);

    Ok(Json(json!({
        "success": true,
        "message": "Logged out"
    })))
}

/// 获取当前用户
/// GET /api/users/me
async fn get_current_user(
    State(app_state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Value>> {
    let profile = app_state.user_service.get_user(user.id).await?;

    Ok(Json(json!({
        "success": true,
        "data": profile.to_response()
    })))
}

/// 更新当前用户资料
/// PUT /api/users/me
async fn update_current_user(
    State(app_state): State<Arc<AppState>>,
    user: AuthUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<Value>> {
    let profile = app_state.user_service.update_profile(user.id, request).await?;

    Ok(Json(json!({
        "success": true,
        "data": profile.to_response()
    })))
}

/// 开通/续期会员
/// POST /api/users/me/premium
async fn subscribe_premium(
    State(app_state): State<Arc<AppState>>,
    user: AuthUser,
    Json(request): Json<PremiumRequest>,
) -> Result<Json<Value>> {
    let profile = app_state.user_service.subscribe_premium(user.id, request).await?;

    Ok(Json(json!({
        "success": true,
        "data": profile.to_response()
    })))
}

/// 获取用户公开资料
/// GET /api/users/:id
async fn get_user_profile(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let profile = app_state.user_service.get_user(user_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": profile.to_response()
    })))
}
