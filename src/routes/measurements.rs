use crate::{
    error::Result,
    models::measurement::Measurements,
    services::auth::AuthUser,
    state::AppState,
};
use axum::{extract::State, response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/me", get(get_my_measurements).put(upsert_my_measurements))
}

/// 获取本人尺寸，按性别过滤字段；未填写时返回 null
/// GET /api/measurements/me
async fn get_my_measurements(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Value>> {
    let record = state.measurement_service.get_measurements(user.id).await?;

    Ok(Json(json!({
        "success": true,
        "data": record
    })))
}

/// 保存本人尺寸，不属于该性别的字段会被丢弃
/// PUT /api/measurements/me
async fn upsert_my_measurements(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(input): Json<Measurements>,
) -> Result<Json<Value>> {
    let record = state
        .measurement_service
        .upsert_measurements(user.id, input)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": record
    })))
}
