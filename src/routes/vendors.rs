use crate::{
    error::{AppError, Result},
    models::marketplace::RegisterVendorRequest,
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
        .route("/", post(register_vendor))
        .route("/me", get(get_my_vendor))
        .route("/:id", get(get_vendor))
}

/// 开店
/// POST /api/vendors
async fn register_vendor(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(request): Json<RegisterVendorRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let vendor = state.vendor_service.register_vendor(user.id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": vendor
        })),
    ))
}

/// GET /api/vendors/me
async fn get_my_vendor(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Value>> {
    let vendor = state
        .vendor_service
        .find_by_user(user.id)
        .await?
        .ok_or_else(|| AppError::not_found("Vendor"))?;

    Ok(Json(json!({
        "success": true,
        "data": vendor
    })))
}

/// GET /api/vendors/:id
async fn get_vendor(
    State(state): State<Arc<AppState>>,
    Path(vendor_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let vendor = state.vendor_service.get_vendor(vendor_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": vendor
    })))
}
