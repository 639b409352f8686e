use crate::{
    error::Result,
    models::marketplace::{ConfirmPaymentRequest, CreatePaymentRequest},
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
use tracing::info;
use uuid::Uuid;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_payment))
        .route("/:id", get(get_payment))
        .route("/:id/confirm", post(confirm_payment))
        .route("/:id/fail", post(fail_payment))
}

/// 为待支付订单发起支付
/// POST /api/payments
async fn create_payment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let payment = state.payment_service.create_payment(user.id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": payment
        })),
    ))
}

/// 确认支付成功，订单进入已支付
/// POST /api/payments/:id/confirm
async fn confirm_payment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(payment_id): Path<Uuid>,
    Json(request): Json<ConfirmPaymentRequest>,
) -> Result<Json<Value>> {
    let payment = state
        .payment_service
        .confirm_payment(user.id, payment_id, request)
        .await?;
    info!("Payment {} confirmed for order {}", payment.id, payment.order_id);

    Ok(Json(json!({
        "success": true,
        "data": payment
    })))
}

/// POST /api/payments/:id/fail
async fn fail_payment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let payment = state.payment_service.fail_payment(user.id, payment_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": payment
    })))
}

/// GET /api/payments/:id
async fn get_payment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let payment = state.payment_service.get_payment(user.id, payment_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": payment
    })))
}
