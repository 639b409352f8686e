use crate::{
    error::Result,
    models::{marketplace::*, response::paginated_json},
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
        .route("/", post(create_order).get(list_my_orders))
        .route("/vendor", get(list_vendor_orders))
        .route("/:id", get(get_order).patch(update_order_status))
}

/// 下单
/// POST /api/orders
async fn create_order(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    debug!("User {} placing order with {} lines", user.id, request.items.len());

    let order = state.order_service.create_order(user.id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": order
        })),
    ))
}

/// 我的订单
/// GET /api/orders
async fn list_my_orders(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>> {
    let (page, limit) = state.page_params(query.page, query.limit);
    let result = state.order_service.list_my_orders(user.id, page, limit).await?;

    Ok(Json(paginated_json(result)))
}

/// 店铺收到的订单
/// GET /api/orders/vendor
async fn list_vendor_orders(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>> {
    let (page, limit) = state.page_params(query.page, query.limit);
    let result = state
        .order_service
        .list_vendor_orders(user.id, page, limit)
        .await?;

    Ok(Json(paginated_json(result)))
}

/// GET /api/orders/:id
async fn get_order(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let order = state.order_service.get_order(order_id, user.id).await?;

    Ok(Json(json!({
        "success": true,
        "data": order
    })))
}

/// 推进订单状态（发货、送达、取消）
/// PATCH /api/orders/:id
async fn update_order_status(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> Result<Json<Value>> {
    let order = state
        .order_service
        .update_order_status(order_id, user.id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": order
    })))
}
