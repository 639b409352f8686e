use crate::{
    error::Result,
    models::report::CreateReportRequest,
    services::auth::AuthUser,
    state::AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(report_user).get(list_my_reports))
        .route("/:user_id", delete(withdraw_report))
}

/// 举报用户，被举报者的内容不再出现在举报者的时间线里
/// POST /api/reports
async fn report_user(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(request): Json<CreateReportRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let report = state.report_service.report_user(user.id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": report
        })),
    ))
}

/// GET /api/reports
async fn list_my_reports(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Value>> {
    let reports = state.report_service.list_my_reports(user.id).await?;

    Ok(Json(json!({
        "success": true,
        "data": reports
    })))
}

/// 撤回举报
/// DELETE /api/reports/:user_id
async fn withdraw_report(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(reported_id): Path<Uuid>,
) -> Result<Json<Value>> {
    state.report_service.withdraw_report(user.id, reported_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Report withdrawn"
    })))
}
