use crate::{
    config::Config,
    error::{AppError, Result},
    services::maintenance::MaintenanceTask,
    state::AppState,
};
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Json,
    routing::post,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

pub const MAINTENANCE_TOKEN_HEADER: &str = "x-maintenance-token";

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/:task", post(run_task))
}

/// 供外部调度器调用的维护入口
/// POST /api/maintenance/:task
async fn run_task(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(task): Path<String>,
) -> Result<Json<Value>> {
    check_maintenance_token(&state.config, &headers)?;

    let task: MaintenanceTask = task.parse()?;
    info!("Maintenance task {} triggered over HTTP", task);

    let report = state.maintenance_service.run(task).await?;

    Ok(Json(json!({
        "success": true,
        "data": report
    })))
}

/// 未配置令牌时拒绝所有调用
fn check_maintenance_token(config: &Config, headers: &HeaderMap) -> Result<()> {
    let provided = headers
        .get(MAINTENANCE_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("Maintenance token required"))?;

    match config.maintenance_token.as_deref() {
        Some(expected) if !expected.is_empty() && expected == provided => Ok(()),
        Some(_) => {
            warn!("Rejected maintenance call with a wrong token");
            Err(AppError::forbidden("Invalid maintenance token"))
        }
        None => Err(AppError::forbidden("Maintenance endpoint is disabled")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};

    fn config_with_token(token: Option<&str>) -> Config {
        Config {
            maintenance_token: token.map(str::to_string),
            ..Config::default()
        }
    }

    #[test]
    fn test_missing_token_is_unauthorized() {
        let err = check_maintenance_token(&config_with_token(Some("s3cret")), &HeaderMap::new())
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_token_must_match() {
        let config = config_with_token(Some("s3cret"));
        let mut headers = HeaderMap::new();

        headers.insert(MAINTENANCE_TOKEN_HEADER, HeaderValue::from_static("guess"));
        let err = check_maintenance_token(&config, &headers).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        headers.insert(MAINTENANCE_TOKEN_HEADER, HeaderValue::from_static("s3cret"));
        assert!(check_maintenance_token(&config, &headers).is_ok());
    }

    #[test]
    fn test_disabled_without_configured_token() {
        let mut headers = HeaderMap::new();
        headers.insert(MAINTENANCE_TOKEN_HEADER, HeaderValue::from_static(""));

        let err = check_maintenance_token(&config_with_token(None), &headers).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        let err = check_maintenance_token(&config_with_token(Some("")), &headers).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }
}
