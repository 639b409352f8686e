use crate::{error::AppError, services::auth::AuthUser, state::AppState};
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use governor::{clock::DefaultClock, state::keyed::DashMapStateStore, Quota, RateLimiter};
use std::{net::SocketAddr, num::NonZeroU32, sync::Arc};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

type KeyedRateLimiter = RateLimiter<String, DashMapStateStore<String>, DefaultClock>;
static RATE_LIMITER: OnceCell<KeyedRateLimiter> = OnceCell::const_new();

const RATE_LIMIT_BURST: u32 = 10;

/// 从 Authorization 头中取出 Bearer 令牌
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// 认证中间件
///
/// 令牌有效且未被吊销时把 `AuthUser` 写入请求扩展；否则按未认证请求继续处理，
/// 需要登录的处理器会通过 `AuthUser` 提取器返回 401。
pub async fn auth_middleware(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request<Body>,
    next: Next<Body>,
) -> Response {
    if let Some(token) = bearer_token(&headers) {
        match app_state.auth_service.authenticate(token).await {
            Ok(user) => {
                debug!("Authenticated user: {} ({})", user.id, user.username);
                request.extensions_mut().insert(user);
            }
            Err(AppError::Authentication(reason)) => {
                debug!("Rejected bearer token: {}", reason);
            }
            Err(e) => {
                warn!("Token check failed, continuing unauthenticated: {}", e);
            }
        }
    }

    next.run(request).await
}

/// 速率限制中间件
pub async fn rate_limit_middleware(
    State(app_state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next<Body>,
) -> Result<Response, AppError> {
    // 获取或创建速率限制器
    let rate_limiter = RATE_LIMITER
        .get_or_try_init(|| async {
            let per_minute = NonZeroU32::new(app_state.config.rate_limit_requests)
                .ok_or_else(|| AppError::internal("RATE_LIMIT_REQUESTS must be positive"))?;
            let burst = NonZeroU32::new(RATE_LIMIT_BURST)
                .ok_or_else(|| AppError::internal("rate limit burst must be positive"))?;
            Ok::<_, AppError>(RateLimiter::dashmap(Quota::per_minute(per_minute).allow_burst(burst)))
        })
        .await?;

    let client_ip = get_client_ip(&request);

    match rate_limiter.check_key(&client_ip) {
        Ok(_) => Ok(next.run(request).await),
        Err(_) => {
            warn!("Rate limit exceeded for IP: {}", client_ip);
            Err(AppError::RateLimitExceeded)
        }
    }
}

/// 请求 ID 中间件
pub async fn request_id_middleware(mut request: Request<Body>, next: Next<Body>) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();

    request.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }

    response
}

/// 获取客户端 IP 地址
fn get_client_ip(request: &Request<Body>) -> String {
    let headers = request.headers();

    // 检查常见的代理头
    if let Some(ip) = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
    {
        return ip.trim().to_string();
    }

    if let Some(ip) = headers.get("x-real-ip").and_then(|h| h.to_str().ok()) {
        return ip.to_string();
    }

    request
        .extensions()
        .get::<axum::extract::ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// 请求 ID 包装器
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// 可选认证提取器
pub struct OptionalAuth(pub Option<AuthUser>);

#[async_trait::async_trait]
impl<S> axum::extract::FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuth(parts.extensions.get::<AuthUser>().cloned()))
    }
}

impl OptionalAuth {
    pub fn user_id(&self) -> Option<uuid::Uuid> {
        self.0.as_ref().map(|user| user.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert("authorization", HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(bearer_token(&headers), None);

        headers.insert("authorization", HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_client_ip_prefers_forwarded_header() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(get_client_ip(&request), "203.0.113.7");

        let bare = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(get_client_ip(&bare), "unknown");
    }
}
