use crate::{
    error::Result,
    models::{marketplace::*, response::paginated_json},
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
use tracing::{debug, info};
use uuid::Uuid;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        // 公开路由（不需要认证）
        .route("/", get(list_articles))
        .route("/:id", get(get_article).put(update_article).delete(deactivate_article))
        // 需要店铺身份
        .route("/create", post(create_article))
}

/// 获取在售商品列表，可按店铺过滤
/// GET /api/articles?vendor_id=...
async fn list_articles(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<ArticleQuery>,
) -> Result<Json<Value>> {
    debug!("Listing articles with query: {:?}", query);

    let (page, limit) = app_state.page_params(query.page, query.limit);
    let result = app_state
        .article_service
        .list_articles(query.vendor_id, page, limit)
        .await?;

    Ok(Json(paginated_json(result)))
}

/// GET /api/articles/:id
async fn get_article(
    State(app_state): State<Arc<AppState>>,
    Path(article_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let article = app_state.article_service.get_article(article_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": article
    })))
}

/// 上架商品
/// POST /api/articles/create
async fn create_article(
    State(app_state): State<Arc<AppState>>,
    user: AuthUser,
    Json(request): Json<CreateArticleRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let article = app_state.article_service.create_article(user.id, request).await?;
    info!("Article {} listed by user {}", article.id, user.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": article
        })),
    ))
}

/// PUT /api/articles/:id
async fn update_article(
    State(app_state): State<Arc<AppState>>,
    user: AuthUser,
    Path(article_id): Path<Uuid>,
    Json(request): Json<UpdateArticleRequest>,
) -> Result<Json<Value>> {
    let article = app_state
        .article_service
        .update_article(article_id, user.id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": article
    })))
}

/// 下架商品（保留记录，历史订单仍可引用）
/// DELETE /api/articles/:id
async fn deactivate_article(
    State(app_state): State<Arc<AppState>>,
    user: AuthUser,
    Path(article_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let article = app_state
        .article_service
        .deactivate_article(article_id, user.id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": article
    })))
}
