use crate::{
    error::{AppError, Result},
    models::marketplace::*,
    services::{database::offset_for, Database, PaginatedResult, VendorService},
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

/// 商品服务
#[derive(Clone)]
pub struct ArticleService {
    db: Arc<Database>,
    vendor_service: VendorService,
}

impl ArticleService {
    pub async fn new(db: Arc<Database>, vendor_service: VendorService) -> Result<Self> {
        Ok(Self { db, vendor_service })
    }

    pub async fn create_article(&self, user_id: Uuid, request: CreateArticleRequest) -> Result<Article> {
        request.validate()?;
        let vendor = self.vendor_service.require_vendor(user_id).await?;

        let article = sqlx::query_as::<_, Article>(
            r#"
            INSERT INTO articles (id, vendor_id, name, description, price_cents, stock)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(vendor.id)
        .bind(request.name.trim())
        .bind(request.description.as_deref())
        .bind(request.price_cents)
        .bind(request.stock)
        .fetch_one(self.db.pool())
        .await?;

        info!("Vendor {} listed article {}", vendor.id, article.id);
        Ok(article)
    }

    pub async fn list_articles(
        &self,
        vendor_id: Option<Uuid>,
        page: i64,
        limit: i64,
    ) -> Result<PaginatedResult<Article>> {
        debug!("Listing articles (vendor={:?})", vendor_id);

        let articles = sqlx::query_as::<_, Article>(
            r#"
            SELECT * FROM articles
            WHERE is_active AND ($1::UUID IS NULL OR vendor_id = $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(vendor_id)
        .bind(limit)
        .bind(offset_for(page, limit))
        .fetch_all(self.db.pool())
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM articles WHERE is_active AND ($1::UUID IS NULL OR vendor_id = $1)",
        )
        .bind(vendor_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(PaginatedResult::new(articles, total, page, limit))
    }

    pub async fn get_article(&self, article_id: Uuid) -> Result<Article> {
        sqlx::query_as::<_, Article>("SELECT * FROM articles WHERE id = $1")
            .bind(article_id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| AppError::not_found("Article"))
    }

    async fn owned_article(&self, article_id: Uuid, user_id: Uuid) -> Result<Article> {
        let vendor = self.vendor_service.require_vendor(user_id).await?;
        let article = self.get_article(article_id).await?;
        if article.vendor_id != vendor.id {
            return Err(AppError::forbidden("Article belongs to another vendor"));
        }
        Ok(article)
    }

    pub async fn update_article(
        &self,
        article_id: Uuid,
        user_id: Uuid,
        request: UpdateArticleRequest,
    ) -> Result<Article> {
        request.validate()?;
        self.owned_article(article_id, user_id).await?;

        let article = sqlx::query_as::<_, Article>(
            r#"
            UPDATE articles SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                price_cents = COALESCE($4, price_cents),
                stock = COALESCE($5, stock),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(article_id)
        .bind(request.name.as_deref().map(str::trim))
        .bind(request.description.as_deref())
        .bind(request.price_cents)
        .bind(request.stock)
        .bind(request.is_active)
        .fetch_one(self.db.pool())
        .await?;

        info!("Updated article {}", article_id);
        Ok(article)
    }

    /// 下架商品；已有订单引用该商品，因此不做物理删除
    pub async fn deactivate_article(&self, article_id: Uuid, user_id: Uuid) -> Result<Article> {
        self.owned_article(article_id, user_id).await?;

        let article = sqlx::query_as::<_, Article>(
            "UPDATE articles SET is_active = FALSE, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(article_id)
        .fetch_one(self.db.pool())
        .await?;

        info!("Deactivated article {}", article_id);
        Ok(article)
    }
}
