use crate::{
    error::{AppError, Result},
    models::marketplace::*,
    services::Database,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct VendorService {
    db: Arc<Database>,
}

impl VendorService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    pub async fn register_vendor(&self, user_id: Uuid, request: RegisterVendorRequest) -> Result<Vendor> {
        request.validate()?;

        let vendor = sqlx::query_as::<_, Vendor>(
            r#"
            INSERT INTO vendors (id, user_id, shop_name, description)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(request.shop_name.trim())
        .bind(request.description.as_deref())
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "User already has a shop"))?;

        info!("User {} registered shop {}", user_id, vendor.id);
        Ok(vendor)
    }

    pub async fn get_vendor(&self, vendor_id: Uuid) -> Result<Vendor> {
        sqlx::query_as::<_, Vendor>("SELECT * FROM vendors WHERE id = $1")
            .bind(vendor_id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| AppError::not_found("Vendor"))
    }

    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Option<Vendor>> {
        let vendor = sqlx::query_as::<_, Vendor>("SELECT * FROM vendors WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(vendor)
    }

    /// 当前用户的店铺；没有店铺的用户不能执行商家操作
    pub async fn require_vendor(&self, user_id: Uuid) -> Result<Vendor> {
        self.find_by_user(user_id)
            .await?
            .ok_or_else(|| AppError::forbidden("A vendor account is required"))
    }
}
