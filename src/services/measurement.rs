use crate::{
    error::{AppError, Result},
    models::{measurement::*, user::Gender},
    services::Database,
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct MeasurementService {
    db: Arc<Database>,
}

impl MeasurementService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    async fn gender_of(&self, user_id: Uuid) -> Result<Gender> {
        let gender: Option<Option<Gender>> =
            sqlx::query_scalar("SELECT gender FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(self.db.pool())
                .await?;

        gender
            .ok_or_else(|| AppError::not_found("User"))?
            .ok_or_else(|| AppError::bad_request("Set your gender before recording measurements"))
    }

    pub async fn get_measurements(&self, user_id: Uuid) -> Result<Option<MeasurementRecord>> {
        let gender = self.gender_of(user_id).await?;

        let record = sqlx::query_as::<_, MeasurementRecord>(
            "SELECT * FROM measurements WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        // 读取时同样按性别过滤，性别变更后旧字段不会泄露
        Ok(record.map(|mut r| {
            r.values = r.values.restricted_to(gender);
            r
        }))
    }

    /// 只写入该性别允许的字段，其余列置空
    pub async fn upsert_measurements(
        &self,
        user_id: Uuid,
        input: Measurements,
    ) -> Result<MeasurementRecord> {
        let gender = self.gender_of(user_id).await?;
        let values = input.restricted_to(gender);
        values.validate_values()?;

        debug!("Saving {} measurements for user {}", gender, user_id);

        let record = sqlx::query_as::<_, MeasurementRecord>(
            r#"
            INSERT INTO measurements (
                user_id, height, weight, chest, bust, underbust, waist, hips, neck,
                shoulder_width, arm_length, inseam, thigh, shoe_size, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                height = EXCLUDED.height,
                weight = EXCLUDED.weight,
                chest = EXCLUDED.chest,
                bust = EXCLUDED.bust,
                underbust = EXCLUDED.underbust,
                waist = EXCLUDED.waist,
                hips = EXCLUDED.hips,
                neck = EXCLUDED.neck,
                shoulder_width = EXCLUDED.shoulder_width,
                arm_length = EXCLUDED.arm_length,
                inseam = EXCLUDED.inseam,
                thigh = EXCLUDED.thigh,
                shoe_size = EXCLUDED.shoe_size,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(values.height)
        .bind(values.weight)
        .bind(values.chest)
        .bind(values.bust)
        .bind(values.underbust)
        .bind(values.waist)
        .bind(values.hips)
        .bind(values.neck)
        .bind(values.shoulder_width)
        .bind(values.arm_length)
        .bind(values.inseam)
        .bind(values.thigh)
        .bind(values.shoe_size)
        .fetch_one(self.db.pool())
        .await?;

        info!("Updated measurements for user {}", user_id);
        Ok(record)
    }
}
