use crate::{
    error::{AppError, Result},
    models::report::*,
    services::Database,
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

/// 举报服务：被举报的用户不会出现在举报人的默认时间线中
#[derive(Clone)]
pub struct ReportService {
    db: Arc<Database>,
}

impl ReportService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    pub async fn report_user(&self, reporter_id: Uuid, request: CreateReportRequest) -> Result<Report> {
        request.validate()?;

        if reporter_id == request.reported_id {
            return Err(AppError::bad_request("Cannot report yourself"));
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(request.reported_id)
            .fetch_one(self.db.pool())
            .await?;
        if !exists {
            return Err(AppError::not_found("User"));
        }

        let report = sqlx::query_as::<_, Report>(
            r#"
            INSERT INTO reports (id, reporter_id, reported_id, reason)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(reporter_id)
        .bind(request.reported_id)
        .bind(request.reason.trim())
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "User already reported"))?;

        info!("User {} reported user {}", reporter_id, request.reported_id);
        Ok(report)
    }

    pub async fn withdraw_report(&self, reporter_id: Uuid, reported_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM reports WHERE reporter_id = $1 AND reported_id = $2")
            .bind(reporter_id)
            .bind(reported_id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Report"));
        }

        info!("User {} withdrew report on {}", reporter_id, reported_id);
        Ok(())
    }

    pub async fn list_my_reports(&self, reporter_id: Uuid) -> Result<Vec<Report>> {
        debug!("Listing reports filed by {}", reporter_id);

        let reports = sqlx::query_as::<_, Report>(
            "SELECT * FROM reports WHERE reporter_id = $1 ORDER BY created_at DESC",
        )
        .bind(reporter_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(reports)
    }

    pub async fn reported_ids(&self, reporter_id: Uuid) -> Result<Vec<Uuid>> {
        let ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT reported_id FROM reports WHERE reporter_id = $1")
                .bind(reporter_id)
                .fetch_all(self.db.pool())
                .await?;

        Ok(ids)
    }
}
