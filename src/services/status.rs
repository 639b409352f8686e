use crate::{
    config::Config,
    error::{AppError, Result},
    models::status::*,
    services::{Database, FollowService},
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

/// 限时状态；过期的行在清理任务运行前也不会被读出
#[derive(Clone)]
pub struct StatusService {
    db: Arc<Database>,
    config: Config,
    follow_service: FollowService,
}

impl StatusService {
    pub async fn new(db: Arc<Database>, config: &Config, follow_service: FollowService) -> Result<Self> {
        Ok(Self {
            db,
            config: config.clone(),
            follow_service,
        })
    }

    pub async fn create_status(&self, user_id: Uuid, request: CreateStatusRequest) -> Result<Status> {
        request.validate()?;
        if !request.has_body() {
            return Err(AppError::validation("Status must have content or media"));
        }

        let now = Utc::now();
        let expires_at = now + Duration::hours(self.config.status_ttl_hours);

        let status = sqlx::query_as::<_, Status>(
            r#"
            INSERT INTO statuses (id, user_id, content, media_url, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(request.content.as_deref().map(str::trim))
        .bind(request.media_url.as_deref())
        .bind(now)
        .bind(expires_at)
        .fetch_one(self.db.pool())
        .await?;

        info!("User {} posted status {} (expires {})", user_id, status.id, expires_at);
        Ok(status)
    }

    pub async fn get_user_statuses(&self, user_id: Uuid) -> Result<Vec<Status>> {
        debug!("Getting active statuses for user {}", user_id);

        let statuses = sqlx::query_as::<_, Status>(
            r#"
            SELECT * FROM statuses
            WHERE user_id = $1 AND expires_at > NOW()
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(statuses)
    }

    pub async fn get_status_by_id(&self, status_id: Uuid) -> Result<Status> {
        sqlx::query_as::<_, Status>("SELECT * FROM statuses WHERE id = $1 AND expires_at > NOW()")
            .bind(status_id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| AppError::not_found("Status"))
    }

    /// 关注的人和自己当前有效的状态，按用户分组
    pub async fn get_feed_statuses(&self, viewer_id: Uuid) -> Result<Vec<UserStatuses>> {
        let mut circle = self.follow_service.followee_ids(viewer_id).await?;
        circle.push(viewer_id);

        let rows = sqlx::query_as::<_, StatusWithOwner>(
            r#"
            SELECT s.*, u.username, u.display_name, u.avatar_url
            FROM statuses s
            JOIN users u ON u.id = s.user_id
            WHERE s.user_id = ANY($1) AND s.expires_at > NOW()
            ORDER BY s.created_at DESC
            "#,
        )
        .bind(&circle)
        .fetch_all(self.db.pool())
        .await?;

        Ok(group_by_user(rows, Utc::now()))
    }

    pub async fn delete_status(&self, status_id: Uuid, user_id: Uuid) -> Result<()> {
        let owner: Option<Uuid> = sqlx::query_scalar("SELECT user_id FROM statuses WHERE id = $1")
            .bind(status_id)
            .fetch_optional(self.db.pool())
            .await?;

        match owner {
            None => return Err(AppError::not_found("Status")),
            Some(owner) if owner != user_id => {
                return Err(AppError::forbidden("Only the owner can delete this status"))
            }
            Some(_) => {}
        }

        sqlx::query("DELETE FROM statuses WHERE id = $1")
            .bind(status_id)
            .execute(self.db.pool())
            .await?;

        info!("Deleted status {}", status_id);
        Ok(())
    }
}
