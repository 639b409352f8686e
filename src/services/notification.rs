use crate::{
    error::{AppError, Result},
    models::notification::*,
    services::{database::offset_for, Database, PaginatedResult},
};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct NotificationService {
    db: Arc<Database>,
}

impl NotificationService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    pub async fn create_notification(
        &self,
        request: CreateNotificationRequest,
    ) -> Result<Option<Notification>> {
        if request.is_self_notification() {
            return Ok(None);
        }

        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications
                (id, recipient_id, actor_id, notification_type, post_id, comment_id, order_id, message)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.recipient_id)
        .bind(request.actor_id)
        .bind(request.notification_type)
        .bind(request.post_id)
        .bind(request.comment_id)
        .bind(request.order_id)
        .bind(&request.message)
        .fetch_one(self.db.pool())
        .await?;

        debug!(
            "Created {} notification for user {}",
            notification.notification_type, notification.recipient_id
        );
        Ok(Some(notification))
    }

    /// 发送通知，失败只记录日志，不影响调用方
    pub async fn notify(&self, request: CreateNotificationRequest) {
        let kind = request.notification_type;
        let recipient = request.recipient_id;
        if let Err(e) = self.create_notification(request).await {
            warn!("Failed to send {} notification to {}: {}", kind, recipient, e);
        }
    }

    pub async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        page: i64,
        limit: i64,
    ) -> Result<PaginatedResult<Notification>> {
        debug!("Listing notifications for user {} (unread_only={})", user_id, unread_only);

        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE recipient_id = $1 AND ($2 = FALSE OR is_read = FALSE)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .bind(limit)
        .bind(offset_for(page, limit))
        .fetch_all(self.db.pool())
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM notifications
            WHERE recipient_id = $1 AND ($2 = FALSE OR is_read = FALSE)
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_one(self.db.pool())
        .await?;

        Ok(PaginatedResult::new(notifications, total, page, limit))
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(count)
    }

    pub async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<Notification> {
        sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications SET is_read = TRUE
            WHERE id = $1 AND recipient_id = $2
            RETURNING *
            "#,
        )
        .bind(notification_id)
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or_else(|| AppError::not_found("Notification"))
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE recipient_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(self.db.pool())
        .await?;

        debug!("Marked {} notifications read for user {}", result.rows_affected(), user_id);
        Ok(result.rows_affected())
    }
}
