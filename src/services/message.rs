use crate::{
    config::Config,
    error::{AppError, Result},
    models::{message::*, notification::*},
    services::{database::offset_for, Database, NotificationService, PaginatedResult},
    utils::validation::validate_text_length,
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct MessageService {
    db: Arc<Database>,
    config: Config,
    notification_service: NotificationService,
}

impl MessageService {
    pub async fn new(
        db: Arc<Database>,
        config: &Config,
        notification_service: NotificationService,
    ) -> Result<Self> {
        Ok(Self {
            db,
            config: config.clone(),
            notification_service,
        })
    }

    pub async fn send_message(&self, sender_id: Uuid, request: SendMessageRequest) -> Result<Message> {
        request.validate()?;

        if sender_id == request.recipient_id {
            return Err(AppError::bad_request("Cannot send a message to yourself"));
        }

        let content = request.content.trim();
        if content.is_empty() {
            return Err(AppError::validation("Message cannot be empty"));
        }
        validate_text_length("Message", content, self.config.max_message_length)?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(request.recipient_id)
            .fetch_one(self.db.pool())
            .await?;
        if !exists {
            return Err(AppError::not_found("Recipient"));
        }

        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (id, sender_id, recipient_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(sender_id)
        .bind(request.recipient_id)
        .bind(content)
        .fetch_one(self.db.pool())
        .await?;

        self.notification_service
            .notify(CreateNotificationRequest {
                recipient_id: request.recipient_id,
                actor_id: Some(sender_id),
                notification_type: NotificationType::Message,
                message: "sent you a message".to_string(),
                ..Default::default()
            })
            .await;

        info!("Message {} sent from {} to {}", message.id, sender_id, request.recipient_id);
        Ok(message)
    }

    pub async fn list_conversations(&self, user_id: Uuid) -> Result<Vec<ConversationSummary>> {
        debug!("Listing conversations for user {}", user_id);

        let mut conversations = sqlx::query_as::<_, ConversationSummary>(
            r#"
            WITH exchanged AS (
                SELECT
                    CASE WHEN m.sender_id = $1 THEN m.recipient_id ELSE m.sender_id END AS partner_id,
                    m.id,
                    m.sender_id,
                    m.content,
                    m.created_at
                FROM messages m
                WHERE m.sender_id = $1 OR m.recipient_id = $1
            ),
            latest AS (
                SELECT DISTINCT ON (partner_id)
                    partner_id,
                    id AS last_message_id,
                    sender_id AS last_sender_id,
                    content AS last_content,
                    created_at AS last_message_at
                FROM exchanged
                ORDER BY partner_id, created_at DESC, id DESC
            )
            SELECT
                l.*,
                u.username AS partner_username,
                u.display_name AS partner_display_name,
                u.avatar_url AS partner_avatar_url,
                (
                    SELECT COUNT(*) FROM messages x
                    WHERE x.sender_id = l.partner_id AND x.recipient_id = $1 AND x.is_read = FALSE
                ) AS unread_count
            FROM latest l
            JOIN users u ON u.id = l.partner_id
            "#,
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        sort_conversations(&mut conversations);
        Ok(conversations)
    }

    pub async fn get_conversation(
        &self,
        user_id: Uuid,
        partner_id: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<PaginatedResult<Message>> {
        debug!("Loading conversation between {} and {}", user_id, partner_id);

        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT * FROM messages
            WHERE (sender_id = $1 AND recipient_id = $2)
               OR (sender_id = $2 AND recipient_id = $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(partner_id)
        .bind(limit)
        .bind(offset_for(page, limit))
        .fetch_all(self.db.pool())
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM messages
            WHERE (sender_id = $1 AND recipient_id = $2)
               OR (sender_id = $2 AND recipient_id = $1)
            "#,
        )
        .bind(user_id)
        .bind(partner_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(PaginatedResult::new(messages, total, page, limit))
    }

    /// 将对方发来的未读消息全部标记为已读
    pub async fn mark_conversation_read(&self, user_id: Uuid, partner_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE messages SET is_read = TRUE, read_at = NOW()
            WHERE sender_id = $1 AND recipient_id = $2 AND is_read = FALSE
            "#,
        )
        .bind(partner_id)
        .bind(user_id)
        .execute(self.db.pool())
        .await?;

        debug!("Marked {} messages from {} read", result.rows_affected(), partner_id);
        Ok(result.rows_affected())
    }
}
