use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub actor_id: Option<Uuid>,
    pub notification_type: NotificationType,
    pub post_id: Option<Uuid>,
    pub comment_id: Option<Uuid>,
    pub order_id: Option<Uuid>,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateNotificationRequest {
    pub recipient_id: Uuid,
    pub actor_id: Option<Uuid>,
    pub notification_type: NotificationType,
    pub post_id: Option<Uuid>,
    pub comment_id: Option<Uuid>,
    pub order_id: Option<Uuid>,
    pub message: String,
}

impl CreateNotificationRequest {
    /// 自己对自己的操作不产生通知
    pub fn is_self_notification(&self) -> bool {
        self.actor_id == Some(self.recipient_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    #[default]
    Follow,
    Comment,
    Reaction,
    Share,
    Message,
    Order,
}

text_enum!(NotificationType, "notification type", {
    Follow => "follow",
    Comment => "comment",
    Reaction => "reaction",
    Share => "share",
    Message => "message",
    Order => "order",
});

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(default)]
    pub unread_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_notification_detected() {
        let user = Uuid::new_v4();
        let request = CreateNotificationRequest {
            recipient_id: user,
            actor_id: Some(user),
            notification_type: NotificationType::Reaction,
            message: "reacted".to_string(),
            ..Default::default()
        };
        assert!(request.is_self_notification());

        let other = CreateNotificationRequest {
            actor_id: Some(Uuid::new_v4()),
            ..request
        };
        assert!(!other.is_self_notification());
    }
}
