use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub content: String,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendMessageRequest {
    pub recipient_id: Uuid,
    #[validate(length(min = 1))]
    pub content: String,
}

/// 会话列表中的一项：对方信息、最后一条消息和未读数
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ConversationSummary {
    pub partner_id: Uuid,
    pub partner_username: String,
    pub partner_display_name: String,
    pub partner_avatar_url: Option<String>,
    pub last_message_id: Uuid,
    pub last_sender_id: Uuid,
    pub last_content: String,
    pub last_message_at: DateTime<Utc>,
    pub unread_count: i64,
}

/// 会话按最后一条消息时间倒序
pub fn sort_conversations(conversations: &mut [ConversationSummary]) {
    conversations.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn summary(minutes_ago: i64) -> ConversationSummary {
        ConversationSummary {
            partner_id: Uuid::new_v4(),
            partner_username: "partner".to_string(),
            partner_display_name: "Partner".to_string(),
            partner_avatar_url: None,
            last_message_id: Uuid::new_v4(),
            last_sender_id: Uuid::new_v4(),
            last_content: "hey".to_string(),
            last_message_at: Utc::now() - Duration::minutes(minutes_ago),
            unread_count: 0,
        }
    }

    #[test]
    fn test_sort_conversations_newest_first() {
        let mut conversations = vec![summary(30), summary(1), summary(10)];
        let newest = conversations[1].partner_id;

        sort_conversations(&mut conversations);

        assert_eq!(conversations[0].partner_id, newest);
        assert!(conversations[1].last_message_at > conversations[2].last_message_at);
    }
}
