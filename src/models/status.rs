use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::user::UserSummary;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Status {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: Option<String>,
    pub media_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Status {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateStatusRequest {
    #[validate(length(min = 1, max = 500))]
    pub content: Option<String>,
    #[validate(url)]
    pub media_url: Option<String>,
}

impl CreateStatusRequest {
    pub fn has_body(&self) -> bool {
        self.content.as_ref().map(|c| !c.trim().is_empty()).unwrap_or(false)
            || self.media_url.is_some()
    }
}

/// 状态行 + 发布者信息（用于关注列表的状态聚合）
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StatusWithOwner {
    #[sqlx(flatten)]
    pub status: Status,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStatuses {
    pub user: UserSummary,
    pub statuses: Vec<Status>,
    pub latest_at: DateTime<Utc>,
}

/// 按用户分组，组内按时间正序，组间按最新状态倒序；同时剔除已过期的行
pub fn group_by_user(rows: Vec<StatusWithOwner>, now: DateTime<Utc>) -> Vec<UserStatuses> {
    let mut groups: Vec<UserStatuses> = Vec::new();

    for row in rows.into_iter().filter(|r| !r.status.is_expired(now)) {
        match groups.iter_mut().find(|g| g.user.id == row.status.user_id) {
            Some(group) => {
                if row.status.created_at > group.latest_at {
                    group.latest_at = row.status.created_at;
                }
                group.statuses.push(row.status);
            }
            None => groups.push(UserStatuses {
                user: UserSummary {
                    id: row.status.user_id,
                    username: row.username,
                    display_name: row.display_name,
                    avatar_url: row.avatar_url,
                },
                latest_at: row.status.created_at,
                statuses: vec![row.status],
            }),
        }
    }

    for group in groups.iter_mut() {
        group.statuses.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    }
    groups.sort_by(|a, b| b.latest_at.cmp(&a.latest_at));
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn row(user_id: Uuid, created_minutes_ago: i64, expires_in_minutes: i64) -> StatusWithOwner {
        let now = Utc::now();
        StatusWithOwner {
            status: Status {
                id: Uuid::new_v4(),
                user_id,
                content: Some("status".to_string()),
                media_url: None,
                created_at: now - Duration::minutes(created_minutes_ago),
                expires_at: now + Duration::minutes(expires_in_minutes),
            },
            username: "owner".to_string(),
            display_name: "Owner".to_string(),
            avatar_url: None,
        }
    }

    #[test]
    fn test_expired_status_is_detected() {
        let now = Utc::now();
        let expired = row(Uuid::new_v4(), 60, -1);
        assert!(expired.status.is_expired(now));
        assert!(!row(Uuid::new_v4(), 60, 5).status.is_expired(now));
    }

    #[test]
    fn test_group_by_user_drops_expired_and_orders_groups() {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let rows = vec![
            row(alice, 50, 60),
            row(bob, 5, 60),
            row(alice, 20, 60),
            row(alice, 10, -1),
        ];

        let groups = group_by_user(rows, Utc::now());

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].user.id, bob);
        assert_eq!(groups[1].user.id, alice);
        assert_eq!(groups[1].statuses.len(), 2);
        assert!(groups[1].statuses[0].created_at < groups[1].statuses[1].created_at);
    }

    #[test]
    fn test_create_request_needs_body() {
        let empty = CreateStatusRequest { content: None, media_url: None };
        assert!(!empty.has_body());

        let text = CreateStatusRequest { content: Some("out for lunch".to_string()), media_url: None };
        assert!(text.has_body());
    }
}
