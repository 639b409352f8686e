use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Follow {
    pub follower_id: Uuid,
    pub following_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FollowUserInfo {
    pub user_id: Uuid,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub follower_count: i64,
    pub followed_at: DateTime<Utc>,
    #[sqlx(default)]
    pub is_following: bool,
    #[sqlx(default)]
    pub is_followed_back: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowStats {
    pub followers_count: i64,
    pub following_count: i64,
    pub is_following: bool,
    pub is_followed_by: bool,
}
