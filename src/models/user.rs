use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::utils::validation::{validate_password_strength, validate_username_format};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

text_enum!(Gender, "gender", {
    Male => "male",
    Female => "female",
});

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub gender: Option<Gender>,
    pub is_premium: bool,
    pub premium_expires_at: Option<DateTime<Utc>>,
    pub follower_count: i64,
    pub following_count: i64,
    pub post_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// 会员是否仍然有效；即使过期清理任务尚未运行，读取时也以过期时间为准
    pub fn has_active_premium(&self, now: DateTime<Utc>) -> bool {
        self.is_premium
            && self
                .premium_expires_at
                .map(|expires_at| expires_at > now)
                .unwrap_or(false)
    }

    pub fn to_response(&self) -> UserResponse {
        UserResponse {
            id: self.id,
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            bio: self.bio.clone(),
            avatar_url: self.avatar_url.clone(),
            gender: self.gender,
            is_premium: self.has_active_premium(Utc::now()),
            premium_expires_at: self.premium_expires_at,
            follower_count: self.follower_count,
            following_count: self.following_count,
            post_count: self.post_count,
            created_at: self.created_at,
        }
    }
}

/// 对外返回的用户资料（不含密码哈希和邮箱）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub gender: Option<Gender>,
    pub is_premium: bool,
    pub premium_expires_at: Option<DateTime<Utc>>,
    pub follower_count: i64,
    pub following_count: i64,
    pub post_count: i64,
    pub created_at: DateTime<Utc>,
}

/// 作者/参与者的精简信息，嵌入到帖子、评论、消息中
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(custom = "validate_username_format")]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(custom = "validate_password_strength")]
    pub password: String,

    #[validate(length(min = 1, max = 50))]
    pub display_name: String,

    pub gender: Option<Gender>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 50))]
    pub display_name: Option<String>,

    #[validate(length(max = 160))]
    pub bio: Option<String>,

    #[validate(url)]
    pub avatar_url: Option<String>,

    pub gender: Option<Gender>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PremiumRequest {
    #[validate(range(min = 1, max = 12))]
    pub months: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

/// 计算续费后的会员到期时间：从当前到期时间与现在中较晚者开始累加
pub fn extend_premium(
    current_expiry: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    months: i64,
) -> DateTime<Utc> {
    let start = match current_expiry {
        Some(expiry) if expiry > now => expiry,
        _ => now,
    };
    start + Duration::days(30 * months)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_premium(is_premium: bool, expires_at: Option<DateTime<Utc>>) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: "maya".to_string(),
            email: "maya@example.com".to_string(),
            password_hash: String::new(),
            display_name: "Maya".to_string(),
            bio: None,
            avatar_url: None,
            gender: Some(Gender::Female),
            is_premium,
            premium_expires_at: expires_at,
            follower_count: 0,
            following_count: 0,
            post_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_premium_expired_before_sweep() {
        let now = Utc::now();
        let user = user_with_premium(true, Some(now - Duration::hours(1)));
        assert!(!user.has_active_premium(now));
        assert!(!user.to_response().is_premium);
    }

    #[test]
    fn test_premium_active() {
        let now = Utc::now();
        assert!(user_with_premium(true, Some(now + Duration::days(3))).has_active_premium(now));
        assert!(!user_with_premium(false, Some(now + Duration::days(3))).has_active_premium(now));
        assert!(!user_with_premium(true, None).has_active_premium(now));
    }

    #[test]
    fn test_extend_premium_stacks_on_future_expiry() {
        let now = Utc::now();
        let future = now + Duration::days(10);

        assert_eq!(extend_premium(Some(future), now, 1), future + Duration::days(30));
        assert_eq!(extend_premium(Some(now - Duration::days(5)), now, 2), now + Duration::days(60));
        assert_eq!(extend_premium(None, now, 1), now + Duration::days(30));
    }

    #[test]
    fn test_gender_text_roundtrip() {
        assert_eq!("female".parse::<Gender>().unwrap(), Gender::Female);
        assert_eq!(Gender::Male.as_str(), "male");
        assert!("other".parse::<Gender>().is_err());
    }

    #[test]
    fn test_register_request_validation() {
        let request = RegisterRequest {
            username: "ab".to_string(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            display_name: "A".to_string(),
            gender: None,
        };

        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }
}
