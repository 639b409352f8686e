use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

text_enum!(Visibility, "visibility", {
    Public => "public",
    Private => "private",
});

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub media_urls: Vec<String>,
    pub visibility: Visibility,
    pub comment_count: i64,
    pub share_count: i64,
    pub view_count: i64,
    pub reaction_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// 私密帖子只有作者本人可见
    pub fn is_visible_to(&self, viewer_id: Option<Uuid>) -> bool {
        self.visibility == Visibility::Public || viewer_id == Some(self.author_id)
    }
}

/// 带作者信息的帖子
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostWithAuthor {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub post: Post,
    pub author_username: String,
    pub author_display_name: String,
    pub author_avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Retweet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePostRequest {
    pub content: Option<String>,
    #[serde(default)]
    pub media_urls: Vec<String>,
    #[serde(default)]
    pub visibility: Visibility,
}

impl CreatePostRequest {
    pub fn has_body(&self) -> bool {
        let has_text = self
            .content
            .as_ref()
            .map(|c| !c.trim().is_empty())
            .unwrap_or(false);
        has_text || !self.media_urls.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdatePostRequest {
    pub content: Option<String>,
    pub media_urls: Option<Vec<String>>,
    pub visibility: Option<Visibility>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SharePostRequest {
    #[validate(length(max = 1000))]
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(visibility: Visibility, author_id: Uuid) -> Post {
        let now = Utc::now();
        Post {
            id: Uuid::new_v4(),
            author_id,
            content: "hello".to_string(),
            media_urls: vec![],
            visibility,
            comment_count: 0,
            share_count: 0,
            view_count: 0,
            reaction_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_private_post_visible_only_to_author() {
        let author = Uuid::new_v4();
        let private = post(Visibility::Private, author);

        assert!(private.is_visible_to(Some(author)));
        assert!(!private.is_visible_to(Some(Uuid::new_v4())));
        assert!(!private.is_visible_to(None));
        assert!(post(Visibility::Public, author).is_visible_to(None));
    }

    #[test]
    fn test_create_request_requires_body() {
        let empty = CreatePostRequest {
            content: Some("   ".to_string()),
            media_urls: vec![],
            visibility: Visibility::Public,
        };
        assert!(!empty.has_body());

        let media_only = CreatePostRequest {
            content: None,
            media_urls: vec!["https://cdn.example.com/1.jpg".to_string()],
            visibility: Visibility::Private,
        };
        assert!(media_only.has_body());
    }

    #[test]
    fn test_visibility_defaults_to_public() {
        let request: CreatePostRequest = serde_json::from_str(r#"{"content":"hi"}"#).unwrap();
        assert_eq!(request.visibility, Visibility::Public);
    }
}
