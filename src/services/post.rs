use crate::{
    config::Config,
    error::{AppError, Result},
    models::{notification::*, post::*},
    services::{database::offset_for, Database, NotificationService, PaginatedResult},
    utils::validation::{validate_media_urls, validate_text_length},
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

/// 帖子与作者信息的公共查询片段
pub(crate) const POST_WITH_AUTHOR_SELECT: &str = r#"
    SELECT
        p.*,
        u.username AS author_username,
        u.display_name AS author_display_name,
        u.avatar_url AS author_avatar_url
    FROM posts p
    JOIN users u ON u.id = p.author_id
"#;

#[derive(Clone)]
pub struct PostService {
    db: Arc<Database>,
    config: Config,
    notification_service: NotificationService,
}

impl PostService {
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

    fn validate_body(&self, content: Option<&str>, media_urls: &[String]) -> Result<()> {
        if let Some(content) = content {
            validate_text_length("Post content", content, self.config.max_post_length)?;
        }
        validate_media_urls(media_urls)
    }

    pub async fn create_post(&self, author_id: Uuid, request: CreatePostRequest) -> Result<Post> {
        request.validate()?;
        if !request.has_body() {
            return Err(AppError::validation("Post must have content or media"));
        }
        self.validate_body(request.content.as_deref(), &request.media_urls)?;

        debug!("Creating post for user {}", author_id);

        let mut tx = self.db.begin().await?;

        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (id, author_id, content, media_urls, visibility)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(author_id)
        .bind(request.content.as_deref().map(str::trim).unwrap_or_default())
        .bind(&request.media_urls)
        .bind(request.visibility)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE users SET post_count = post_count + 1 WHERE id = $1")
            .bind(author_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!("Created post {} by user {}", post.id, author_id);
        Ok(post)
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Option<PostWithAuthor>> {
        let query = format!("{} WHERE p.id = $1", POST_WITH_AUTHOR_SELECT);
        let post = sqlx::query_as::<_, PostWithAuthor>(&query)
            .bind(post_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(post)
    }

    /// 获取对查看者可见的帖子；私密帖对其他人表现为不存在
    pub async fn get_visible_post(&self, post_id: Uuid, viewer_id: Option<Uuid>) -> Result<PostWithAuthor> {
        self.find_post(post_id)
            .await?
            .filter(|p| p.post.is_visible_to(viewer_id))
            .ok_or_else(|| AppError::not_found("Post"))
    }

    pub async fn get_post(&self, post_id: Uuid, viewer_id: Option<Uuid>) -> Result<PostWithAuthor> {
        debug!("Getting post {}", post_id);

        let mut post = self.get_visible_post(post_id, viewer_id).await?;

        if viewer_id != Some(post.post.author_id) {
            let views: i64 = sqlx::query_scalar(
                "UPDATE posts SET view_count = view_count + 1 WHERE id = $1 RETURNING view_count",
            )
            .bind(post_id)
            .fetch_one(self.db.pool())
            .await?;
            post.post.view_count = views;
        }

        Ok(post)
    }

    pub async fn list_posts(
        &self,
        viewer_id: Option<Uuid>,
        page: i64,
        limit: i64,
    ) -> Result<PaginatedResult<PostWithAuthor>> {
        debug!("Listing posts for viewer {:?}", viewer_id);

        let query = format!(
            "{} WHERE (p.visibility = 'public' OR p.author_id = $1) \
             ORDER BY p.created_at DESC, p.id DESC LIMIT $2 OFFSET $3",
            POST_WITH_AUTHOR_SELECT
        );
        let posts = sqlx::query_as::<_, PostWithAuthor>(&query)
            .bind(viewer_id)
            .bind(limit)
            .bind(offset_for(page, limit))
            .fetch_all(self.db.pool())
            .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM posts WHERE visibility = 'public' OR author_id = $1",
        )
        .bind(viewer_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(PaginatedResult::new(posts, total, page, limit))
    }

    pub async fn list_user_posts(
        &self,
        user_id: Uuid,
        viewer_id: Option<Uuid>,
        page: i64,
        limit: i64,
    ) -> Result<PaginatedResult<PostWithAuthor>> {
        debug!("Listing posts of user {}", user_id);

        let include_private = viewer_id == Some(user_id);

        let query = format!(
            "{} WHERE p.author_id = $1 AND ($2 OR p.visibility = 'public') \
             ORDER BY p.created_at DESC, p.id DESC LIMIT $3 OFFSET $4",
            POST_WITH_AUTHOR_SELECT
        );
        let posts = sqlx::query_as::<_, PostWithAuthor>(&query)
            .bind(user_id)
            .bind(include_private)
            .bind(limit)
            .bind(offset_for(page, limit))
            .fetch_all(self.db.pool())
            .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM posts WHERE author_id = $1 AND ($2 OR visibility = 'public')",
        )
        .bind(user_id)
        .bind(include_private)
        .fetch_one(self.db.pool())
        .await?;

        Ok(PaginatedResult::new(posts, total, page, limit))
    }

    pub async fn update_post(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        request: UpdatePostRequest,
    ) -> Result<Post> {
        request.validate()?;

        let existing = self.get_visible_post(post_id, Some(user_id)).await?.post;
        if existing.author_id != user_id {
            return Err(AppError::forbidden("Only the author can edit this post"));
        }

        let content = request.content.as_deref().map(str::trim);
        let media_urls = request.media_urls.unwrap_or(existing.media_urls);
        self.validate_body(content, &media_urls)?;

        let new_content = content.unwrap_or(existing.content.as_str());
        if new_content.is_empty() && media_urls.is_empty() {
            return Err(AppError::validation("Post must have content or media"));
        }

        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts SET
                content = $2,
                media_urls = $3,
                visibility = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(post_id)
        .bind(new_content)
        .bind(&media_urls)
        .bind(request.visibility.unwrap_or(existing.visibility))
        .fetch_one(self.db.pool())
        .await?;

        info!("Updated post {}", post_id);
        Ok(post)
    }

    pub async fn delete_post(&self, post_id: Uuid, user_id: Uuid) -> Result<()> {
        let mut tx = self.db.begin().await?;

        let author_id: Option<Uuid> =
            sqlx::query_scalar("SELECT author_id FROM posts WHERE id = $1 FOR UPDATE")
                .bind(post_id)
                .fetch_optional(&mut *tx)
                .await?;

        match author_id {
            None => return Err(AppError::not_found("Post")),
            Some(author) if author != user_id => {
                return Err(AppError::forbidden("Only the author can delete this post"))
            }
            Some(_) => {}
        }

        sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE users SET post_count = GREATEST(post_count - 1, 0) WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!("Deleted post {} by user {}", post_id, user_id);
        Ok(())
    }

    pub async fn share_post(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        request: SharePostRequest,
    ) -> Result<Retweet> {
        request.validate()?;
        debug!("User {} sharing post {}", user_id, post_id);

        let mut tx = self.db.begin().await?;

        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1 FOR UPDATE")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await?
            .filter(|p| p.is_visible_to(Some(user_id)))
            .ok_or_else(|| AppError::not_found("Post"))?;

        let retweet = sqlx::query_as::<_, Retweet>(
            r#"
            INSERT INTO retweets (id, user_id, post_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(post_id)
        .bind(request.content.as_deref().map(str::trim).filter(|c| !c.is_empty()))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Post already shared"))?;

        sqlx::query("UPDATE posts SET share_count = share_count + 1 WHERE id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.notification_service
            .notify(CreateNotificationRequest {
                recipient_id: post.author_id,
                actor_id: Some(user_id),
                notification_type: NotificationType::Share,
                post_id: Some(post_id),
                message: "shared your post".to_string(),
                ..Default::default()
            })
            .await;

        info!("User {} shared post {} as {}", user_id, post_id, retweet.id);
        Ok(retweet)
    }

    pub async fn delete_retweet(&self, user_id: Uuid, retweet_id: Uuid) -> Result<()> {
        let mut tx = self.db.begin().await?;

        let retweet = sqlx::query_as::<_, Retweet>("SELECT * FROM retweets WHERE id = $1 FOR UPDATE")
            .bind(retweet_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found("Retweet"))?;

        if retweet.user_id != user_id {
            return Err(AppError::forbidden("Only the sharer can remove this retweet"));
        }

        sqlx::query("DELETE FROM retweets WHERE id = $1")
            .bind(retweet_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE posts SET share_count = GREATEST(share_count - 1, 0) WHERE id = $1")
            .bind(retweet.post_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!("Removed retweet {} of post {}", retweet_id, retweet.post_id);
        Ok(())
    }
}
