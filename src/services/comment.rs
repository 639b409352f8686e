use crate::{
    config::Config,
    error::{AppError, Result},
    models::{comment::*, notification::*, post::Post},
    services::{database::offset_for, Database, NotificationService, PaginatedResult},
    utils::validation::validate_text_length,
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct CommentService {
    db: Arc<Database>,
    config: Config,
    notification_service: NotificationService,
}

impl CommentService {
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

    pub async fn create_comment(
        &self,
        author_id: Uuid,
        request: CreateCommentRequest,
    ) -> Result<Comment> {
        request.validate()?;
        let content = request.content.trim();
        if content.is_empty() {
            return Err(AppError::validation("Comment cannot be empty"));
        }
        validate_text_length("Comment", content, self.config.max_comment_length)?;

        debug!("User {} commenting on post {}", author_id, request.post_id);

        let mut tx = self.db.begin().await?;

        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1 FOR UPDATE")
            .bind(request.post_id)
            .fetch_optional(&mut *tx)
            .await?
            .filter(|p| p.is_visible_to(Some(author_id)))
            .ok_or_else(|| AppError::not_found("Post"))?;

        // 回复必须属于同一篇帖子
        let parent_author = match request.parent_id {
            Some(parent_id) => {
                let parent: Option<(Uuid, Uuid)> =
                    sqlx::query_as("SELECT post_id, author_id FROM comments WHERE id = $1")
                        .bind(parent_id)
                        .fetch_optional(&mut *tx)
                        .await?;
                match parent {
                    Some((post_id, parent_author)) if post_id == post.id => Some(parent_author),
                    Some(_) => {
                        return Err(AppError::bad_request(
                            "Parent comment belongs to a different post",
                        ))
                    }
                    None => return Err(AppError::not_found("Parent comment")),
                }
            }
            None => None,
        };

        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (id, post_id, author_id, parent_id, content)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(post.id)
        .bind(author_id)
        .bind(request.parent_id)
        .bind(content)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE posts SET comment_count = comment_count + 1 WHERE id = $1")
            .bind(post.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.notification_service
            .notify(CreateNotificationRequest {
                recipient_id: post.author_id,
                actor_id: Some(author_id),
                notification_type: NotificationType::Comment,
                post_id: Some(post.id),
                comment_id: Some(comment.id),
                message: "commented on your post".to_string(),
                ..Default::default()
            })
            .await;

        if let Some(parent_author) = parent_author.filter(|a| *a != post.author_id) {
            self.notification_service
                .notify(CreateNotificationRequest {
                    recipient_id: parent_author,
                    actor_id: Some(author_id),
                    notification_type: NotificationType::Comment,
                    post_id: Some(post.id),
                    comment_id: Some(comment.id),
                    message: "replied to your comment".to_string(),
                    ..Default::default()
                })
                .await;
        }

        info!("Created comment {} on post {}", comment.id, post.id);
        Ok(comment)
    }

    pub async fn list_post_comments(
        &self,
        post_id: Uuid,
        viewer_id: Option<Uuid>,
        page: i64,
        limit: i64,
    ) -> Result<PaginatedResult<CommentWithAuthor>> {
        debug!("Listing comments for post {}", post_id);

        let visible = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
            .bind(post_id)
            .fetch_optional(self.db.pool())
            .await?
            .map(|p| p.is_visible_to(viewer_id))
            .unwrap_or(false);
        if !visible {
            return Err(AppError::not_found("Post"));
        }

        let comments = sqlx::query_as::<_, CommentWithAuthor>(
            r#"
            SELECT
                c.*,
                u.username AS author_username,
                u.display_name AS author_display_name,
                u.avatar_url AS author_avatar_url
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.post_id = $1
            ORDER BY c.created_at ASC, c.id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(post_id)
        .bind(limit)
        .bind(offset_for(page, limit))
        .fetch_all(self.db.pool())
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(self.db.pool())
            .await?;

        Ok(PaginatedResult::new(comments, total, page, limit))
    }

    pub async fn update_comment(
        &self,
        comment_id: Uuid,
        user_id: Uuid,
        request: UpdateCommentRequest,
    ) -> Result<Comment> {
        request.validate()?;
        let content = request.content.trim();
        if content.is_empty() {
            return Err(AppError::validation("Comment cannot be empty"));
        }
        validate_text_length("Comment", content, self.config.max_comment_length)?;

        let author_id: Option<Uuid> =
            sqlx::query_scalar("SELECT author_id FROM comments WHERE id = $1")
                .bind(comment_id)
                .fetch_optional(self.db.pool())
                .await?;

        match author_id {
            None => return Err(AppError::not_found("Comment")),
            Some(author) if author != user_id => {
                return Err(AppError::forbidden("Only the author can edit this comment"))
            }
            Some(_) => {}
        }

        let comment = sqlx::query_as::<_, Comment>(
            "UPDATE comments SET content = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(comment_id)
        .bind(content)
        .fetch_one(self.db.pool())
        .await?;

        info!("Updated comment {}", comment_id);
        Ok(comment)
    }

    /// 删除评论及其所有回复，帖子评论数按实际删除条数扣减
    pub async fn delete_comment(&self, comment_id: Uuid, user_id: Uuid) -> Result<u64> {
        let mut tx = self.db.begin().await?;

        let owners: Option<(Uuid, Uuid, Uuid)> = sqlx::query_as(
            r#"
            SELECT c.post_id, c.author_id, p.author_id
            FROM comments c
            JOIN posts p ON p.id = c.post_id
            WHERE c.id = $1
            FOR UPDATE OF p
            "#,
        )
        .bind(comment_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (post_id, comment_author, post_author) =
            owners.ok_or_else(|| AppError::not_found("Comment"))?;

        if user_id != comment_author && user_id != post_author {
            return Err(AppError::forbidden(
                "Only the comment author or post author can delete this comment",
            ));
        }

        let removed = sqlx::query(
            r#"
            WITH RECURSIVE thread AS (
                SELECT id FROM comments WHERE id = $1
                UNION ALL
                SELECT c.id FROM comments c JOIN thread t ON c.parent_id = t.id
            )
            DELETE FROM comments WHERE id IN (SELECT id FROM thread)
            "#,
        )
        .bind(comment_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query(
            "UPDATE posts SET comment_count = GREATEST(comment_count - $2, 0) WHERE id = $1",
        )
        .bind(post_id)
        .bind(removed as i64)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!("Deleted comment {} ({} rows) from post {}", comment_id, removed, post_id);
        Ok(removed)
    }
}
