use crate::{
    error::{AppError, Result},
    models::follow::*,
    models::notification::*,
    services::{database::offset_for, Database, NotificationService, PaginatedResult},
};
use sqlx::{Postgres, Transaction};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct FollowService {
    db: Arc<Database>,
    notification_service: NotificationService,
}

impl FollowService {
    pub async fn new(db: Arc<Database>, notification_service: NotificationService) -> Result<Self> {
        Ok(Self {
            db,
            notification_service,
        })
    }

    pub async fn follow_user(&self, follower_id: Uuid, following_id: Uuid) -> Result<Follow> {
        debug!("User {} following user {}", follower_id, following_id);

        // 防止自己关注自己
        if follower_id == following_id {
            return Err(AppError::BadRequest("Cannot follow yourself".to_string()));
        }

        let mut tx = self.db.begin().await?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(following_id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let follow = sqlx::query_as::<_, Follow>(
            r#"
            INSERT INTO follows (follower_id, following_id)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(follower_id)
        .bind(following_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Already following this user"))?;

        Self::recount(&mut tx, follower_id, following_id).await?;
        tx.commit().await?;

        self.notification_service
            .notify(CreateNotificationRequest {
                recipient_id: following_id,
                actor_id: Some(follower_id),
                notification_type: NotificationType::Follow,
                message: "started following you".to_string(),
                ..Default::default()
            })
            .await;

        info!("User {} followed user {}", follower_id, following_id);
        Ok(follow)
    }

    pub async fn unfollow_user(&self, follower_id: Uuid, following_id: Uuid) -> Result<()> {
        debug!("User {} unfollowing user {}", follower_id, following_id);

        let mut tx = self.db.begin().await?;

        let result = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND following_id = $2")
            .bind(follower_id)
            .bind(following_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Not following this user".to_string()));
        }

        Self::recount(&mut tx, follower_id, following_id).await?;
        tx.commit().await?;

        info!("User {} unfollowed user {}", follower_id, following_id);
        Ok(())
    }

    /// 以关系表为准重算双方的关注计数
    async fn recount(
        tx: &mut Transaction<'static, Postgres>,
        follower_id: Uuid,
        following_id: Uuid,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users SET
                following_count = (SELECT COUNT(*) FROM follows WHERE follower_id = $1),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(follower_id)
        .execute(&mut **tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE users SET
                follower_count = (SELECT COUNT(*) FROM follows WHERE following_id = $1),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(following_id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    pub async fn get_followers(
        &self,
        user_id: Uuid,
        current_user_id: Option<Uuid>,
        page: i64,
        limit: i64,
    ) -> Result<PaginatedResult<FollowUserInfo>> {
        debug!("Getting followers for user: {}", user_id);

        let followers = sqlx::query_as::<_, FollowUserInfo>(
            r#"
            SELECT
                u.id AS user_id,
                u.username,
                u.display_name,
                u.avatar_url,
                u.bio,
                u.follower_count,
                f.created_at AS followed_at,
                EXISTS(SELECT 1 FROM follows x WHERE x.follower_id = $2 AND x.following_id = u.id)
                    AS is_following,
                EXISTS(SELECT 1 FROM follows y WHERE y.follower_id = u.id AND y.following_id = $2)
                    AS is_followed_back
            FROM follows f
            JOIN users u ON f.follower_id = u.id
            WHERE f.following_id = $1
            ORDER BY f.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(current_user_id)
        .bind(limit)
        .bind(offset_for(page, limit))
        .fetch_all(self.db.pool())
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE following_id = $1")
            .bind(user_id)
            .fetch_one(self.db.pool())
            .await?;

        Ok(PaginatedResult::new(followers, total, page, limit))
    }

    pub async fn get_following(
        &self,
        user_id: Uuid,
        current_user_id: Option<Uuid>,
        page: i64,
        limit: i64,
    ) -> Result<PaginatedResult<FollowUserInfo>> {
        debug!("Getting following for user: {}", user_id);

        let following = sqlx::query_as::<_, FollowUserInfo>(
            r#"
            SELECT
                u.id AS user_id,
                u.username,
                u.display_name,
                u.avatar_url,
                u.bio,
                u.follower_count,
                f.created_at AS followed_at,
                EXISTS(SELECT 1 FROM follows x WHERE x.follower_id = $2 AND x.following_id = u.id)
                    AS is_following,
                EXISTS(SELECT 1 FROM follows y WHERE y.follower_id = u.id AND y.following_id = $2)
                    AS is_followed_back
            FROM follows f
            JOIN users u ON f.following_id = u.id
            WHERE f.follower_id = $1
            ORDER BY f.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(current_user_id)
        .bind(limit)
        .bind(offset_for(page, limit))
        .fetch_all(self.db.pool())
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE follower_id = $1")
            .bind(user_id)
            .fetch_one(self.db.pool())
            .await?;

        Ok(PaginatedResult::new(following, total, page, limit))
    }

    pub async fn get_follow_stats(
        &self,
        user_id: Uuid,
        current_user_id: Option<Uuid>,
    ) -> Result<FollowStats> {
        debug!("Getting follow stats for user: {}", user_id);

        let counts: Option<(i64, i64)> = sqlx::query_as(
            "SELECT follower_count, following_count FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;
        let (followers_count, following_count) =
            counts.ok_or_else(|| AppError::not_found("User"))?;

        let (is_following, is_followed_by) = match current_user_id {
            Some(current) if current != user_id => (
                self.is_following(current, user_id).await?,
                self.is_following(user_id, current).await?,
            ),
            _ => (false, false),
        };

        Ok(FollowStats {
            followers_count,
            following_count,
            is_following,
            is_followed_by,
        })
    }

    pub async fn is_following(&self, follower_id: Uuid, following_id: Uuid) -> Result<bool> {
        let following: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = $1 AND following_id = $2)",
        )
        .bind(follower_id)
        .bind(following_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(following)
    }

    /// 用户关注的所有人的 id
    pub async fn followee_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        let ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT following_id FROM follows WHERE follower_id = $1")
                .bind(user_id)
                .fetch_all(self.db.pool())
                .await?;

        Ok(ids)
    }
}
