use crate::{
    error::{AppError, Result},
    models::{notification::*, reaction::*},
    services::{Database, NotificationService},
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct ReactionService {
    db: Arc<Database>,
    notification_service: NotificationService,
}

impl ReactionService {
    pub async fn new(db: Arc<Database>, notification_service: NotificationService) -> Result<Self> {
        Ok(Self {
            db,
            notification_service,
        })
    }

    /// 读取目标作者与所在帖子的可见性；`lock` 时锁定目标行
    async fn fetch_target<'e, E>(
        executor: E,
        target: ReactionTarget,
        lock: bool,
    ) -> Result<Option<TargetRow>>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let sql = match target {
            ReactionTarget::Post(_) => format!(
                "SELECT author_id AS target_author_id, author_id AS post_author_id, visibility \
                 FROM posts WHERE id = $1{}",
                if lock { " FOR UPDATE" } else { "" }
            ),
            ReactionTarget::Comment(_) => format!(
                "SELECT c.author_id AS target_author_id, p.author_id AS post_author_id, p.visibility \
                 FROM comments c JOIN posts p ON p.id = c.post_id WHERE c.id = $1{}",
                if lock { " FOR UPDATE OF c" } else { "" }
            ),
        };

        let row = sqlx::query_as::<_, TargetRow>(&sql)
            .bind(target.post_id().or(target.comment_id()))
            .fetch_optional(executor)
            .await?;

        Ok(row)
    }

    pub async fn toggle_reaction(
        &self,
        user_id: Uuid,
        request: ToggleReactionRequest,
    ) -> Result<ToggleOutcome> {
        let target = ReactionTarget::from_ids(request.post_id, request.comment_id)?;
        debug!("User {} toggling {} on {:?}", user_id, request.reaction_type, target);

        let mut tx = self.db.begin().await?;

        let row = Self::fetch_target(&mut *tx, target, true).await?;
        let target_author = target.visible_author(row, Some(user_id))?;

        let existing = sqlx::query_as::<_, Reaction>(
            r#"
            SELECT * FROM reactions
            WHERE user_id = $1
              AND post_id IS NOT DISTINCT FROM $2
              AND comment_id IS NOT DISTINCT FROM $3
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .bind(target.post_id())
        .bind(target.comment_id())
        .fetch_optional(&mut *tx)
        .await?;

        let transition =
            ReactionTransition::decide(existing.as_ref().map(|r| r.reaction_type), request.reaction_type);

        let reaction = match (transition, existing) {
            (ReactionTransition::Create, _) => Some(
                sqlx::query_as::<_, Reaction>(
                    r#"
                    INSERT INTO reactions (id, user_id, post_id, comment_id, reaction_type)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING *
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(user_id)
                .bind(target.post_id())
                .bind(target.comment_id())
                .bind(request.reaction_type)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| AppError::conflict_on_unique(e, "Reaction already exists"))?,
            ),
            (ReactionTransition::Remove, Some(current)) => {
                sqlx::query("DELETE FROM reactions WHERE id = $1")
                    .bind(current.id)
                    .execute(&mut *tx)
                    .await?;
                None
            }
            (ReactionTransition::Change { .. }, Some(current)) => Some(
                sqlx::query_as::<_, Reaction>(
                    r#"
                    UPDATE reactions SET reaction_type = $2, updated_at = NOW()
                    WHERE id = $1
                    RETURNING *
                    "#,
                )
                .bind(current.id)
                .bind(request.reaction_type)
                .fetch_one(&mut *tx)
                .await?,
            ),
            (_, None) => return Err(AppError::internal("Reaction state changed during toggle")),
        };

        let delta = transition.counter_delta();
        if delta != 0 {
            let statement = match target {
                ReactionTarget::Post(_) => {
                    "UPDATE posts SET reaction_count = GREATEST(reaction_count + $2, 0) WHERE id = $1"
                }
                ReactionTarget::Comment(_) => {
                    "UPDATE comments SET reaction_count = GREATEST(reaction_count + $2, 0) WHERE id = $1"
                }
            };
            let target_id = target.post_id().or(target.comment_id());
            sqlx::query(statement)
                .bind(target_id)
                .bind(delta)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        if transition == ReactionTransition::Create {
            self.notification_service
                .notify(CreateNotificationRequest {
                    recipient_id: target_author,
                    actor_id: Some(user_id),
                    notification_type: NotificationType::Reaction,
                    post_id: target.post_id(),
                    comment_id: target.comment_id(),
                    message: format!("reacted {} to your content", request.reaction_type),
                    ..Default::default()
                })
                .await;
        }

        info!("User {} reaction on {:?}: {:?}", user_id, target, transition);
        Ok(ToggleOutcome {
            transition,
            reaction,
        })
    }

    pub async fn reaction_summary(
        &self,
        query: ReactionTargetQuery,
        viewer_id: Option<Uuid>,
    ) -> Result<ReactionSummary> {
        let target = ReactionTarget::from_ids(query.post_id, query.comment_id)?;

        let row = Self::fetch_target(self.db.pool(), target, false).await?;
        target.visible_author(row, viewer_id)?;

        let counts = sqlx::query_as::<_, ReactionCount>(
            r#"
            SELECT reaction_type, COUNT(*) AS count
            FROM reactions
            WHERE post_id IS NOT DISTINCT FROM $1 AND comment_id IS NOT DISTINCT FROM $2
            GROUP BY reaction_type
            ORDER BY count DESC, reaction_type
            "#,
        )
        .bind(target.post_id())
        .bind(target.comment_id())
        .fetch_all(self.db.pool())
        .await?;

        let viewer_reaction = match viewer_id {
            Some(viewer) => sqlx::query_scalar::<_, ReactionType>(
                r#"
                SELECT reaction_type FROM reactions
                WHERE user_id = $1
                  AND post_id IS NOT DISTINCT FROM $2
                  AND comment_id IS NOT DISTINCT FROM $3
                "#,
            )
            .bind(viewer)
            .bind(target.post_id())
            .bind(target.comment_id())
            .fetch_optional(self.db.pool())
            .await?,
            None => None,
        };

        Ok(ReactionSummary {
            total: counts.iter().map(|c| c.count).sum(),
            counts,
            viewer_reaction,
        })
    }
}
