use crate::{
    config::Config,
    error::Result,
    models::{feed::*, post::PostWithAuthor},
    services::{post::POST_WITH_AUTHOR_SELECT, Database, FollowService, ReportService},
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// 时间线组装：帖子与转发两路查询，合并后按页截取
#[derive(Clone)]
pub struct FeedService {
    db: Arc<Database>,
    follow_service: FollowService,
    report_service: ReportService,
    max_depth: i64,
}

impl FeedService {
    pub async fn new(
        db: Arc<Database>,
        config: &Config,
        follow_service: FollowService,
        report_service: ReportService,
    ) -> Result<Self> {
        Ok(Self {
            db,
            follow_service,
            report_service,
            max_depth: config.feed_max_depth,
        })
    }

    pub async fn get_feed(
        &self,
        viewer_id: Uuid,
        page: i64,
        limit: i64,
        following_only: bool,
    ) -> Result<FeedPage> {
        debug!(
            "Building feed for {} (page={}, limit={}, following_only={})",
            viewer_id, page, limit, following_only
        );

        let (followees, reported) = tokio::try_join!(
            self.follow_service.followee_ids(viewer_id),
            self.report_service.reported_ids(viewer_id),
        )?;

        if following_only && followees.is_empty() {
            return Ok(FeedPage::empty(page, limit));
        }

        let window = match FeedWindow::new(page, limit, self.max_depth) {
            Some(window) => window,
            None => return Ok(FeedPage::empty(page, limit)),
        };

        let filter = FeedFilter::new(viewer_id, following_only, followees, reported);

        // 两路都从头取到本页末尾，合并后再切出本页，保证每页不超过 limit
        let (posts, retweets) = tokio::try_join!(
            self.fetch_posts(&filter, window.fetch_limit()),
            self.fetch_retweets(&filter, window.fetch_limit()),
        )?;

        let merged = merge_timeline(posts, retweets);
        let has_more = window.has_more(merged.len());
        let entries = window.slice(merged);

        debug!("Feed for {} has {} entries", viewer_id, entries.len());
        Ok(FeedPage {
            entries,
            page,
            limit,
            has_more,
        })
    }

    async fn fetch_posts(&self, filter: &FeedFilter, fetch_limit: i64) -> Result<Vec<PostWithAuthor>> {
        let query = format!(
            r#"{}
            WHERE (p.visibility = 'public' OR p.author_id = $1)
              AND CASE WHEN $2
                       THEN p.author_id = ANY($3)
                       ELSE NOT (p.author_id = ANY($4))
                  END
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $5
            "#,
            POST_WITH_AUTHOR_SELECT
        );

        let posts = sqlx::query_as::<_, PostWithAuthor>(&query)
            .bind(filter.viewer_id)
            .bind(filter.following_only)
            .bind(filter.circle_ids())
            .bind(filter.reported_ids())
            .bind(fetch_limit)
            .fetch_all(self.db.pool())
            .await?;

        Ok(posts)
    }

    async fn fetch_retweets(&self, filter: &FeedFilter, fetch_limit: i64) -> Result<Vec<RetweetWithPost>> {
        let retweets = sqlx::query_as::<_, RetweetWithPost>(
            r#"
            SELECT
                r.id AS retweet_id,
                r.user_id AS retweeter_id,
                ru.username AS retweeter_username,
                ru.display_name AS retweeter_display_name,
                ru.avatar_url AS retweeter_avatar_url,
                r.content AS retweet_content,
                r.created_at AS retweet_created_at,
                p.*,
                u.username AS author_username,
                u.display_name AS author_display_name,
                u.avatar_url AS author_avatar_url
            FROM retweets r
            JOIN users ru ON ru.id = r.user_id
            JOIN posts p ON p.id = r.post_id
            JOIN users u ON u.id = p.author_id
            WHERE r.user_id = ANY($1)
              AND NOT (r.user_id = ANY($2))
              AND (p.visibility = 'public' OR p.author_id = $3)
            ORDER BY r.created_at DESC, r.id DESC
            LIMIT $4
            "#,
        )
        .bind(filter.circle_ids())
        .bind(filter.reported_ids())
        .bind(filter.viewer_id)
        .bind(fetch_limit)
        .fetch_all(self.db.pool())
        .await?;

        Ok(retweets)
    }
}
