use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use uuid::Uuid;

use crate::models::post::PostWithAuthor;

#[derive(Debug, Clone, Deserialize)]
pub struct FeedQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// 转发条目：转发者信息 + 原帖
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RetweetWithPost {
    pub retweet_id: Uuid,
    pub retweeter_id: Uuid,
    pub retweeter_username: String,
    pub retweeter_display_name: String,
    pub retweeter_avatar_url: Option<String>,
    pub retweet_content: Option<String>,
    pub retweet_created_at: DateTime<Utc>,
    #[sqlx(flatten)]
    pub original: PostWithAuthor,
}

/// 时间线条目：帖子或转发，统一按创建时间排序
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedEntry {
    Post(PostWithAuthor),
    Retweet(RetweetWithPost),
}

impl FeedEntry {
    pub fn id(&self) -> Uuid {
        match self {
            FeedEntry::Post(p) => p.post.id,
            FeedEntry::Retweet(r) => r.retweet_id,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            FeedEntry::Post(p) => p.post.created_at,
            FeedEntry::Retweet(r) => r.retweet_created_at,
        }
    }

    /// 时间倒序，时间相同时按 id 倒序，保证分页稳定
    fn timeline_order(a: &FeedEntry, b: &FeedEntry) -> Ordering {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| b.id().cmp(&a.id()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedPage {
    pub entries: Vec<FeedEntry>,
    pub page: i64,
    pub limit: i64,
    pub has_more: bool,
}

impl FeedPage {
    pub fn empty(page: i64, limit: i64) -> Self {
        Self {
            entries: Vec::new(),
            page,
            limit,
            has_more: false,
        }
    }
}

/// 时间线的作者与可见性过滤条件
#[derive(Debug, Clone)]
pub struct FeedFilter {
    pub viewer_id: Uuid,
    pub following_only: bool,
    circle: HashSet<Uuid>,
    reported: HashSet<Uuid>,
}

impl FeedFilter {
    /// `circle` 为关注的人加上自己
    pub fn new(
        viewer_id: Uuid,
        following_only: bool,
        followees: impl IntoIterator<Item = Uuid>,
        reported: impl IntoIterator<Item = Uuid>,
    ) -> Self {
        let mut circle: HashSet<Uuid> = followees.into_iter().collect();
        circle.insert(viewer_id);

        Self {
            viewer_id,
            following_only,
            circle,
            reported: reported.into_iter().collect(),
        }
    }

    pub fn circle_ids(&self) -> Vec<Uuid> {
        self.circle.iter().copied().collect()
    }

    pub fn reported_ids(&self) -> Vec<Uuid> {
        self.reported.iter().copied().collect()
    }
}

/// 合并帖子和转发，按时间倒序排列
pub fn merge_timeline(posts: Vec<PostWithAuthor>, retweets: Vec<RetweetWithPost>) -> Vec<FeedEntry> {
    let mut entries: Vec<FeedEntry> = posts
        .into_iter()
        .map(FeedEntry::Post)
        .chain(retweets.into_iter().map(FeedEntry::Retweet))
        .collect();

    entries.sort_by(FeedEntry::timeline_order);
    entries
}

/// 一页时间线在合并结果中的位置 `[start, end)`，整体深度不超过 `max_depth`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedWindow {
    pub start: i64,
    pub end: i64,
    max_depth: i64,
}

impl FeedWindow {
    /// 页起点已超出深度上限时返回 `None`
    pub fn new(page: i64, limit: i64, max_depth: i64) -> Option<Self> {
        let limit = limit.max(1);
        let start = (page.max(1) - 1).saturating_mul(limit);
        if start >= max_depth {
            return None;
        }

        Some(Self {
            start,
            end: start.saturating_add(limit).min(max_depth),
            max_depth,
        })
    }

    /// 每一路需要取回的行数，多取一行用来判断是否还有下一页
    pub fn fetch_limit(&self) -> i64 {
        self.end.saturating_add(1)
    }

    pub fn has_more(&self, merged_len: usize) -> bool {
        self.end < self.max_depth && merged_len as i64 > self.end
    }

    pub fn slice(&self, entries: Vec<FeedEntry>) -> Vec<FeedEntry> {
        let skip = usize::try_from(self.start).unwrap_or(usize::MAX);
        let take = usize::try_from(self.end - self.start).unwrap_or(0);
        entries.into_iter().skip(skip).take(take).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::post::{Post, Visibility};
    use chrono::Duration;
    use proptest::prelude::*;

    fn post_at(author_id: Uuid, visibility: Visibility, created_at: DateTime<Utc>) -> PostWithAuthor {
        PostWithAuthor {
            post: Post {
                id: Uuid::new_v4(),
                author_id,
                content: "post".to_string(),
                media_urls: vec![],
                visibility,
                comment_count: 0,
                share_count: 0,
                view_count: 0,
                reaction_count: 0,
                created_at,
                updated_at: created_at,
            },
            author_username: "author".to_string(),
            author_display_name: "Author".to_string(),
            author_avatar_url: None,
        }
    }

    fn retweet_at(retweeter_id: Uuid, original: PostWithAuthor, created_at: DateTime<Utc>) -> RetweetWithPost {
        RetweetWithPost {
            retweet_id: Uuid::new_v4(),
            retweeter_id,
            retweeter_username: "sharer".to_string(),
            retweeter_display_name: "Sharer".to_string(),
            retweeter_avatar_url: None,
            retweet_content: None,
            retweet_created_at: created_at,
            original,
        }
    }

    #[test]
    fn test_filter_circle_includes_viewer_once() {
        let viewer = Uuid::new_v4();
        let followee = Uuid::new_v4();
        let filter = FeedFilter::new(viewer, true, vec![followee, viewer, followee], vec![]);

        let mut circle = filter.circle_ids();
        circle.sort();
        let mut expected = vec![viewer, followee];
        expected.sort();
        assert_eq!(circle, expected);
        assert!(filter.reported_ids().is_empty());
    }

    #[test]
    fn test_merge_sorts_descending_across_sources() {
        let now = Utc::now();
        let author = Uuid::new_v4();
        let old_post = post_at(author, Visibility::Public, now - Duration::minutes(10));
        let new_post = post_at(author, Visibility::Public, now);
        let middle = retweet_at(author, old_post.clone(), now - Duration::minutes(5));

        let merged = merge_timeline(vec![old_post.clone(), new_post.clone()], vec![middle.clone()]);
        let ids: Vec<Uuid> = merged.iter().map(FeedEntry::id).collect();

        assert_eq!(ids, vec![new_post.post.id, middle.retweet_id, old_post.post.id]);
    }

    #[test]
    fn test_window_slices_hard_capped_pages() {
        let now = Utc::now();
        let author = Uuid::new_v4();
        let posts: Vec<PostWithAuthor> = (0..7)
            .map(|i| post_at(author, Visibility::Public, now - Duration::seconds(i)))
            .collect();
        let retweets: Vec<RetweetWithPost> = (0..7)
            .map(|i| retweet_at(author, posts[0].clone(), now - Duration::seconds(i) - Duration::milliseconds(500)))
            .collect();

        let merged = merge_timeline(posts, retweets);
        let page = |n| FeedWindow::new(n, 5, 1000).unwrap();
        assert_eq!(page(1).slice(merged.clone()).len(), 5);
        assert_eq!(page(3).slice(merged.clone()).len(), 4);
        assert!(page(4).slice(merged.clone()).is_empty());

        assert!(page(2).has_more(merged.len()));
        assert!(!page(3).has_more(merged.len()));
    }

    #[test]
    fn test_window_fetches_one_extra_row() {
        let window = FeedWindow::new(2, 20, 1000).unwrap();
        assert_eq!((window.start, window.end), (20, 40));
        assert_eq!(window.fetch_limit(), 41);

        assert!(window.has_more(41));
        assert!(!window.has_more(40));
    }

    #[test]
    fn test_window_stops_at_max_depth() {
        let last = FeedWindow::new(50, 20, 1000).unwrap();
        assert_eq!(last.end, 1000);
        assert!(!last.has_more(5000));

        let partial = FeedWindow::new(4, 30, 100).unwrap();
        assert_eq!((partial.start, partial.end), (90, 100));

        assert_eq!(FeedWindow::new(51, 20, 1000), None);
        assert_eq!(FeedWindow::new(i64::MAX, 20, 1000), None);
        assert_eq!(FeedWindow::new(i64::MAX, i64::MAX, i64::MAX), None);
    }

    proptest! {
        #[test]
        fn prop_merge_is_ordered_and_complete(
            post_offsets in proptest::collection::vec(0i64..10_000, 0..40),
            retweet_offsets in proptest::collection::vec(0i64..10_000, 0..40),
        ) {
            let base = Utc::now();
            let author = Uuid::new_v4();
            let posts: Vec<PostWithAuthor> = post_offsets
                .iter()
                .map(|s| post_at(author, Visibility::Public, base - Duration::seconds(*s)))
                .collect();
            let original = post_at(author, Visibility::Public, base);
            let retweets: Vec<RetweetWithPost> = retweet_offsets
                .iter()
                .map(|s| retweet_at(author, original.clone(), base - Duration::seconds(*s)))
                .collect();

            let merged = merge_timeline(posts, retweets);

            prop_assert_eq!(merged.len(), post_offsets.len() + retweet_offsets.len());
            for pair in merged.windows(2) {
                prop_assert!(FeedEntry::timeline_order(&pair[0], &pair[1]) != Ordering::Greater);
            }
        }

        #[test]
        fn prop_pages_partition_timeline(count in 0usize..60, limit in 1i64..15) {
            let base = Utc::now();
            let author = Uuid::new_v4();
            let posts: Vec<PostWithAuthor> = (0..count)
                .map(|i| post_at(author, Visibility::Public, base - Duration::seconds(i as i64 / 3)))
                .collect();
            let merged = merge_timeline(posts, vec![]);

            let mut seen = Vec::new();
            let mut page = 1;
            loop {
                let slice = match FeedWindow::new(page, limit, i64::MAX) {
                    Some(window) => window.slice(merged.clone()),
                    None => Vec::new(),
                };
                prop_assert!(slice.len() as i64 <= limit);
                if slice.is_empty() {
                    break;
                }
                seen.extend(slice.iter().map(FeedEntry::id));
                page += 1;
            }

            let expected: Vec<Uuid> = merged.iter().map(FeedEntry::id).collect();
            prop_assert_eq!(seen, expected);
        }
    }
}
