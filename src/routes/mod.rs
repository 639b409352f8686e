use serde::Deserialize;

pub mod articles;
pub mod comments;
pub mod feed;
pub mod follows;
pub mod maintenance;
pub mod measurements;
pub mod messages;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod posts;
pub mod reactions;
pub mod reports;
pub mod statuses;
pub mod users;
pub mod vendors;

/// 通用分页查询参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
