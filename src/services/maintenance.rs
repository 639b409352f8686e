use crate::{
    error::{AppError, Result},
    services::Database,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, sync::Arc};
use tracing::{error, info};

/// 可由外部调度器触发的维护任务，每个任务都是幂等的单条 SQL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MaintenanceTask {
    /// 删除已过期的状态
    PurgeExpiredStatuses,
    /// 会员到期后降级
    ExpirePremium,
    /// 清理已过期的吊销令牌记录
    PurgeRevokedTokens,
}

impl MaintenanceTask {
    pub const ALL: [MaintenanceTask; 3] = [
        MaintenanceTask::PurgeExpiredStatuses,
        MaintenanceTask::ExpirePremium,
        MaintenanceTask::PurgeRevokedTokens,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MaintenanceTask::PurgeExpiredStatuses => "purge-expired-statuses",
            MaintenanceTask::ExpirePremium => "expire-premium",
            MaintenanceTask::PurgeRevokedTokens => "purge-revoked-tokens",
        }
    }
}

impl fmt::Display for MaintenanceTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaintenanceTask {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        MaintenanceTask::ALL
            .into_iter()
            .find(|task| task.as_str() == s)
            .ok_or_else(|| AppError::NotFound(format!("Unknown maintenance task: {}", s)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceReport {
    pub task: MaintenanceTask,
    pub affected: u64,
    pub ran_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct MaintenanceService {
    db: Arc<Database>,
}

impl MaintenanceService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    pub async fn run(&self, task: MaintenanceTask) -> Result<MaintenanceReport> {
        let result = match task {
            MaintenanceTask::PurgeExpiredStatuses => self.purge_expired_statuses().await,
            MaintenanceTask::ExpirePremium => self.expire_premium_subscriptions().await,
            MaintenanceTask::PurgeRevokedTokens => self.purge_revoked_tokens().await,
        };

        match result {
            Ok(affected) => {
                info!("Maintenance task {} affected {} rows", task, affected);
                Ok(MaintenanceReport {
                    task,
                    affected,
                    ran_at: Utc::now(),
                })
            }
            Err(e) => {
                error!("Maintenance task {} failed: {}", task, e);
                Err(e)
            }
        }
    }

    pub async fn purge_expired_statuses(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM statuses WHERE expires_at <= NOW()")
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn expire_premium_subscriptions(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE users SET is_premium = FALSE, updated_at = NOW()
            WHERE is_premium AND (premium_expires_at IS NULL OR premium_expires_at <= NOW())
            "#,
        )
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn purge_revoked_tokens(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at <= NOW()")
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_names_roundtrip() {
        for task in MaintenanceTask::ALL {
            assert_eq!(task.as_str().parse::<MaintenanceTask>().unwrap(), task);
        }
    }

    #[test]
    fn test_unknown_task_is_not_found() {
        let err = "vacuum-everything".parse::<MaintenanceTask>().unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_task_serializes_kebab_case() {
        let value = serde_json::to_value(MaintenanceTask::ExpirePremium).unwrap();
        assert_eq!(value, "expire-premium");
    }

    #[test]
    fn test_clap_names_match_display() {
        use clap::ValueEnum;
        for task in MaintenanceTask::ALL {
            let name = task.to_possible_value().unwrap();
            assert_eq!(name.get_name(), task.as_str());
        }
    }
}
