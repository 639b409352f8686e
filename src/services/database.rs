use crate::config::Config;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use std::time::Duration;
use tracing::{error, info};

/// 数据库服务
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 创建新的数据库实例
    pub async fn new(config: &Config) -> Result<Self> {
        info!("Initializing database pool (max {} connections)", config.database_max_connections);

        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    /// 创建不立即建立连接的实例，首次查询时才连接
    pub fn connect_lazy(config: &Config) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(2))
            .connect_lazy(&config.database_url)?;

        Ok(Self { pool })
    }

    /// 验证数据库连接
    pub async fn verify_connection(&self) -> Result<()> {
        match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => {
                info!("Database connection verified successfully");
                Ok(())
            }
            Err(e) => {
                error!("Failed to verify database connection: {}", e);
                Err(AppError::from(e))
            }
        }
    }

    /// 执行数据库迁移
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations completed successfully");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 开始事务
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>> {
        Ok(self.pool.begin().await?)
    }
}

/// 分页结果结构
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PaginatedResult<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl<T> PaginatedResult<T> {
    pub fn new(data: Vec<T>, total: i64, page: i64, per_page: i64) -> Self {
        let total_pages = if per_page > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };

        Self {
            data,
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

/// 根据页码和每页数量计算偏移量
pub fn offset_for(page: i64, limit: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(limit.max(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_for() {
        assert_eq!(offset_for(1, 20), 0);
        assert_eq!(offset_for(3, 20), 40);
        assert_eq!(offset_for(0, 20), 0);
        assert_eq!(offset_for(i64::MAX / 10, 20), i64::MAX);
    }

    #[test]
    fn test_paginated_result_total_pages() {
        let result = PaginatedResult::new(vec![1, 2, 3], 41, 1, 20);
        assert_eq!(result.total_pages, 3);

        let empty: PaginatedResult<i32> = PaginatedResult::new(vec![], 0, 1, 20);
        assert_eq!(empty.total_pages, 0);
    }

    #[tokio::test]
    async fn test_lazy_pool_does_not_connect() {
        let config = Config::default();
        assert!(Database::connect_lazy(&config).is_ok());
    }
}
