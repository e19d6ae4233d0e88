use super::RepositoryResult;
use crate::models::visit::{DeviceCount, Visit};
use async_trait::async_trait;
use sqlx::SqlitePool;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait VisitRepository: Send + Sync {
    async fn record(&self, user_agent: &str) -> RepositoryResult<Visit>;
    /// Visits grouped by user-agent summary, most frequent first.
    async fn device_counts(&self) -> RepositoryResult<Vec<DeviceCount>>;
}

pub struct SqliteVisitRepository {
    pool: SqlitePool,
}

impl SqliteVisitRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VisitRepository for SqliteVisitRepository {
    async fn record(&self, user_agent: &str) -> RepositoryResult<Visit> {
        Ok(sqlx::query_as::<_, Visit>(
            "INSERT INTO visits (user_agent) VALUES (?) RETURNING id, user_agent, created_at",
        )
        .bind(user_agent)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn device_counts(&self) -> RepositoryResult<Vec<DeviceCount>> {
        Ok(sqlx::query_as::<_, DeviceCount>(
            r#"
            SELECT user_agent AS device, COUNT(*) AS count
            FROM visits
            GROUP BY user_agent
            ORDER BY count DESC, device ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?)
    }
}
