use super::{RepositoryError, RepositoryResult};
use crate::models::feedback::Feedback;
use async_trait::async_trait;
use sqlx::SqlitePool;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait FeedbackRepository: Send + Sync {
    async fn create(
        &self,
        name: Option<String>,
        email: Option<String>,
        message: String,
    ) -> RepositoryResult<Feedback>;
    async fn list(&self) -> RepositoryResult<Vec<Feedback>>;
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Feedback>>;
    async fn update_message(&self, id: i64, message: String) -> RepositoryResult<Feedback>;
    async fn delete(&self, id: i64) -> RepositoryResult<()>;
    async fn count(&self) -> RepositoryResult<i64>;
}

pub struct SqliteFeedbackRepository {
    pool: SqlitePool,
}

impl SqliteFeedbackRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FeedbackRepository for SqliteFeedbackRepository {
    async fn create(
        &self,
        name: Option<String>,
        email: Option<String>,
        message: String,
    ) -> RepositoryResult<Feedback> {
        Ok(sqlx::query_as::<_, Feedback>(
            "INSERT INTO feedback (name, email, message) VALUES (?, ?, ?) \
             RETURNING id, name, email, message, created_at",
        )
        .bind(name)
        .bind(email)
        .bind(message)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list(&self) -> RepositoryResult<Vec<Feedback>> {
        Ok(sqlx::query_as::<_, Feedback>(
            "SELECT id, name, email, message, created_at FROM feedback \
             ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Feedback>> {
        Ok(sqlx::query_as::<_, Feedback>(
            "SELECT id, name, email, message, created_at FROM feedback WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn update_message(&self, id: i64, message: String) -> RepositoryResult<Feedback> {
        sqlx::query_as::<_, Feedback>(
            "UPDATE feedback SET message = ? WHERE id = ? \
             RETURNING id, name, email, message, created_at",
        )
        .bind(message)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: i64) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM feedback WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM feedback")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
