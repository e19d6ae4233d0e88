use super::{RepositoryError, RepositoryResult};
use crate::models::user::{Role, User};
use async_trait::async_trait;
use sqlx::SqlitePool;

const USER_COLUMNS: &str =
    "id, fullname, email, username, password_hash, is_verified, role, profile_img, created_at";

#[derive(Debug, Clone)]
pub struct NewUser {
    pub fullname: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub is_verified: bool,
    pub role: Role,
}

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: NewUser) -> RepositoryResult<User>;
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;
    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<User>>;
    async fn find_by_email_or_username(&self, login: &str) -> RepositoryResult<Option<User>>;
    async fn mark_verified(&self, id: i64) -> RepositoryResult<bool>;
    async fn set_role(&self, id: i64, role: Role) -> RepositoryResult<()>;
    async fn delete_user(&self, id: i64) -> RepositoryResult<()>;
    async fn list_users(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> RepositoryResult<Vec<User>>;
}

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create_user(&self, user: NewUser) -> RepositoryResult<User> {
        let sql = format!(
            "INSERT INTO users (fullname, email, username, password_hash, is_verified, role) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING {}",
            USER_COLUMNS
        );

        let created = sqlx::query_as::<_, User>(&sql)
            .bind(&user.fullname)
            .bind(&user.email)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(user.is_verified)
            .bind(user.role)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_email_or_username(&self, login: &str) -> RepositoryResult<Option<User>> {
        // An exact email match wins over a username that happens to look the same.
        let sql = format!(
            "SELECT {} FROM users WHERE email = ?1 OR username = ?1 \
             ORDER BY CASE WHEN email = ?1 THEN 0 ELSE 1 END, id LIMIT 1",
            USER_COLUMNS
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(login)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn mark_verified(&self, id: i64) -> RepositoryResult<bool> {
        // Only flips unverified rows so concurrent verifications succeed once.
        let result = sqlx::query("UPDATE users SET is_verified = TRUE WHERE id = ? AND is_verified = FALSE")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn set_role(&self, id: i64, role: Role) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE users SET role = ? WHERE id = ?")
            .bind(role)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn delete_user(&self, id: i64) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn list_users(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> RepositoryResult<Vec<User>> {
        // A negative LIMIT is unbounded in SQLite
        let limit = limit.unwrap_or(-1);
        let offset = offset.unwrap_or(0);

        let sql = format!(
            "SELECT {} FROM users ORDER BY id ASC LIMIT ? OFFSET ?",
            USER_COLUMNS
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?)
    }
}
