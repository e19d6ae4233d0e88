pub mod test_helpers {
    use crate::config::{AppConfig, MediaConfig, MAX_UPLOAD_BYTES};
    use crate::models::user::Role;
    use crate::services::{ConsoleEmailService, LocalMediaStore};
    use crate::AppState;
    use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    pub const TEST_JWT_SECRET: &str = "integration-test-secret-integration-test";
    pub const TEST_BASE_URL: &str = "http://localhost:5000";

    /// Create a new in-memory SQLite database for testing
    pub async fn create_test_db() -> Result<SqlitePool, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(pool)
    }

    /// Create a temporary file-based SQLite database for testing
    /// Useful when several connections must share the same database
    pub async fn create_test_db_file(
        max_connections: u32,
    ) -> Result<(SqlitePool, NamedTempFile), sqlx::Error> {
        let temp_file = NamedTempFile::new().map_err(sqlx::Error::Io)?;
        let db_path = temp_file
            .path()
            .to_str()
            .ok_or_else(|| sqlx::Error::Configuration("Invalid database path".into()))?;
        let database_url = format!("sqlite://{}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(&database_url)
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok((pool, temp_file))
    }

    pub fn test_config(media_dir: &Path) -> AppConfig {
        AppConfig {
            environment: "test".to_string(),
            database_url: "sqlite::memory:".to_string(),
            host: "127.0.0.1".to_string(),
            port: 5000,
            base_url: TEST_BASE_URL.to_string(),
            jwt_secret: TEST_JWT_SECRET.to_string(),
            media: MediaConfig::Local {
                dir: media_dir.to_path_buf(),
                public_base_url: TEST_BASE_URL.to_string(),
            },
            smtp: None,
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }

    /// App state backed by `pool`, a local media directory and the console mailer.
    pub fn test_state(pool: SqlitePool, media_dir: &Path) -> AppState {
        let config = test_config(media_dir);
        let media = Arc::new(LocalMediaStore::new(
            media_dir.to_path_buf(),
            TEST_BASE_URL.to_string(),
        ));
        AppState::new(pool, &config, media, Arc::new(ConsoleEmailService::new()))
    }

    /// Insert a test user with hashed password
    pub async fn insert_test_user(
        pool: &SqlitePool,
        email: &str,
        password: &str,
        verified: bool,
        role: Role,
    ) -> Result<i64, sqlx::Error> {
        use argon2::{
            password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
            Argon2,
        };

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                sqlx::Error::Configuration(format!("Password hashing failed: {}", e).into())
            })?
            .to_string();

        let username = email.split('@').next().unwrap_or(email);

        let result = sqlx::query(
            "INSERT INTO users (fullname, email, username, password_hash, is_verified, role) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind("Test User")
        .bind(email)
        .bind(username)
        .bind(password_hash)
        .bind(verified)
        .bind(role)
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Insert a note row directly, without a stored PDF behind it
    pub async fn insert_test_note(
        pool: &SqlitePool,
        title: &str,
        subject: &str,
        semester: &str,
        hand_written: bool,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO notes (title, subject, semester, hand_written, pdf_url) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(title)
        .bind(subject)
        .bind(semester)
        .bind(hand_written)
        .bind(format!("{}/media/pdf-notes/notes/{}.pdf", TEST_BASE_URL, uuid::Uuid::new_v4()))
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }
}

// Re-export commonly used test functions at module level for convenience
// Note: This is test-only code. Panic on error is acceptable in tests.
#[cfg(test)]
pub async fn create_test_pool() -> sqlx::SqlitePool {
    match test_helpers::create_test_db().await {
        Ok(pool) => pool,
        Err(e) => panic!("Failed to create test pool: {}", e),
    }
}
