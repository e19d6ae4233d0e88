pub mod feedback_repository;
pub mod note_repository;
pub mod user_repository;
pub mod visit_repository;

pub use feedback_repository::{FeedbackRepository, SqliteFeedbackRepository};
pub use note_repository::{NoteRepository, SqliteNoteRepository};
pub use user_repository::{SqliteUserRepository, UserRepository};
pub use visit_repository::{SqliteVisitRepository, VisitRepository};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(sqlx::Error),
    #[error("Record not found")]
    NotFound,
    #[error("Record already exists")]
    AlreadyExists,
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::AlreadyExists,
            _ => RepositoryError::Database(err),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
