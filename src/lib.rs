pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod router;
pub mod services;

// Make test_utils available for both unit tests and integration tests
pub mod test_utils;

use config::AppConfig;
use repositories::{
    SqliteFeedbackRepository, SqliteNoteRepository, SqliteUserRepository, SqliteVisitRepository,
    VisitRepository,
};
use services::{
    EmailService, FeedbackService, MediaStore, NoteService, TokenService, UserService,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub note_service: Arc<NoteService>,
    pub feedback_service: Arc<FeedbackService>,
    pub token_service: Arc<TokenService>,
    pub visit_repository: Arc<dyn VisitRepository>,
    /// Largest PDF accepted by the note forms.
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Wires the SQLite repositories and services around the given collaborators.
    pub fn new(
        pool: sqlx::SqlitePool,
        config: &AppConfig,
        media_store: Arc<dyn MediaStore>,
        email_service: Arc<dyn EmailService>,
    ) -> Self {
        let token_service = Arc::new(TokenService::new(&config.jwt_secret));
        let visit_repository: Arc<dyn VisitRepository> =
            Arc::new(SqliteVisitRepository::new(pool.clone()));

        let user_service = Arc::new(UserService::new(
            Arc::new(SqliteUserRepository::new(pool.clone())),
            email_service,
            token_service.clone(),
            config.base_url.clone(),
        ));
        let note_service = Arc::new(NoteService::new(
            Arc::new(SqliteNoteRepository::new(pool.clone())),
            visit_repository.clone(),
            media_store,
        ));
        let feedback_service = Arc::new(FeedbackService::new(Arc::new(
            SqliteFeedbackRepository::new(pool),
        )));

        Self {
            user_service,
            note_service,
            feedback_service,
            token_service,
            visit_repository,
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}
