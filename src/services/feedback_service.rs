use crate::models::feedback::{Feedback, FeedbackForm};
use crate::repositories::{FeedbackRepository, RepositoryError};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum FeedbackServiceError {
    #[error("Message is required")]
    MissingMessage,
    #[error("Feedback not found")]
    NotFound,
    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for FeedbackServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => FeedbackServiceError::NotFound,
            other => FeedbackServiceError::Repository(other),
        }
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub struct FeedbackService {
    repository: Arc<dyn FeedbackRepository>,
}

impl FeedbackService {
    pub fn new(repository: Arc<dyn FeedbackRepository>) -> Self {
        Self { repository }
    }

    pub async fn create(&self, form: FeedbackForm) -> Result<Feedback, FeedbackServiceError> {
        let message = clean(form.message).ok_or(FeedbackServiceError::MissingMessage)?;

        let feedback = self
            .repository
            .create(clean(form.name), clean(form.email), message)
            .await?;

        tracing::info!("Feedback {} received", feedback.id);
        Ok(feedback)
    }

    pub async fn list(&self) -> Result<Vec<Feedback>, FeedbackServiceError> {
        Ok(self.repository.list().await?)
    }

    pub async fn get(&self, id: i64) -> Result<Feedback, FeedbackServiceError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(FeedbackServiceError::NotFound)
    }

    /// Only the message is editable.
    pub async fn update(
        &self,
        id: i64,
        form: FeedbackForm,
    ) -> Result<Feedback, FeedbackServiceError> {
        let message = clean(form.message).ok_or(FeedbackServiceError::MissingMessage)?;
        Ok(self.repository.update_message(id, message).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), FeedbackServiceError> {
        self.repository.delete(id).await?;
        tracing::info!("Feedback {} deleted", id);
        Ok(())
    }

    pub async fn count(&self) -> Result<i64, FeedbackServiceError> {
        Ok(self.repository.count().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::feedback_repository::MockFeedbackRepository;
    use mockall::predicate::*;

    #[tokio::test]
    async fn test_create_requires_message() {
        let mut repo = MockFeedbackRepository::new();
        repo.expect_create().times(0);

        let service = FeedbackService::new(Arc::new(repo));
        let result = service
            .create(FeedbackForm {
                name: Some("Ada".to_string()),
                email: None,
                message: Some("   ".to_string()),
            })
            .await;

        assert!(matches!(result, Err(FeedbackServiceError::MissingMessage)));
    }

    #[tokio::test]
    async fn test_create_drops_blank_optional_fields() {
        let mut repo = MockFeedbackRepository::new();
        repo.expect_create()
            .with(eq(None), eq(Some("a@example.com".to_string())), eq("Great notes".to_string()))
            .times(1)
            .returning(|name, email, message| {
                Box::pin(async move {
                    Ok(Feedback {
                        id: 1,
                        name,
                        email,
                        message,
                        created_at: None,
                    })
                })
            });

        let service = FeedbackService::new(Arc::new(repo));
        let feedback = service
            .create(FeedbackForm {
                name: Some("".to_string()),
                email: Some(" a@example.com ".to_string()),
                message: Some("Great notes".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(feedback.id, 1);
        assert!(feedback.name.is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_feedback() {
        let mut repo = MockFeedbackRepository::new();
        repo.expect_delete()
            .with(eq(7))
            .returning(|_| Box::pin(async move { Err(RepositoryError::NotFound) }));

        let service = FeedbackService::new(Arc::new(repo));
        assert!(matches!(
            service.delete(7).await,
            Err(FeedbackServiceError::NotFound)
        ));
    }
}
