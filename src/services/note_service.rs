use crate::models::note::{NewNote, Note, NoteFilter, NoteMeta, NotePage, UploadedFile};
use crate::models::visit::DeviceCount;
use crate::repositories::{NoteRepository, RepositoryError, VisitRepository};
use crate::services::media_store::{MediaError, MediaKind, MediaStore, NOTES_FOLDER};
use std::sync::Arc;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, thiserror::Error)]
pub enum NoteServiceError {
    #[error("PDF Note is required")]
    MissingFile,
    #[error("Only PDF files are accepted")]
    NotPdf,
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("{0} must be a positive integer")]
    InvalidPagination(&'static str),
    #[error("Note not found")]
    NotFound,
    #[error("Media store error: {0}")]
    Media(#[from] MediaError),
    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for NoteServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => NoteServiceError::NotFound,
            other => NoteServiceError::Repository(other),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListNotesRequest {
    pub semester: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Optional query filters for the per-semester listing, as received.
#[derive(Debug, Clone, Default)]
pub struct SemesterFilters {
    pub hand_written: Option<String>,
    pub subject_code: Option<String>,
}

pub fn normalize_semester(semester: &str) -> String {
    semester.trim().to_uppercase()
}

fn required(value: Option<String>, field: &'static str) -> Result<String, NoteServiceError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(NoteServiceError::MissingField(field))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub struct NoteService {
    notes: Arc<dyn NoteRepository>,
    visits: Arc<dyn VisitRepository>,
    media: Arc<dyn MediaStore>,
}

impl NoteService {
    pub fn new(
        notes: Arc<dyn NoteRepository>,
        visits: Arc<dyn VisitRepository>,
        media: Arc<dyn MediaStore>,
    ) -> Self {
        Self {
            notes,
            visits,
            media,
        }
    }

    /// Stores the PDF, then creates the note pointing at it.
    ///
    /// If the row cannot be written the stored object is removed again.
    pub async fn upload(
        &self,
        meta: NoteMeta,
        file: Option<UploadedFile>,
    ) -> Result<Note, NoteServiceError> {
        let file = Self::checked_pdf(file)?;

        let new_note = NewNote {
            title: required(meta.title, "title")?,
            description: non_blank(meta.description),
            subject: required(meta.subject, "subject")?,
            semester: normalize_semester(&required(meta.semester, "semester")?),
            hand_written: meta
                .hand_written
                .ok_or(NoteServiceError::MissingField("handWritten"))?,
            pdf_url: String::new(),
        };

        let pdf_url = self
            .media
            .store(file.bytes, NOTES_FOLDER, MediaKind::Raw)
            .await?;

        match self
            .notes
            .create(NewNote {
                pdf_url: pdf_url.clone(),
                ..new_note
            })
            .await
        {
            Ok(note) => {
                tracing::info!("Uploaded note {} ({})", note.id, note.title);
                Ok(note)
            }
            Err(e) => {
                tracing::error!("Failed to save note, removing uploaded PDF: {}", e);
                self.remove_media_best_effort(&pdf_url).await;
                Err(e.into())
            }
        }
    }

    pub async fn list(&self, request: ListNotesRequest) -> Result<NotePage, NoteServiceError> {
        let page = request.page.unwrap_or(DEFAULT_PAGE);
        if page < 1 {
            return Err(NoteServiceError::InvalidPagination("page"));
        }
        let limit = request.limit.unwrap_or(DEFAULT_LIMIT);
        if limit < 1 {
            return Err(NoteServiceError::InvalidPagination("limit"));
        }
        let limit = limit.min(MAX_LIMIT);

        let semester = non_blank(request.semester).map(|s| normalize_semester(&s));
        let total_notes = self.notes.count(semester.clone()).await?;
        let offset = (page - 1).saturating_mul(limit);
        let notes = self.notes.list(semester, limit, offset).await?;

        if notes.is_empty() {
            tracing::debug!("No notes found for page {}", page);
        }

        Ok(NotePage {
            notes,
            total_pages: (total_notes + limit - 1) / limit,
            current_page: page,
            total_notes,
        })
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Note, NoteServiceError> {
        self.notes
            .find_by_id(id)
            .await?
            .ok_or(NoteServiceError::NotFound)
    }

    /// Merges the supplied fields into the note; absent fields keep their
    /// stored value. A new file replaces the old one, which is then removed.
    pub async fn update(
        &self,
        id: i64,
        meta: NoteMeta,
        file: Option<UploadedFile>,
    ) -> Result<Note, NoteServiceError> {
        let mut note = self.get_by_id(id).await?;

        if let Some(title) = non_blank(meta.title) {
            note.title = title;
        }
        if let Some(description) = meta.description {
            note.description = non_blank(Some(description));
        }
        if let Some(subject) = non_blank(meta.subject) {
            note.subject = subject;
        }
        if let Some(semester) = non_blank(meta.semester) {
            note.semester = normalize_semester(&semester);
        }
        if let Some(hand_written) = meta.hand_written {
            note.hand_written = hand_written;
        }

        let replaced_url = match file {
            Some(file) => {
                let file = Self::checked_pdf(Some(file))?;
                let new_url = self
                    .media
                    .store(file.bytes, NOTES_FOLDER, MediaKind::Raw)
                    .await?;
                Some(std::mem::replace(&mut note.pdf_url, new_url))
            }
            None => None,
        };

        let saved = match self.notes.update(note.clone()).await {
            Ok(saved) => saved,
            Err(e) => {
                if replaced_url.is_some() {
                    tracing::error!("Failed to update note {}, removing new PDF: {}", id, e);
                    self.remove_media_best_effort(&note.pdf_url).await;
                }
                return Err(e.into());
            }
        };

        if let Some(old_url) = replaced_url {
            self.remove_media_best_effort(&old_url).await;
        }

        tracing::info!("Updated note {}", id);
        Ok(saved)
    }

    /// Deletes the row, then the stored PDF.
    pub async fn delete(&self, id: i64) -> Result<(), NoteServiceError> {
        let note = self.get_by_id(id).await?;
        self.notes.delete(id).await?;
        self.remove_media_best_effort(&note.pdf_url).await;

        tracing::info!("Deleted note {}", id);
        Ok(())
    }

    pub async fn increment_download_count(&self, id: i64) -> Result<i64, NoteServiceError> {
        Ok(self.notes.increment_download_count(id).await?)
    }

    pub async fn download_count(&self, id: i64) -> Result<i64, NoteServiceError> {
        self.notes
            .download_count(id)
            .await?
            .ok_or(NoteServiceError::NotFound)
    }

    /// Equality filter on semester plus whichever optional filters were given.
    pub async fn get_notes_by_semester(
        &self,
        semester: &str,
        filters: SemesterFilters,
    ) -> Result<Vec<Note>, NoteServiceError> {
        let filter = NoteFilter {
            semester: normalize_semester(semester),
            hand_written: non_blank(filters.hand_written).map(|v| v == "true"),
            subject: non_blank(filters.subject_code),
        };

        Ok(self.notes.find_by_filter(filter).await?)
    }

    pub async fn aggregate_total_downloads(&self) -> Result<i64, NoteServiceError> {
        Ok(self.notes.total_downloads().await?)
    }

    pub async fn device_counts(&self) -> Result<Vec<DeviceCount>, NoteServiceError> {
        Ok(self.visits.device_counts().await?)
    }

    fn checked_pdf(file: Option<UploadedFile>) -> Result<UploadedFile, NoteServiceError> {
        let file = file
            .filter(|f| !f.bytes.is_empty())
            .ok_or(NoteServiceError::MissingFile)?;
        if !file.is_pdf() {
            return Err(NoteServiceError::NotPdf);
        }
        Ok(file)
    }

    async fn remove_media_best_effort(&self, url: &str) {
        if let Err(e) = self.media.remove(url).await {
            tracing::warn!("Failed to remove media object {}: {}", url, e);
        }
    }
}
