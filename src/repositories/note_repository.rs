use super::{RepositoryError, RepositoryResult};
use crate::models::note::{NewNote, Note, NoteFilter};
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const NOTE_COLUMNS: &str = "id, title, description, subject, semester, hand_written, pdf_url, \
     download_count, created_at, updated_at";

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait NoteRepository: Send + Sync {
    async fn create(&self, note: NewNote) -> RepositoryResult<Note>;
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Note>>;
    async fn list(
        &self,
        semester: Option<String>,
        limit: i64,
        offset: i64,
    ) -> RepositoryResult<Vec<Note>>;
    async fn count(&self, semester: Option<String>) -> RepositoryResult<i64>;
    async fn find_by_filter(&self, filter: NoteFilter) -> RepositoryResult<Vec<Note>>;
    /// Overwrites every mutable column with the values in `note`.
    async fn update(&self, note: Note) -> RepositoryResult<Note>;
    async fn delete(&self, id: i64) -> RepositoryResult<()>;
    /// Adds one to the counter in a single statement and returns the new value.
    async fn increment_download_count(&self, id: i64) -> RepositoryResult<i64>;
    async fn download_count(&self, id: i64) -> RepositoryResult<Option<i64>>;
    async fn total_downloads(&self) -> RepositoryResult<i64>;
}

pub struct SqliteNoteRepository {
    pool: SqlitePool,
}

impl SqliteNoteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoteRepository for SqliteNoteRepository {
    async fn create(&self, note: NewNote) -> RepositoryResult<Note> {
        let sql = format!(
            "INSERT INTO notes (title, description, subject, semester, hand_written, pdf_url) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING {}",
            NOTE_COLUMNS
        );

        Ok(sqlx::query_as::<_, Note>(&sql)
            .bind(&note.title)
            .bind(&note.description)
            .bind(&note.subject)
            .bind(&note.semester)
            .bind(note.hand_written)
            .bind(&note.pdf_url)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Note>> {
        let sql = format!("SELECT {} FROM notes WHERE id = ?", NOTE_COLUMNS);
        Ok(sqlx::query_as::<_, Note>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list(
        &self,
        semester: Option<String>,
        limit: i64,
        offset: i64,
    ) -> RepositoryResult<Vec<Note>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM notes", NOTE_COLUMNS));
        if let Some(semester) = semester {
            builder.push(" WHERE semester = ").push_bind(semester);
        }
        builder
            .push(" ORDER BY id ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        Ok(builder
            .build_query_as::<Note>()
            .fetch_all(&self.pool)
            .await?)
    }

    async fn count(&self, semester: Option<String>) -> RepositoryResult<i64> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM notes");
        if let Some(semester) = semester {
            builder.push(" WHERE semester = ").push_bind(semester);
        }

        let (count,): (i64,) = builder.build_query_as().fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn find_by_filter(&self, filter: NoteFilter) -> RepositoryResult<Vec<Note>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM notes WHERE semester = ", NOTE_COLUMNS));
        builder.push_bind(filter.semester);
        if let Some(hand_written) = filter.hand_written {
            builder.push(" AND hand_written = ").push_bind(hand_written);
        }
        if let Some(subject) = filter.subject {
            builder.push(" AND subject = ").push_bind(subject);
        }
        builder.push(" ORDER BY id ASC");

        Ok(builder
            .build_query_as::<Note>()
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update(&self, note: Note) -> RepositoryResult<Note> {
        let sql = format!(
            "UPDATE notes SET title = ?, description = ?, subject = ?, semester = ?, \
             hand_written = ?, pdf_url = ?, updated_at = CURRENT_TIMESTAMP \
             WHERE id = ? RETURNING {}",
            NOTE_COLUMNS
        );

        sqlx::query_as::<_, Note>(&sql)
            .bind(&note.title)
            .bind(&note.description)
            .bind(&note.subject)
            .bind(&note.semester)
            .bind(note.hand_written)
            .bind(&note.pdf_url)
            .bind(note.id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: i64) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn increment_download_count(&self, id: i64) -> RepositoryResult<i64> {
        let row: Option<(i64,)> = sqlx::query_as(
            "UPDATE notes SET download_count = download_count + 1 WHERE id = ? \
             RETURNING download_count",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(count,)| count).ok_or(RepositoryError::NotFound)
    }

    async fn download_count(&self, id: i64) -> RepositoryResult<Option<i64>> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT download_count FROM notes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(count,)| count))
    }

    async fn total_downloads(&self) -> RepositoryResult<i64> {
        let (total,): (i64,) =
            sqlx::query_as("SELECT COALESCE(SUM(download_count), 0) FROM notes")
                .fetch_one(&self.pool)
                .await?;

        Ok(total)
    }
}
