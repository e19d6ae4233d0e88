use pdfnotes::{
    models::note::{NoteMeta, UploadedFile},
    repositories::{SqliteNoteRepository, SqliteVisitRepository, VisitRepository},
    services::{
        note_service::{ListNotesRequest, NoteService, NoteServiceError, SemesterFilters},
        LocalMediaStore,
    },
    test_utils::test_helpers,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;

fn note_service(pool: SqlitePool, media: &TempDir) -> (NoteService, Arc<LocalMediaStore>) {
    let store = Arc::new(LocalMediaStore::new(
        media.path().to_path_buf(),
        test_helpers::TEST_BASE_URL.to_string(),
    ));
    let service = NoteService::new(
        Arc::new(SqliteNoteRepository::new(pool.clone())),
        Arc::new(SqliteVisitRepository::new(pool)),
        store.clone(),
    );
    (service, store)
}

fn pdf(body: &str) -> UploadedFile {
    UploadedFile {
        file_name: Some("notes.pdf".to_string()),
        content_type: Some("application/pdf".to_string()),
        bytes: format!("%PDF-1.7\n{}", body).into_bytes(),
    }
}

fn meta(title: &str, semester: &str, hand_written: bool) -> NoteMeta {
    NoteMeta {
        title: Some(title.to_string()),
        description: Some("Unit 1 to 5".to_string()),
        subject: Some("CS301".to_string()),
        semester: Some(semester.to_string()),
        hand_written: Some(hand_written),
    }
}

#[tokio::test]
async fn test_upload_stores_file_and_starts_at_zero() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let media = TempDir::new().unwrap();
    let (service, store) = note_service(pool, &media);

    let note = service
        .upload(meta("Operating Systems", "v", true), Some(pdf("os")))
        .await
        .unwrap();

    assert_eq!(note.download_count, 0);
    assert_eq!(note.semester, "V");
    let path = store.path_for_url(&note.pdf_url).unwrap();
    assert!(path.exists());
    assert!(path.starts_with(media.path().join("pdf-notes/notes")));
}

#[tokio::test]
async fn test_upload_without_file_creates_nothing() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let media = TempDir::new().unwrap();
    let (service, _) = note_service(pool, &media);

    let result = service.upload(meta("Empty", "I", false), None).await;
    assert!(matches!(result, Err(NoteServiceError::MissingFile)));

    let page = service.list(ListNotesRequest::default()).await.unwrap();
    assert_eq!(page.total_notes, 0);
}

#[tokio::test]
async fn test_pagination_second_page() {
    let pool = test_helpers::create_test_db().await.unwrap();
    for i in 0..15 {
        test_helpers::insert_test_note(&pool, &format!("note-{}", i), "CS101", "I", false)
            .await
            .unwrap();
    }
    let media = TempDir::new().unwrap();
    let (service, _) = note_service(pool, &media);

    let page = service
        .list(ListNotesRequest {
            semester: None,
            page: Some(2),
            limit: Some(10),
        })
        .await
        .unwrap();

    assert_eq!(page.notes.len(), 5);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.current_page, 2);
    assert_eq!(page.total_notes, 15);
}

#[tokio::test]
async fn test_list_normalizes_semester_filter() {
    let pool = test_helpers::create_test_db().await.unwrap();
    test_helpers::insert_test_note(&pool, "a", "CS101", "III", false)
        .await
        .unwrap();
    test_helpers::insert_test_note(&pool, "b", "CS101", "IV", false)
        .await
        .unwrap();
    let media = TempDir::new().unwrap();
    let (service, _) = note_service(pool, &media);

    let page = service
        .list(ListNotesRequest {
            semester: Some("iii".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(page.total_notes, 1);
    assert_eq!(page.notes[0].title, "a");
    assert_eq!(page.total_pages, 1);
}

#[tokio::test]
async fn test_concurrent_increments_do_not_lose_updates() {
    let (pool, _db_file) = test_helpers::create_test_db_file(5).await.unwrap();
    let id = test_helpers::insert_test_note(&pool, "popular", "CS101", "I", false)
        .await
        .unwrap();
    let media = TempDir::new().unwrap();
    let (service, _) = note_service(pool, &media);
    let service = Arc::new(service);

    let handles: Vec<_> = (0..25)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.increment_download_count(id).await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(service.download_count(id).await.unwrap(), 25);
    assert_eq!(service.aggregate_total_downloads().await.unwrap(), 25);
}

#[tokio::test]
async fn test_increment_missing_note() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let media = TempDir::new().unwrap();
    let (service, _) = note_service(pool, &media);

    assert!(matches!(
        service.increment_download_count(42).await,
        Err(NoteServiceError::NotFound)
    ));
    assert!(matches!(
        service.download_count(42).await,
        Err(NoteServiceError::NotFound)
    ));
}

#[tokio::test]
async fn test_delete_removes_row_and_file() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let media = TempDir::new().unwrap();
    let (service, store) = note_service(pool, &media);

    let note = service
        .upload(meta("Networks", "VI", false), Some(pdf("net")))
        .await
        .unwrap();
    let path = store.path_for_url(&note.pdf_url).unwrap();
    assert!(path.exists());

    service.delete(note.id).await.unwrap();

    assert!(!path.exists());
    assert!(matches!(
        service.get_by_id(note.id).await,
        Err(NoteServiceError::NotFound)
    ));
    assert!(matches!(
        service.delete(note.id).await,
        Err(NoteServiceError::NotFound)
    ));
}

#[tokio::test]
async fn test_update_replaces_file_and_keeps_absent_fields() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let media = TempDir::new().unwrap();
    let (service, store) = note_service(pool, &media);

    let original = service
        .upload(meta("Compilers", "VII", true), Some(pdf("v1")))
        .await
        .unwrap();
    let old_path = store.path_for_url(&original.pdf_url).unwrap();

    let updated = service
        .update(
            original.id,
            NoteMeta {
                title: Some("Compiler Design".to_string()),
                ..NoteMeta::default()
            },
            Some(pdf("v2")),
        )
        .await
        .unwrap();

    assert_eq!(updated.title, "Compiler Design");
    assert_eq!(updated.subject, "CS301");
    assert_eq!(updated.semester, "VII");
    assert!(updated.hand_written);
    assert_ne!(updated.pdf_url, original.pdf_url);
    assert!(!old_path.exists());
    assert!(store.path_for_url(&updated.pdf_url).unwrap().exists());
}

#[tokio::test]
async fn test_notes_by_semester_filters() {
    let pool = test_helpers::create_test_db().await.unwrap();
    test_helpers::insert_test_note(&pool, "typed", "CS101", "3", false)
        .await
        .unwrap();
    test_helpers::insert_test_note(&pool, "written", "CS101", "3", true)
        .await
        .unwrap();
    test_helpers::insert_test_note(&pool, "maths", "MA201", "3", true)
        .await
        .unwrap();
    test_helpers::insert_test_note(&pool, "elsewhere", "CS101", "4", true)
        .await
        .unwrap();
    let media = TempDir::new().unwrap();
    let (service, _) = note_service(pool, &media);

    let written = service
        .get_notes_by_semester(
            "3",
            SemesterFilters {
                hand_written: Some("true".to_string()),
                subject_code: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(written.len(), 2);
    assert!(written.iter().all(|n| n.semester == "3" && n.hand_written));

    let cs_written = service
        .get_notes_by_semester(
            "3",
            SemesterFilters {
                hand_written: Some("true".to_string()),
                subject_code: Some("CS101".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(cs_written.len(), 1);
    assert_eq!(cs_written[0].title, "written");

    let all = service
        .get_notes_by_semester("3", SemesterFilters::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn test_device_counts() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let visits = SqliteVisitRepository::new(pool.clone());
    visits.record("iPhone (iOS 17)").await.unwrap();
    visits.record("iPhone (iOS 17)").await.unwrap();
    visits.record("Other (Windows 10)").await.unwrap();
    let media = TempDir::new().unwrap();
    let (service, _) = note_service(pool, &media);

    let counts = service.device_counts().await.unwrap();
    assert_eq!(counts.len(), 2);
    assert_eq!(counts[0].device, "iPhone (iOS 17)");
    assert_eq!(counts[0].count, 2);
}
