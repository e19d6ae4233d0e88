use crate::{
    error::{AppError, Result},
    models::note::{Note, NoteMeta, NotePage, UploadedFile},
    models::visit::DeviceCount,
    services::note_service::{ListNotesRequest, SemesterFilters},
    AppState,
};
use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use serde_json::json;

/// Multipart field carrying the PDF.
pub const FILE_FIELD: &str = "pdfnote";

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub semester: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemesterQuery {
    pub hand_written: Option<String>,
    pub subject_code: Option<String>,
}

pub(crate) fn parse_id(raw: &str) -> Result<i64> {
    raw.parse::<i64>()
        .map_err(|_| AppError::Validation(format!("Invalid id: {}", raw)))
}

fn parse_positive(raw: Option<String>, field: &str) -> Result<Option<i64>> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<i64>()
            .ok()
            .filter(|n| *n > 0)
            .map(Some)
            .ok_or_else(|| AppError::Validation(format!("{} must be a positive integer", field))),
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(AppError::Validation(format!(
            "handWritten must be true or false, got '{}'",
            other
        ))),
    }
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::Validation(err.body_text())
    }
}

/// Splits a note form into its text fields and the optional PDF.
///
/// A file part with no file name and no content is what a browser sends when
/// no file was chosen; it counts as no file.
async fn read_note_form(
    mut multipart: Multipart,
    max_file_bytes: usize,
) -> Result<(NoteMeta, Option<UploadedFile>)> {
    let mut meta = NoteMeta::default();
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == FILE_FIELD {
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await.map_err(multipart_error)?;
            if bytes.is_empty() && file_name.as_deref().map_or(true, str::is_empty) {
                continue;
            }
            if bytes.len() > max_file_bytes {
                return Err(AppError::PayloadTooLarge);
            }
            file = Some(UploadedFile {
                file_name,
                content_type,
                bytes: bytes.to_vec(),
            });
            continue;
        }

        let value = field.text().await.map_err(multipart_error)?;
        match name.as_str() {
            "title" => meta.title = Some(value),
            "description" => meta.description = Some(value),
            "subject" => meta.subject = Some(value),
            "semester" => meta.semester = Some(value),
            "handWritten" if !value.trim().is_empty() => {
                meta.hand_written = Some(parse_bool(&value)?)
            }
            _ => tracing::debug!("Ignoring multipart field '{}'", name),
        }
    }

    Ok((meta, file))
}

pub async fn upload_note(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let (meta, file) = read_note_form(multipart, state.max_upload_bytes).await?;
    let note = state.note_service.upload(meta, file).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn list_notes(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<NotePage>> {
    let request = ListNotesRequest {
        semester: query.semester,
        page: parse_positive(query.page, "page")?,
        limit: parse_positive(query.limit, "limit")?,
    };

    Ok(Json(state.note_service.list(request).await?))
}

pub async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Note>> {
    Ok(Json(state.note_service.get_by_id(parse_id(&id)?).await?))
}

pub async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Note>> {
    let id = parse_id(&id)?;
    let (meta, file) = read_note_form(multipart, state.max_upload_bytes).await?;
    Ok(Json(state.note_service.update(id, meta, file).await?))
}

pub async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    state.note_service.delete(parse_id(&id)?).await?;
    Ok(Json(json!({ "message": "Note deleted successfully" })))
}

pub async fn notes_by_semester(
    State(state): State<AppState>,
    Path(semester): Path<String>,
    Query(query): Query<SemesterQuery>,
) -> Result<Json<Vec<Note>>> {
    let filters = SemesterFilters {
        hand_written: query.hand_written,
        subject_code: query.subject_code,
    };

    Ok(Json(
        state
            .note_service
            .get_notes_by_semester(&semester, filters)
            .await?,
    ))
}

pub async fn total_downloads(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let total = state.note_service.aggregate_total_downloads().await?;
    Ok(Json(json!({ "totalDownloads": total })))
}

pub async fn download_count(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let count = state.note_service.download_count(parse_id(&id)?).await?;
    Ok(Json(json!({ "downloadCount": count })))
}

pub async fn increment_download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let count = state
        .note_service
        .increment_download_count(parse_id(&id)?)
        .await?;
    Ok(Json(json!({ "downloadCount": count })))
}

pub async fn device_counts(State(state): State<AppState>) -> Result<Json<Vec<DeviceCount>>> {
    Ok(Json(state.note_service.device_counts().await?))
}
