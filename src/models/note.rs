use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub subject: String,
    pub semester: String,
    pub hand_written: bool,
    pub pdf_url: String,
    pub download_count: i64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Row values for inserting a note. The PDF must already be stored.
#[derive(Debug, Clone)]
pub struct NewNote {
    pub title: String,
    pub description: Option<String>,
    pub subject: String,
    pub semester: String,
    pub hand_written: bool,
    pub pdf_url: String,
}

/// Text fields of an upload or update form.
///
/// Every field is optional here; `NoteService` decides which ones are required
/// for the operation at hand.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub subject: Option<String>,
    pub semester: Option<String>,
    pub hand_written: Option<bool>,
}

/// An uploaded file held in memory.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// The content must start with the PDF signature. A declared content type,
    /// when present, must also be PDF or a generic binary type.
    pub fn is_pdf(&self) -> bool {
        let declared_ok = match self.content_type.as_deref() {
            None => true,
            Some(ct) => {
                let essence = ct.split(';').next().unwrap_or_default().trim();
                essence.eq_ignore_ascii_case("application/pdf")
                    || essence.eq_ignore_ascii_case("application/octet-stream")
            }
        };

        declared_ok && self.bytes.starts_with(b"%PDF-")
    }
}

/// Equality filter for `GET /api/notes/semester/{semester}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteFilter {
    pub semester: String,
    pub hand_written: Option<bool>,
    pub subject: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePage {
    pub notes: Vec<Note>,
    pub total_pages: i64,
    pub current_page: i64,
    pub total_notes: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(content_type: Option<&str>, bytes: &[u8]) -> UploadedFile {
        UploadedFile {
            file_name: Some("notes.pdf".to_string()),
            content_type: content_type.map(str::to_string),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn test_pdf_signature_is_required() {
        assert!(upload(Some("application/pdf"), b"%PDF-1.7 body").is_pdf());
        assert!(upload(None, b"%PDF-1.4").is_pdf());
        assert!(upload(Some("application/octet-stream"), b"%PDF-1.4").is_pdf());

        // A PDF label alone is not enough
        assert!(!upload(Some("application/pdf"), b"MZ\x90\x00 program").is_pdf());
    }

    #[test]
    fn test_declared_type_must_agree() {
        assert!(!upload(Some("text/html"), b"%PDF-1.4").is_pdf());
        assert!(upload(Some("Application/PDF; charset=binary"), b"%PDF-1.4").is_pdf());
    }
}
