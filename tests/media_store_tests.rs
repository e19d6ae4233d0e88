use pdfnotes::services::{
    media_store::NOTES_FOLDER, CloudinaryMediaStore, MediaError, MediaKind, MediaStore,
};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const STORED_URL: &str =
    "https://res.cloudinary.com/demo/raw/upload/v1712345/pdf-notes/notes/abc123.pdf";

fn store_for(server: &MockServer) -> CloudinaryMediaStore {
    CloudinaryMediaStore::new(
        server.uri(),
        "demo".to_string(),
        "test-key".to_string(),
        "test-secret".to_string(),
    )
}

#[tokio::test]
async fn test_store_posts_signed_multipart_upload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/demo/raw/upload"))
        .and(header_regex("content-type", "^multipart/form-data"))
        .and(body_string_contains("pdf-notes/notes"))
        .and(body_string_contains("test-key"))
        .and(body_string_contains("%PDF-1.4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "public_id": "pdf-notes/notes/abc123.pdf",
            "secure_url": STORED_URL,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let url = store_for(&server)
        .store(b"%PDF-1.4 body".to_vec(), NOTES_FOLDER, MediaKind::Raw)
        .await
        .unwrap();

    assert_eq!(url, STORED_URL);
}

#[tokio::test]
async fn test_store_surfaces_remote_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/demo/raw/upload"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"error": {"message": "Invalid Signature"}})),
        )
        .mount(&server)
        .await;

    let result = store_for(&server)
        .store(b"%PDF-1.4".to_vec(), NOTES_FOLDER, MediaKind::Raw)
        .await;

    match result {
        Err(MediaError::Remote { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid Signature");
        }
        other => panic!("expected remote error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_remove_destroys_by_public_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/demo/raw/destroy"))
        .and(body_string_contains("public_id=pdf-notes%2Fnotes%2Fabc123.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    store_for(&server).remove(STORED_URL).await.unwrap();
}

#[tokio::test]
async fn test_remove_missing_object() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/demo/raw/destroy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "not found"})))
        .mount(&server)
        .await;

    let result = store_for(&server).remove(STORED_URL).await;
    assert!(matches!(result, Err(MediaError::NotFound)));
}
