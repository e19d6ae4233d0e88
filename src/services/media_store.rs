//! Media storage for uploaded PDF notes
//!
//! Notes never hold file bytes themselves, only the URL returned by a
//! [`MediaStore`]. Two backends are provided:
//!
//! - [`CloudinaryMediaStore`] uploads to a Cloudinary-compatible REST API
//!   using signed multipart requests.
//! - [`LocalMediaStore`] writes into a directory that the server exposes
//!   under `/media`; it is used when no remote credentials are configured.
//!
//! `remove` is expected to be called best-effort by callers: a failure to
//! delete an object is logged and never undoes the primary operation.

use crate::config::MediaConfig;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::{
    path::{Component, Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use uuid::Uuid;

/// Folder every note PDF is stored under.
pub const NOTES_FOLDER: &str = "pdf-notes/notes";

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Upload transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Media store rejected the request ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Unexpected media store response: {0}")]
    InvalidResponse(String),

    #[error("Cannot derive object id from URL: {0}")]
    InvalidUrl(String),

    #[error("Media object not found")]
    NotFound,

    #[error("Media storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Arbitrary files such as PDFs.
    Raw,
    Image,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Raw => "raw",
            MediaKind::Image => "image",
        }
    }
}

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait MediaStore: Send + Sync {
    /// Uploads `bytes` into `folder` and returns a durable retrieval URL.
    async fn store(&self, bytes: Vec<u8>, folder: &str, kind: MediaKind)
        -> Result<String, MediaError>;

    /// Deletes the object a previous `store` call returned `url` for.
    async fn remove(&self, url: &str) -> Result<(), MediaError>;
}

pub fn create_media_store(config: &MediaConfig) -> Result<Arc<dyn MediaStore>, MediaError> {
    match config {
        MediaConfig::Cloudinary {
            cloud_name,
            api_key,
            api_secret,
            api_url,
        } => {
            tracing::info!("Using Cloudinary media store (cloud: {})", cloud_name);
            Ok(Arc::new(CloudinaryMediaStore::new(
                api_url.clone(),
                cloud_name.clone(),
                api_key.clone(),
                api_secret.clone(),
            )))
        }
        MediaConfig::Local {
            dir,
            public_base_url,
        } => {
            std::fs::create_dir_all(dir)?;
            tracing::info!(
                "Cloudinary not configured. Storing media locally in {}",
                dir.display()
            );
            Ok(Arc::new(LocalMediaStore::new(
                dir.clone(),
                public_base_url.clone(),
            )))
        }
    }
}

fn extension_for(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"%PDF-") {
        "pdf"
    } else {
        "bin"
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct RemoteErrorBody {
    error: RemoteErrorMessage,
}

#[derive(Debug, Deserialize)]
struct RemoteErrorMessage {
    message: String,
}

/// Cloudinary-compatible remote store.
#[derive(Clone)]
pub struct CloudinaryMediaStore {
    client: reqwest::Client,
    api_url: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

impl std::fmt::Debug for CloudinaryMediaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryMediaStore")
            .field("api_url", &self.api_url)
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

impl CloudinaryMediaStore {
    pub fn new(api_url: String, cloud_name: String, api_key: String, api_secret: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            api_url,
            cloud_name,
            api_key,
            api_secret,
        }
    }

    fn endpoint(&self, kind: MediaKind, action: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.api_url,
            self.cloud_name,
            kind.as_str(),
            action
        )
    }

    /// Signs `params` the way the upload API expects: parameters sorted by
    /// name, joined as `k=v&k=v`, suffixed with the secret, SHA-256 hex.
    pub fn sign(&self, params: &[(&str, &str)]) -> String {
        let mut sorted: Vec<&(&str, &str)> = params.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        let joined = sorted
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(joined.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Derives `(kind, public_id)` from a delivery URL such as
    /// `https://res.cloudinary.com/demo/raw/upload/v1712/pdf-notes/notes/abc.pdf`.
    ///
    /// Raw resources keep their extension in the public id; images do not.
    pub fn public_id_from_url(url: &str) -> Result<(MediaKind, String), MediaError> {
        let parsed =
            reqwest::Url::parse(url).map_err(|_| MediaError::InvalidUrl(url.to_string()))?;
        let segments: Vec<&str> = parsed
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        let upload_idx = segments
            .iter()
            .position(|seg| *seg == "upload")
            .filter(|idx| *idx >= 1)
            .ok_or_else(|| MediaError::InvalidUrl(url.to_string()))?;

        let kind = match segments[upload_idx - 1] {
            "raw" => MediaKind::Raw,
            "image" => MediaKind::Image,
            _ => return Err(MediaError::InvalidUrl(url.to_string())),
        };

        let mut rest = &segments[upload_idx + 1..];
        if let Some(first) = rest.first() {
            if first.len() > 1
                && first.starts_with('v')
                && first[1..].chars().all(|c| c.is_ascii_digit())
            {
                rest = &rest[1..];
            }
        }
        if rest.is_empty() {
            return Err(MediaError::InvalidUrl(url.to_string()));
        }

        let mut public_id = rest.join("/");
        if kind == MediaKind::Image {
            if let Some(dot) = public_id.rfind('.') {
                if dot > public_id.rfind('/').map(|s| s + 1).unwrap_or(0) {
                    public_id.truncate(dot);
                }
            }
        }

        Ok((kind, public_id))
    }

    async fn remote_error(response: reqwest::Response) -> MediaError {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<RemoteErrorBody>(&text)
            .map(|body| body.error.message)
            .unwrap_or(text);
        MediaError::Remote { status, message }
    }
}

#[async_trait]
impl MediaStore for CloudinaryMediaStore {
    async fn store(
        &self,
        bytes: Vec<u8>,
        folder: &str,
        kind: MediaKind,
    ) -> Result<String, MediaError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.sign(&[("folder", folder), ("timestamp", &timestamp)]);
        let size = bytes.len();

        let file_part = Part::bytes(bytes)
            .file_name(format!("upload.{}", extension_for_kind(kind)))
            .mime_str(mime_for_kind(kind))?;

        let form = Form::new()
            .part("file", file_part)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", folder.to_string())
            .text("signature_algorithm", "sha256")
            .text("signature", signature);

        tracing::debug!("Uploading {} bytes to media store folder {}", size, folder);

        let response = self
            .client
            .post(self.endpoint(kind, "upload"))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::remote_error(response).await);
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| MediaError::InvalidResponse(e.to_string()))?;

        tracing::info!("Stored media object at {}", body.secure_url);
        Ok(body.secure_url)
    }

    async fn remove(&self, url: &str) -> Result<(), MediaError> {
        let (kind, public_id) = Self::public_id_from_url(url)?;
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.sign(&[("public_id", &public_id), ("timestamp", &timestamp)]);

        let response = self
            .client
            .post(self.endpoint(kind, "destroy"))
            .form(&[
                ("public_id", public_id.as_str()),
                ("timestamp", timestamp.as_str()),
                ("api_key", self.api_key.as_str()),
                ("signature_algorithm", "sha256"),
                ("signature", signature.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::remote_error(response).await);
        }

        let body: DestroyResponse = response
            .json()
            .await
            .map_err(|e| MediaError::InvalidResponse(e.to_string()))?;

        match body.result.as_str() {
            "ok" => {
                tracing::info!("Removed media object {}", public_id);
                Ok(())
            }
            "not found" => Err(MediaError::NotFound),
            other => Err(MediaError::InvalidResponse(other.to_string())),
        }
    }
}

fn extension_for_kind(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Raw => "pdf",
        MediaKind::Image => "png",
    }
}

fn mime_for_kind(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Raw => "application/pdf",
        MediaKind::Image => "image/png",
    }
}

/// Directory-backed store for development and tests.
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalMediaStore {
    pub fn new(root: PathBuf, public_base_url: String) -> Self {
        Self {
            root,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url_prefix(&self) -> String {
        format!("{}/media/", self.public_base_url)
    }

    /// Maps a URL produced by this store back to a file under `root`.
    pub fn path_for_url(&self, url: &str) -> Result<PathBuf, MediaError> {
        let relative = url
            .strip_prefix(&self.url_prefix())
            .ok_or_else(|| MediaError::InvalidUrl(url.to_string()))?;

        let mut resolved = self.root.clone();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                _ => return Err(MediaError::InvalidUrl(url.to_string())),
            }
        }

        if resolved == self.root {
            return Err(MediaError::InvalidUrl(url.to_string()));
        }

        Ok(resolved)
    }

    fn safe_folder(folder: &str) -> Result<PathBuf, MediaError> {
        let mut path = PathBuf::new();
        for component in Path::new(folder).components() {
            match component {
                Component::Normal(part) => path.push(part),
                _ => return Err(MediaError::InvalidUrl(folder.to_string())),
            }
        }
        Ok(path)
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn store(
        &self,
        bytes: Vec<u8>,
        folder: &str,
        _kind: MediaKind,
    ) -> Result<String, MediaError> {
        let folder_path = Self::safe_folder(folder)?;
        let file_name = format!("{}.{}", Uuid::new_v4(), extension_for(&bytes));

        let dir = self.root.join(&folder_path);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&file_name), &bytes).await?;

        let url = format!(
            "{}{}/{}",
            self.url_prefix(),
            folder_path.to_string_lossy().replace('\\', "/"),
            file_name
        );
        tracing::debug!("Stored {} bytes locally at {}", bytes.len(), url);
        Ok(url)
    }

    async fn remove(&self, url: &str) -> Result<(), MediaError> {
        let path = self.path_for_url(url)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(MediaError::NotFound),
            Err(e) => Err(MediaError::Io(e)),
        }
    }
}
