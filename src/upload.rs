//! Profile-picture upload encodings.
//!
//! Where a writable file system is available the picture is streamed from a
//! file as `multipart/form-data`. Otherwise it is sent base64-encoded inside a
//! JSON body. The encoding is chosen once at startup with [`select_uploader`].

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::RequestBuilder;
use serde::Deserialize;
use serde_json::json;
use tempfile::NamedTempFile;

use crate::error::{ClientError, ClientResult};

pub const FIELD_NAME: &str = "profile_picture";
pub const DEFAULT_FILE_NAME: &str = "profile.jpg";
const DEFAULT_MIME: &str = "image/jpeg";

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UploadMode {
    /// Multipart when a temp file can be created, base64 otherwise.
    #[default]
    Auto,
    Multipart,
    Base64,
}

impl UploadMode {
    pub fn resolve(self) -> UploadMode {
        match self {
            UploadMode::Auto => {
                if tempfile::tempfile().is_ok() {
                    UploadMode::Multipart
                } else {
                    UploadMode::Base64
                }
            }
            other => other,
        }
    }
}

/// Where the picture comes from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    Bytes(Vec<u8>),
    /// `data:image/png;base64,....` or a bare `base64,....` string.
    DataUri(String),
    File(PathBuf),
}

impl ImageSource {
    fn declared_mime(&self) -> Option<&str> {
        match self {
            ImageSource::DataUri(uri) => uri
                .strip_prefix("data:")
                .and_then(|rest| rest.split(';').next())
                .filter(|mime| mime.starts_with("image/")),
            _ => None,
        }
    }

    async fn into_bytes(self) -> ClientResult<Vec<u8>> {
        match self {
            ImageSource::Bytes(bytes) => Ok(bytes),
            ImageSource::DataUri(uri) => decode_data_uri(&uri),
            ImageSource::File(path) => Ok(tokio::fs::read(&path).await?),
        }
    }
}

fn decode_data_uri(uri: &str) -> ClientResult<Vec<u8>> {
    let encoded = match uri.find("base64,") {
        Some(idx) => &uri[idx + "base64,".len()..],
        None => uri,
    };
    STANDARD
        .decode(encoded.trim())
        .map_err(|e| ClientError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

fn mime_for(file_name: &str, image: &ImageSource) -> String {
    if let Some(mime) = image.declared_mime() {
        return mime.to_string();
    }
    mime_guess::from_path(file_name)
        .first()
        .filter(|mime| mime.type_() == mime_guess::mime::IMAGE)
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| DEFAULT_MIME.to_string())
}

/// A request ready to send, plus the scratch file backing it (if any).
///
/// The scratch file is deleted when this value, or the guard returned by
/// [`PreparedUpload::into_parts`], is dropped.
pub struct PreparedUpload {
    request: RequestBuilder,
    scratch: Option<NamedTempFile>,
}

impl PreparedUpload {
    pub fn scratch_path(&self) -> Option<&Path> {
        self.scratch.as_ref().map(|f| f.path())
    }

    pub fn into_parts(self) -> (RequestBuilder, Option<NamedTempFile>) {
        (self.request, self.scratch)
    }
}

#[async_trait]
pub trait ImageUploader: Send + Sync {
    fn mode(&self) -> UploadMode;

    /// Attach `image` to `request` in this uploader's encoding.
    async fn prepare(
        &self,
        request: RequestBuilder,
        image: ImageSource,
        file_name: &str,
    ) -> ClientResult<PreparedUpload>;
}

pub struct MultipartUploader;

#[async_trait]
impl ImageUploader for MultipartUploader {
    fn mode(&self) -> UploadMode {
        UploadMode::Multipart
    }

    async fn prepare(
        &self,
        request: RequestBuilder,
        image: ImageSource,
        file_name: &str,
    ) -> ClientResult<PreparedUpload> {
        let mime = mime_for(file_name, &image);

        let (path, scratch) = match image {
            ImageSource::File(path) => (path, None),
            other => {
                let bytes = other.into_bytes().await?;
                let scratch = tempfile::Builder::new()
                    .prefix("safeclass_profile_")
                    .tempfile()?;
                tokio::fs::write(scratch.path(), &bytes).await?;
                tracing::debug!("Wrote upload scratch file {}", scratch.path().display());
                (scratch.path().to_path_buf(), Some(scratch))
            }
        };

        let file = tokio::fs::File::open(&path).await?;
        let len = file.metadata().await?.len();
        let part = Part::stream_with_length(file, len)
            .file_name(file_name.to_string())
            .mime_str(&mime)
            .map_err(|e| ClientError::Io(io::Error::new(io::ErrorKind::InvalidInput, e)))?;

        let request = request
            .header(ACCEPT, "application/json")
            .multipart(Form::new().part(FIELD_NAME, part));

        Ok(PreparedUpload { request, scratch })
    }
}

pub struct Base64Uploader;

#[async_trait]
impl ImageUploader for Base64Uploader {
    fn mode(&self) -> UploadMode {
        UploadMode::Base64
    }

    async fn prepare(
        &self,
        request: RequestBuilder,
        image: ImageSource,
        file_name: &str,
    ) -> ClientResult<PreparedUpload> {
        let mime = mime_for(file_name, &image);
        let bytes = image.into_bytes().await?;

        let request = request.header(ACCEPT, "application/json").json(&json!({
            "profile_picture": STANDARD.encode(bytes),
            "filename": file_name,
            "mimetype": mime,
        }));

        Ok(PreparedUpload {
            request,
            scratch: None,
        })
    }
}

pub fn select_uploader(mode: UploadMode) -> Arc<dyn ImageUploader> {
    match mode.resolve() {
        UploadMode::Base64 => Arc::new(Base64Uploader),
        _ => Arc::new(MultipartUploader),
    }
}
