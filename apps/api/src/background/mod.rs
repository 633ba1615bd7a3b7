//! Background-removal client. Sends the raw upload to remove.bg and returns
//! the background-stripped image bytes.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

use crate::errors::AppError;

/// A photo as received from the client.
#[derive(Debug, Clone)]
pub struct UploadedPhoto {
    pub original_filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Image bytes returned by the background-removal provider.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

#[derive(Debug, Error)]
pub enum BackgroundRemovalError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("REMOVE_BG_API_KEY is not set")]
    MissingApiKey,
}

impl From<BackgroundRemovalError> for AppError {
    fn from(err: BackgroundRemovalError) -> Self {
        match err {
            BackgroundRemovalError::Rejected { status, body } => {
                AppError::BackgroundRemovalRejected { status, body }
            }
            BackgroundRemovalError::MissingApiKey => AppError::Configuration(err.to_string()),
            BackgroundRemovalError::Http(e) => AppError::BackgroundRemoval(e.to_string()),
        }
    }
}

/// Exchanges a raw photo for a background-stripped image.
///
/// Carried in `AppState` as `Arc<dyn BackgroundRemover>`.
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    async fn remove_background(&self, photo: &UploadedPhoto) -> Result<ProcessedImage, AppError>;
}

/// remove.bg API client. No retries and no timeout override: a hung provider
/// holds the request until it answers.
#[derive(Clone)]
pub struct RemoveBgClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl RemoveBgClient {
    pub fn new(endpoint: String, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            api_key,
        }
    }

    pub async fn call(&self, photo: &UploadedPhoto) -> Result<ProcessedImage, BackgroundRemovalError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(BackgroundRemovalError::MissingApiKey)?;

        let form = Form::new()
            .part("image_file", image_part(photo))
            .text("size", "auto");

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Api-Key", api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!("Failed to read remove.bg error body: {e}");
                    String::new()
                }
            };
            warn!("remove.bg returned {}: {}", status, body);
            return Err(BackgroundRemovalError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let bytes = response.bytes().await?;

        debug!(
            "remove.bg succeeded: {} bytes in, {} bytes out",
            photo.bytes.len(),
            bytes.len()
        );

        Ok(ProcessedImage {
            bytes,
            content_type,
        })
    }
}

/// The upload as an `image_file` part. A content type that does not parse
/// as a MIME type is left off rather than failing the request.
fn image_part(photo: &UploadedPhoto) -> Part {
    let part = || Part::bytes(photo.bytes.to_vec()).file_name(photo.original_filename.clone());
    match photo.content_type.as_deref() {
        Some(content_type) => part().mime_str(content_type).unwrap_or_else(|e| {
            warn!("Ignoring unparseable content type {content_type:?}: {e}");
            part()
        }),
        None => part(),
    }
}

#[async_trait]
impl BackgroundRemover for RemoveBgClient {
    async fn remove_background(&self, photo: &UploadedPhoto) -> Result<ProcessedImage, AppError> {
        Ok(self.call(photo).await?)
    }
}
