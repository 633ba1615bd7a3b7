//! Vision client: the single point of entry for garment classification calls.
//!
//! Sends the processed image to the OpenAI chat completions API as a base64
//! data URL and constrains the answer with a JSON schema.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::background::ProcessedImage;
use crate::errors::AppError;
use crate::models::classification::GarmentClassification;

pub mod prompts;

use prompts::{clothing_schema, CLASSIFY_PROMPT, CLASSIFY_SYSTEM, SCHEMA_NAME};

/// Vision-capable model used for classification.
pub const MODEL: &str = "gpt-4o-mini";
const FALLBACK_IMAGE_MIME: &str = "image/png";

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("model refused: {0}")]
    Refusal(String),

    #[error("model returned empty content")]
    EmptyContent,

    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,
}

impl From<VisionError> for AppError {
    fn from(err: VisionError) -> Self {
        match err {
            VisionError::MissingApiKey => AppError::Configuration(err.to_string()),
            other => AppError::Classification(other.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat<'a>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: MessageContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    format_type: &'a str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'a str,
    schema: &'a Value,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
    #[serde(default)]
    pub refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Classifies a processed garment image.
///
/// Carried in `AppState` as `Arc<dyn GarmentClassifier>`.
#[async_trait]
pub trait GarmentClassifier: Send + Sync {
    async fn classify(&self, image: &ProcessedImage) -> Result<GarmentClassification, AppError>;
}

/// OpenAI chat completions client. One attempt per call, no timeout override.
#[derive(Clone)]
pub struct VisionClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    schema: Value,
}

impl VisionClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            schema: clothing_schema(),
        }
    }

    fn build_request<'a>(&'a self, image_url: String) -> ChatRequest<'a> {
        ChatRequest {
            model: MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(CLASSIFY_SYSTEM),
                },
                ChatMessage {
                    role: "user",
                    content: MessageContent::Parts(vec![
                        ContentPart::Text {
                            text: CLASSIFY_PROMPT,
                        },
                        ContentPart::ImageUrl {
                            image_url: ImageUrl { url: image_url },
                        },
                    ]),
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: SCHEMA_NAME,
                    schema: &self.schema,
                },
            },
        }
    }

    /// Makes one call to the chat completions API and returns the raw response.
    pub async fn call(&self, image: &ProcessedImage) -> Result<ChatResponse, VisionError> {
        let api_key = self.api_key.as_deref().ok_or(VisionError::MissingApiKey)?;
        let request_body = self.build_request(image_data_url(image));

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(VisionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat_response: ChatResponse = response.json().await?;

        if let Some(usage) = &chat_response.usage {
            debug!(
                "Vision call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        Ok(chat_response)
    }

    /// Calls the model and parses its answer into a `GarmentClassification`.
    pub async fn classify_image(
        &self,
        image: &ProcessedImage,
    ) -> Result<GarmentClassification, VisionError> {
        let response = self.call(image).await?;
        classification_from_response(&response)
    }
}

#[async_trait]
impl GarmentClassifier for VisionClient {
    async fn classify(&self, image: &ProcessedImage) -> Result<GarmentClassification, AppError> {
        Ok(self.classify_image(image).await?)
    }
}

fn classification_from_response(
    response: &ChatResponse,
) -> Result<GarmentClassification, VisionError> {
    let message = &response
        .choices
        .first()
        .ok_or(VisionError::EmptyContent)?
        .message;

    if let Some(refusal) = &message.refusal {
        return Err(VisionError::Refusal(refusal.clone()));
    }

    let text = message.content.as_deref().ok_or(VisionError::EmptyContent)?;
    parse_classification(text)
}

fn parse_classification(text: &str) -> Result<GarmentClassification, VisionError> {
    let text = strip_json_fences(text);
    if text.is_empty() {
        return Err(VisionError::EmptyContent);
    }
    Ok(serde_json::from_str(text)?)
}

/// Encodes the image as a `data:` URL. The provider's content type is used
/// when it names an image type.
fn image_data_url(image: &ProcessedImage) -> String {
    let mime = image
        .content_type
        .as_deref()
        .filter(|ct| ct.starts_with("image/"))
        .unwrap_or(FALLBACK_IMAGE_MIME);
    let encoded = base64::engine::general_purpose::STANDARD.encode(&image.bytes);
    format!("data:{mime};base64,{encoded}")
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));
    match inner {
        Some(stripped) => stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start()),
        None => text,
    }
}
