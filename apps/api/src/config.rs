use std::path::PathBuf;

use anyhow::{Context, Result};

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_REMOVE_BG_URL: &str = "https://api.remove.bg/v1.0/removebg";
const DEFAULT_PUBLIC_BASE_URL: &str = "http://127.0.0.1:8000";

/// Application configuration loaded from environment variables.
/// Only `DATABASE_URL` is required at startup. Provider keys are checked
/// when the corresponding provider is first called.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub remove_bg_api_key: Option<String>,
    pub remove_bg_url: String,
    pub upload_dir: PathBuf,
    /// Scheme + host used to build the public URL of processed images.
    pub public_base_url: String,
    pub port: u16,
    pub body_limit_bytes: usize,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let body_limit_mb = std::env::var("BODY_LIMIT_MB")
            .unwrap_or_else(|_| "20".to_string())
            .parse::<usize>()
            .context("BODY_LIMIT_MB must be a valid integer")?;

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            openai_api_key: optional_env("OPENAI_API_KEY"),
            openai_base_url: optional_env("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            remove_bg_api_key: optional_env("REMOVE_BG_API_KEY"),
            remove_bg_url: optional_env("REMOVE_BG_URL")
                .unwrap_or_else(|| DEFAULT_REMOVE_BG_URL.to_string()),
            upload_dir: PathBuf::from(
                optional_env("UPLOAD_DIR").unwrap_or_else(|| "uploads".to_string()),
            ),
            public_base_url: normalize_base_url(
                &optional_env("PUBLIC_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_PUBLIC_BASE_URL.to_string()),
            ),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            body_limit_bytes: body_limit_mb * 1024 * 1024,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank variables are both treated as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
