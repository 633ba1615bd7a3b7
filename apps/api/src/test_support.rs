//! In-memory stand-ins for the external collaborators, shared by test modules.

use std::path::Path;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;

use crate::background::{BackgroundRemover, ProcessedImage, UploadedPhoto};
use crate::config::Config;
use crate::errors::AppError;
use crate::models::classification::{GarmentClassification, Seasons};
use crate::models::clothing::{ClothingItem, NewClothingItem};
use crate::state::AppState;
use crate::vision_client::GarmentClassifier;
use crate::wardrobe::repository::{ClosetFilter, ItemStore};

pub const PROCESSED_BYTES: &[u8] = b"\x89PNG processed";

pub enum RemoverOutcome {
    Success,
    Rejected { status: u16, body: String },
}

pub struct FakeRemover {
    outcome: RemoverOutcome,
    pub calls: AtomicUsize,
}

impl FakeRemover {
    pub fn succeeding() -> Self {
        Self {
            outcome: RemoverOutcome::Success,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn rejecting(status: u16, body: &str) -> Self {
        Self {
            outcome: RemoverOutcome::Rejected {
                status,
                body: body.to_string(),
            },
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl BackgroundRemover for FakeRemover {
    async fn remove_background(&self, _photo: &UploadedPhoto) -> Result<ProcessedImage, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            RemoverOutcome::Success => Ok(ProcessedImage {
                bytes: Bytes::from_static(PROCESSED_BYTES),
                content_type: Some("image/png".to_string()),
            }),
            RemoverOutcome::Rejected { status, body } => Err(AppError::BackgroundRemovalRejected {
                status: *status,
                body: body.clone(),
            }),
        }
    }
}

pub struct FakeClassifier {
    result: Result<GarmentClassification, String>,
    pub seen: Mutex<Vec<Bytes>>,
}

impl FakeClassifier {
    pub fn returning(classification: GarmentClassification) -> Self {
        Self {
            result: Ok(classification),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl GarmentClassifier for FakeClassifier {
    async fn classify(&self, image: &ProcessedImage) -> Result<GarmentClassification, AppError> {
        self.seen.lock().unwrap().push(image.bytes.clone());
        self.result.clone().map_err(AppError::Classification)
    }
}

/// Row store with the same uniqueness and ordering rules as the real table.
#[derive(Default)]
pub struct MemoryStore {
    pub rows: Mutex<Vec<ClothingItem>>,
    next_id: AtomicI32,
    reject_inserts: bool,
}

impl MemoryStore {
    pub fn with_rows(rows: Vec<ClothingItem>) -> Self {
        let next_id = rows.iter().map(|r| r.id).max().unwrap_or(0);
        Self {
            rows: Mutex::new(rows),
            next_id: AtomicI32::new(next_id),
            reject_inserts: false,
        }
    }

    /// Every insert fails as a filename collision.
    pub fn rejecting_inserts() -> Self {
        Self {
            reject_inserts: true,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn insert(&self, item: NewClothingItem) -> Result<ClothingItem, AppError> {
        let mut rows = self.rows.lock().unwrap();
        if self.reject_inserts || rows.iter().any(|r| r.filename == item.filename) {
            return Err(AppError::DuplicateFilename(item.filename));
        }
        let row = ClothingItem {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            filename: item.filename,
            url: item.url,
            category: item.category,
            subcategory: item.subcategory,
            color_base: item.color_base,
            formality: item.formality,
            season: item.season,
            labels_json: item.labels_json,
            created_at: Utc::now(),
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn list(&self, filter: &ClosetFilter) -> Result<Vec<ClothingItem>, AppError> {
        let category = filter.category().map(str::to_lowercase);
        let search = filter.search().map(str::to_lowercase);
        let contains = |field: &Option<String>, needle: &str| {
            field
                .as_deref()
                .map(|v| v.to_lowercase().contains(needle))
                .unwrap_or(false)
        };

        let mut items: Vec<ClothingItem> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| match &category {
                Some(c) => r.category.as_deref().map(str::to_lowercase).as_ref() == Some(c),
                None => true,
            })
            .filter(|r| match &search {
                Some(s) => [&r.category, &r.subcategory, &r.color_base, &r.formality, &r.season]
                    .into_iter()
                    .any(|field| contains(field, s.as_str())),
                None => true,
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(items)
    }
}

pub fn test_config(upload_dir: &Path) -> Config {
    Config {
        database_url: "postgres://localhost/wardrobe_test".to_string(),
        openai_api_key: None,
        openai_base_url: "http://127.0.0.1:9/v1".to_string(),
        remove_bg_api_key: None,
        remove_bg_url: "http://127.0.0.1:9/removebg".to_string(),
        upload_dir: upload_dir.to_path_buf(),
        public_base_url: "http://127.0.0.1:8000".to_string(),
        port: 8000,
        body_limit_bytes: 20 * 1024 * 1024,
        rust_log: "debug".to_string(),
    }
}

pub fn test_state(
    upload_dir: &Path,
    background: Arc<FakeRemover>,
    classifier: Arc<FakeClassifier>,
    store: Arc<MemoryStore>,
) -> AppState {
    AppState {
        store,
        background,
        classifier,
        config: test_config(upload_dir),
    }
}

pub fn shirt_classification() -> GarmentClassification {
    GarmentClassification {
        category: "shirt".to_string(),
        subcategory: Some("button-down".to_string()),
        color_base: "blue".to_string(),
        formality: "business casual".to_string(),
        season: Seasons::Many(vec!["spring".to_string(), "fall".to_string()]),
        labels_json: Some(serde_json::json!({
            "fit": "regular",
            "material": "cotton",
            "color": {"base": "blue", "secondary": "white"}
        })),
    }
}

pub fn photo(name: &str) -> UploadedPhoto {
    UploadedPhoto {
        original_filename: name.to_string(),
        content_type: Some("image/jpeg".to_string()),
        bytes: Bytes::from_static(b"raw jpeg bytes"),
    }
}

pub async fn stored_files(upload_dir: &Path) -> Vec<String> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(upload_dir).await.unwrap();
    while let Some(entry) = entries.next_entry().await.unwrap() {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    names
}
