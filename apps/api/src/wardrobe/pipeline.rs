//! Upload pipeline: background removal, file write, classification, insert.
//!
//! Strictly sequential and scoped to one request. Nothing is retried. Once
//! the processed image is on disk, any later failure deletes it before the
//! error is returned, so no orphan files are left behind.

use tracing::info;

use crate::background::{ProcessedImage, UploadedPhoto};
use crate::errors::AppError;
use crate::models::clothing::{ClothingItem, NewClothingItem};
use crate::state::AppState;
use crate::wardrobe::files::{processed_filename, public_url, remove_orphan, write_processed_image};

pub async fn process_upload(
    state: &AppState,
    photo: UploadedPhoto,
) -> Result<ClothingItem, AppError> {
    if photo.bytes.is_empty() {
        return Err(AppError::Validation("uploaded file is empty".to_string()));
    }

    info!(
        "Processing upload {} ({} bytes)",
        photo.original_filename,
        photo.bytes.len()
    );

    // 1. Background removal. A rejection ends the request before anything is written.
    let processed = state.background.remove_background(&photo).await?;

    // 2. Persist the processed image
    let filename = processed_filename(&photo.original_filename);
    let path = write_processed_image(&state.config.upload_dir, &filename, &processed.bytes).await?;
    let url = public_url(&state.config.public_base_url, &filename);

    // 3–4. Classify and insert, cleaning up the file on failure
    match classify_and_store(state, &processed, filename, url).await {
        Ok(item) => {
            info!("Catalogued item {} as {:?}", item.id, item.category);
            Ok(item)
        }
        Err(e) => {
            remove_orphan(&path).await;
            Err(e)
        }
    }
}

async fn classify_and_store(
    state: &AppState,
    processed: &ProcessedImage,
    filename: String,
    url: String,
) -> Result<ClothingItem, AppError> {
    let classification = state.classifier.classify(processed).await?;
    let item = NewClothingItem::from_classification(filename, url, classification);
    state.store.insert(item).await
}
