//! Processed-image files under the upload directory.

use std::path::{Path, PathBuf};

use tracing::{info, warn};
use uuid::Uuid;

const PROCESSED_PREFIX: &str = "processed_";

/// Builds `processed_<uuid hex><ext>`, keeping the extension of the
/// original filename when it is a plain alphanumeric suffix.
pub fn processed_filename(original_filename: &str) -> String {
    let unique = Uuid::new_v4().simple();
    match original_extension(original_filename) {
        Some(ext) => format!("{PROCESSED_PREFIX}{unique}.{ext}"),
        None => format!("{PROCESSED_PREFIX}{unique}"),
    }
}

fn original_extension(original_filename: &str) -> Option<&str> {
    Path::new(original_filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// Public address of a processed image served under `/uploads`.
pub fn public_url(public_base_url: &str, filename: &str) -> String {
    format!("{}/uploads/{filename}", public_base_url.trim_end_matches('/'))
}

/// Writes the processed image and returns its path.
pub async fn write_processed_image(
    upload_dir: &Path,
    filename: &str,
    bytes: &[u8],
) -> std::io::Result<PathBuf> {
    let path = upload_dir.join(filename);
    tokio::fs::write(&path, bytes).await?;
    info!("Wrote processed image {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}

/// Deletes a processed image whose row was never created.
pub async fn remove_orphan(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => warn!("Removed orphaned image {}", path.display()),
        Err(e) => tracing::error!("Failed to remove orphaned image {}: {e}", path.display()),
    }
}
