use axum::{
    extract::{multipart::MultipartError, Multipart, Query, State},
    http::StatusCode,
    Json,
};

use crate::background::UploadedPhoto;
use crate::errors::AppError;
use crate::models::clothing::ClothingItem;
use crate::state::AppState;
use crate::wardrobe::pipeline::process_upload;
use crate::wardrobe::repository::ClosetFilter;

const FILE_FIELD: &str = "file";

/// POST /upload
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ClothingItem>, AppError> {
    let photo = read_photo(multipart).await?;
    let item = process_upload(&state, photo).await?;
    Ok(Json(item))
}

/// GET /closet
pub async fn handle_list_closet(
    State(state): State<AppState>,
    Query(filter): Query<ClosetFilter>,
) -> Result<Json<Vec<ClothingItem>>, AppError> {
    let items = state.store.list(&filter).await?;
    Ok(Json(items))
}

async fn read_photo(mut multipart: Multipart) -> Result<UploadedPhoto, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("invalid multipart payload", e))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let original_filename = field
            .file_name()
            .map(str::to_owned)
            .unwrap_or_else(|| "upload".to_string());
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error("failed to read upload", e))?;

        return Ok(UploadedPhoto {
            original_filename,
            content_type,
            bytes,
        });
    }

    Err(AppError::Validation(format!(
        "missing multipart field `{FILE_FIELD}`"
    )))
}

/// Oversized bodies keep their 413; every other multipart failure is a bad request.
fn multipart_error(context: &str, e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("{context}: {e}"))
    } else {
        AppError::Validation(format!("{context}: {e}"))
    }
}
