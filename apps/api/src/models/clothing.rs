use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::classification::GarmentClassification;

/// A catalogued clothing item as stored in `clothing_items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ClothingItem {
    pub id: i32,
    pub filename: String,
    pub url: String,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub color_base: Option<String>,
    pub formality: Option<String>,
    pub season: Option<String>,
    /// Serialized label object. Stored as-is, never queried into.
    pub labels_json: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Column values for a row that has not been inserted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewClothingItem {
    pub filename: String,
    pub url: String,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub color_base: Option<String>,
    pub formality: Option<String>,
    pub season: Option<String>,
    pub labels_json: Option<String>,
}

impl NewClothingItem {
    /// Maps a classification result onto the storage columns. Values are
    /// copied verbatim, including `"unknown"`.
    pub fn from_classification(
        filename: String,
        url: String,
        classification: GarmentClassification,
    ) -> Self {
        let GarmentClassification {
            category,
            subcategory,
            color_base,
            formality,
            season,
            labels_json,
        } = classification;

        Self {
            filename,
            url,
            category: Some(category),
            subcategory,
            color_base: Some(color_base),
            formality: Some(formality),
            season: Some(season.joined()),
            labels_json: labels_json.map(|labels| labels.to_string()),
        }
    }
}
