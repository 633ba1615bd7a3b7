use serde::{Deserialize, Serialize};

/// Structured garment description returned by the classification provider.
///
/// Required keys are plain fields, so a response that omits one fails to
/// deserialize. The provider is told to answer `"unknown"` instead of
/// leaving a field out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GarmentClassification {
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    pub color_base: String,
    pub formality: String,
    pub season: Seasons,
    /// Nested fit/material/texture/color/pattern/weather/occasion/gender-fit
    /// labels, kept as an opaque JSON value.
    #[serde(default)]
    pub labels_json: Option<serde_json::Value>,
}

/// Seasons are declared as an array, but a bare `"unknown"` string is
/// accepted as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seasons {
    Many(Vec<String>),
    One(String),
}

impl Seasons {
    /// Comma-joined form stored in the `season` column.
    pub fn joined(&self) -> String {
        match self {
            Seasons::Many(seasons) => seasons.join(","),
            Seasons::One(season) => season.clone(),
        }
    }
}
