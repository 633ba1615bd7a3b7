use std::sync::Arc;

use crate::background::BackgroundRemover;
use crate::config::Config;
use crate::vision_client::GarmentClassifier;
use crate::wardrobe::repository::ItemStore;

/// Shared application state injected into all route handlers via Axum extractors.
/// Holds only immutable configuration and shared clients.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ItemStore>,
    /// remove.bg by default.
    pub background: Arc<dyn BackgroundRemover>,
    /// OpenAI vision model by default.
    pub classifier: Arc<dyn GarmentClassifier>,
    pub config: Config,
}
