pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::state::AppState;
use crate::wardrobe::handlers;

pub fn build_router(state: AppState) -> Router {
    // ServeDir answers 404 for `..` segments and missing files.
    let uploads = ServeDir::new(&state.config.upload_dir);
    let body_limit = state.config.body_limit_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/upload", post(handlers::handle_upload))
        .route("/closet", get(handlers::handle_list_closet))
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
