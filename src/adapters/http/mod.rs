pub mod error;
pub mod routes;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::path::PathBuf;
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::adapters::http::state::HttpState;

/// URL prefix the stored results are served under.
pub const STATIC_PREFIX: &str = "/static";

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub static_dir: PathBuf,
    pub index_page: PathBuf,
    pub max_upload_bytes: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            static_dir: PathBuf::from("static"),
            index_page: PathBuf::from("templates/index.html"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

pub fn router(state: HttpState, cfg: &RouterConfig) -> Router {
    Router::new()
        .route_service("/", ServeFile::new(&cfg.index_page))
        .route("/predict", post(routes::predict))
        .route("/api/model", get(routes::model_info))
        .nest_service(STATIC_PREFIX, ServeDir::new(&cfg.static_dir))
        .layer(DefaultBodyLimit::max(cfg.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
