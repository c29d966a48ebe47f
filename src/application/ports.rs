use async_trait::async_trait;
use image::RgbImage;
use std::path::PathBuf;

use crate::domain::{detection::Detection, errors::DomainResult, model::*};

/// Runs the model over a normalized frame. Blocking; callers keep it off the async executor.
pub trait DetectorPort: Send + Sync {
    fn detect(&self, frame: &RgbImage) -> DomainResult<Vec<Detection>>;
    fn model_info(&self) -> ModelInfo;
}

/// Burns boxes and labels into a copy of the frame.
pub trait AnnotatorPort: Send + Sync {
    fn annotate(&self, frame: &RgbImage, detections: &[Detection]) -> RgbImage;
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredImage {
    pub url: String,
    pub path: PathBuf,
}

#[async_trait]
pub trait ImageStorePort: Send + Sync {
    async fn store_jpeg(&self, jpeg: Vec<u8>) -> DomainResult<StoredImage>;
}

#[async_trait]
pub trait ModelCatalogPort: Send + Sync {
    async fn validate_model(&self, model: &ModelId) -> DomainResult<()>;
    /// Makes sure the artifact exists locally, fetching it when a source is known.
    async fn ensure_available(&self, model: &ModelId) -> DomainResult<PathBuf>;
}
