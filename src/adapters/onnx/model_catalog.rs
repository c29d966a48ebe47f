use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::application::ports::ModelCatalogPort;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::ModelId;

pub struct OnnxModelCatalog {
    client: reqwest::Client,
}

impl OnnxModelCatalog {
    pub fn new() -> DomainResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| DomainError::OperationFailed(format!("building HTTP client: {e}")))?;
        Ok(Self { client })
    }

    async fn fetch(&self, url: &str, dest: &Path) -> DomainResult<()> {
        info!("Fetching model {} -> {}", url, dest.display());
        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DomainError::OperationFailed(format!("model download failed: {e}")))?;
        if !res.status().is_success() {
            return Err(DomainError::NotFound(format!("model download returned {} for {}", res.status(), url)));
        }
        let bytes = res
            .bytes()
            .await
            .map_err(|e| DomainError::OperationFailed(format!("model download interrupted: {e}")))?;

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::Storage(format!("creating {}: {e}", parent.display())))?;
        }
        // dest is either absent or complete.
        let partial = dest.with_extension("onnx.part");
        tokio::fs::write(&partial, &bytes)
            .await
            .map_err(|e| DomainError::Storage(format!("writing {}: {e}", partial.display())))?;
        tokio::fs::rename(&partial, dest)
            .await
            .map_err(|e| DomainError::Storage(format!("renaming {}: {e}", partial.display())))?;
        info!("Model fetched ({} bytes)", bytes.len());
        Ok(())
    }
}

#[async_trait]
impl ModelCatalogPort for OnnxModelCatalog {
    async fn validate_model(&self, model: &ModelId) -> DomainResult<()> {
        if model.onnx_path.as_os_str().is_empty() {
            return Err(DomainError::InvalidInput("onnx_path empty".into()));
        }
        if model.onnx_path.extension().and_then(|e| e.to_str()) != Some("onnx") {
            warn!("Model file {} has no .onnx extension", model.onnx_path.display());
        }
        if !model.onnx_path.is_file() {
            return Err(DomainError::NotFound(format!(
                "model file not found: {}",
                model.onnx_path.display()
            )));
        }
        Ok(())
    }

    async fn ensure_available(&self, model: &ModelId) -> DomainResult<PathBuf> {
        if !model.onnx_path.is_file() {
            match model.source_url.as_deref() {
                Some(url) => self.fetch(url, &model.onnx_path).await?,
                None => {
                    return Err(DomainError::NotFound(format!(
                        "model file not found: {} (set MODEL_URL to fetch it)",
                        model.onnx_path.display()
                    )))
                }
            }
        }
        self.validate_model(model).await?;
        Ok(model.onnx_path.clone())
    }
}
