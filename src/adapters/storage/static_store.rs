use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

use crate::application::ports::{ImageStorePort, StoredImage};
use crate::domain::errors::{DomainError, DomainResult};

/// Writes annotated results into the directory served under `url_prefix`.
pub struct StaticDirStore {
    dir: PathBuf,
    url_prefix: String,
}

impl StaticDirStore {
    pub fn new(dir: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        let url_prefix = url_prefix.into().trim_end_matches('/').to_string();
        Self { dir: dir.into(), url_prefix }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_name() -> String {
        format!("result_{}.jpg", Uuid::new_v4().simple())
    }
}

#[async_trait]
impl ImageStorePort for StaticDirStore {
    async fn store_jpeg(&self, jpeg: Vec<u8>) -> DomainResult<StoredImage> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| DomainError::Storage(format!("creating {}: {e}", self.dir.display())))?;

        let name = Self::file_name();
        let path = self.dir.join(&name);
        tokio::fs::write(&path, &jpeg)
            .await
            .map_err(|e| DomainError::Storage(format!("writing {}: {e}", path.display())))?;
        debug!(path = %path.display(), bytes = jpeg.len(), "stored annotated image");

        Ok(StoredImage {
            url: format!("{}/{}", self.url_prefix, name),
            path,
        })
    }
}
