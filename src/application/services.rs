use image::RgbImage;
use std::sync::Arc;
use tracing::debug;

use crate::{
    application::{
        codec,
        dto::PredictResponse,
        ports::{AnnotatorPort, DetectorPort, ImageStorePort},
    },
    domain::{
        detection::Detection,
        errors::{DomainError, DomainResult},
        model::{ModelInfo, INPUT_SIZE},
        summary::LabelSummary,
    },
};

pub const DEFAULT_JPEG_QUALITY: u8 = 70;

/// Result of running one upload through decode, detect and annotate.
#[derive(Debug, Clone)]
pub struct AnnotatedFrame {
    pub detections: Vec<Detection>,
    pub annotated: RgbImage,
}

/// Orchestrates a single prediction: decode -> normalize -> detect -> annotate -> encode -> store.
#[derive(Clone)]
pub struct PredictionService {
    detector: Arc<dyn DetectorPort>,
    annotator: Arc<dyn AnnotatorPort>,
    store: Arc<dyn ImageStorePort>,
    input_size: u32,
    jpeg_quality: u8,
}

impl PredictionService {
    pub fn new(
        detector: Arc<dyn DetectorPort>,
        annotator: Arc<dyn AnnotatorPort>,
        store: Arc<dyn ImageStorePort>,
    ) -> Self {
        Self {
            detector,
            annotator,
            store,
            input_size: INPUT_SIZE,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn model_info(&self) -> ModelInfo {
        self.detector.model_info()
    }

    /// Full request pipeline. The CPU-bound part runs on the blocking pool.
    pub async fn predict(&self, upload: Vec<u8>) -> DomainResult<PredictResponse> {
        if upload.is_empty() {
            return Err(DomainError::MissingInput("empty image field".into()));
        }

        let svc = self.clone();
        let (detections, jpeg) = tokio::task::spawn_blocking(move || {
            let frame = svc.annotate_upload(&upload)?;
            let jpeg = codec::encode_jpeg(&frame.annotated, svc.jpeg_quality)?;
            Ok::<_, DomainError>((frame.detections, jpeg))
        })
        .await
        .map_err(|e| DomainError::OperationFailed(format!("prediction task aborted: {e}")))??;

        let stored = self.store.store_jpeg(jpeg).await?;
        let summary = LabelSummary::from_detections(&detections);
        debug!(objects = summary.total(), url = %stored.url, "prediction stored");

        Ok(PredictResponse {
            image_url: stored.url,
            text: summary.to_string(),
        })
    }

    /// Synchronous half of the pipeline, up to the annotated frame.
    pub fn annotate_upload(&self, upload: &[u8]) -> DomainResult<AnnotatedFrame> {
        let rgb = codec::decode_rgb(upload)?;
        let frame = codec::normalize(rgb, self.input_size);
        let detections = self.detector.detect(&frame)?;
        let annotated = self.annotator.annotate(&frame, &detections);
        Ok(AnnotatedFrame { detections, annotated })
    }
}
