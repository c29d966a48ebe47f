use image::RgbImage;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use tracing::info;

use crate::adapters::onnx::yolo_engine::OnnxYoloEngine;
use crate::application::ports::DetectorPort;
use crate::domain::{
    detection::Detection,
    errors::{DomainError, DomainResult},
    model::{InferenceConfig, ModelInfo},
};

/// A detector instance that needs exclusive access while it runs.
pub trait FrameDetector: Send {
    fn detect(&mut self, frame: &RgbImage) -> anyhow::Result<Vec<Detection>>;
}

impl FrameDetector for OnnxYoloEngine {
    fn detect(&mut self, frame: &RgbImage) -> anyhow::Result<Vec<Detection>> {
        self.infer(frame)
    }
}

/// Fixed set of independently locked engines sharing one model.
///
/// `Session::run` takes `&mut self`, so every in-flight request holds one
/// engine. Requests beyond the pool size wait for an engine to free up.
pub struct DetectorPool<E> {
    slots: Vec<Mutex<E>>,
    next: AtomicUsize,
    info: ModelInfo,
}

impl<E: FrameDetector> DetectorPool<E> {
    pub fn new(engines: Vec<E>, mut info: ModelInfo) -> DomainResult<Self> {
        if engines.is_empty() {
            return Err(DomainError::InvalidInput("detector pool needs at least one engine".into()));
        }
        info.pool_size = engines.len();
        Ok(Self {
            slots: engines.into_iter().map(Mutex::new).collect(),
            next: AtomicUsize::new(0),
            info,
        })
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    fn checkout(&self) -> MutexGuard<'_, E> {
        let start = self.next.fetch_add(1, Ordering::Relaxed) % self.slots.len();
        for offset in 0..self.slots.len() {
            let slot = &self.slots[(start + offset) % self.slots.len()];
            match slot.try_lock() {
                Ok(guard) => return guard,
                Err(TryLockError::Poisoned(p)) => return p.into_inner(),
                Err(TryLockError::WouldBlock) => {}
            }
        }
        // All busy: queue on the round-robin slot. A panic inside a previous
        // run leaves the engine itself intact, so poisoning is ignored.
        self.slots[start].lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DetectorPool<OnnxYoloEngine> {
    pub fn load(
        config: &InferenceConfig,
        model_path: &Path,
        classes: Arc<[String]>,
        size: usize,
        intra_threads: usize,
    ) -> anyhow::Result<Self> {
        let size = size.max(1);
        let mut engines = Vec::with_capacity(size);
        for i in 0..size {
            info!("Loading YOLO engine {}/{} from {}", i + 1, size, model_path.display());
            engines.push(OnnxYoloEngine::load(
                model_path,
                config.params.clone(),
                classes.clone(),
                intra_threads,
            )?);
        }

        let info = ModelInfo {
            name: config.model.name.clone(),
            path: model_path.display().to_string(),
            input_size: config.params.input_size,
            classes: classes.len(),
            pool_size: size,
        };
        Ok(Self::new(engines, info)?)
    }
}

impl<E: FrameDetector> DetectorPort for DetectorPool<E> {
    fn detect(&self, frame: &RgbImage) -> DomainResult<Vec<Detection>> {
        let mut engine = self.checkout();
        engine
            .detect(frame)
            .map_err(|e| DomainError::Inference(format!("{e:#}")))
    }

    fn model_info(&self) -> ModelInfo {
        self.info.clone()
    }
}
