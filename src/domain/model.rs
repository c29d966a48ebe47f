use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Fixed square size every upload is squashed to before detection.
pub const INPUT_SIZE: u32 = 640;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelId {
    pub name: String,               // logical name, e.g. "yolov8s.onnx"
    pub onnx_path: PathBuf,         // filesystem path
    pub source_url: Option<String>, // fetched from here when the file is missing
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoloParams {
    pub input_size: u32,        // 640 typical
    pub conf_threshold: f32,    // 0..1
    pub iou_threshold: f32,     // 0..1
    pub max_detections: usize,  // e.g. 300
}

impl Default for YoloParams {
    fn default() -> Self {
        Self {
            input_size: INPUT_SIZE,
            conf_threshold: 0.25,
            iou_threshold: 0.7,
            max_detections: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    pub model: ModelId,
    pub params: YoloParams,
}

/// What `GET /api/model` reports about the loaded detector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelInfo {
    pub name: String,
    pub path: String,
    pub input_size: u32,
    pub classes: usize,
    pub pool_size: usize,
}
