use clap::Parser;
use std::path::PathBuf;

use crate::adapters::http::{RouterConfig, DEFAULT_MAX_UPLOAD_BYTES};
use crate::application::services::DEFAULT_JPEG_QUALITY;
use crate::domain::model::{InferenceConfig, ModelId, YoloParams, INPUT_SIZE};

/// Server settings. Every flag can also come from the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "yolo-onnx-predict", version, about)]
pub struct Settings {
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Directory holding (and receiving fetched) model files.
    #[arg(long, env = "YOLO_CONFIG_DIR", default_value = "models")]
    pub model_dir: PathBuf,

    #[arg(long, env = "MODEL_NAME", default_value = "yolov8s.onnx")]
    pub model_name: String,

    /// Where to download the model from when it is not in `model_dir`.
    #[arg(long, env = "MODEL_URL")]
    pub model_url: Option<String>,

    /// One class name per line; COCO names when unset.
    #[arg(long, env = "CLASSES_PATH")]
    pub classes_path: Option<PathBuf>,

    #[arg(long, env = "STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    #[arg(long, env = "INDEX_PAGE", default_value = "templates/index.html")]
    pub index_page: PathBuf,

    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    #[arg(long, env = "CONF_THRES", default_value_t = 0.25)]
    pub conf_thres: f32,

    #[arg(long, env = "IOU_THRES", default_value_t = 0.7)]
    pub iou_thres: f32,

    #[arg(long, env = "MAX_DET", default_value_t = 300)]
    pub max_det: usize,

    /// Independent sessions, i.e. how many inferences may run at once.
    #[arg(long, env = "DETECTOR_POOL_SIZE", default_value_t = 2)]
    pub pool_size: usize,

    #[arg(long, env = "ORT_INTRA_THREADS", default_value_t = 4)]
    pub intra_threads: usize,

    #[arg(long, env = "JPEG_QUALITY", default_value_t = DEFAULT_JPEG_QUALITY)]
    pub jpeg_quality: u8,
}

impl Settings {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn model_id(&self) -> ModelId {
        ModelId {
            name: self.model_name.clone(),
            onnx_path: self.model_dir.join(&self.model_name),
            source_url: self.model_url.clone(),
        }
    }

    pub fn yolo_params(&self) -> YoloParams {
        YoloParams {
            input_size: INPUT_SIZE,
            conf_threshold: self.conf_thres.clamp(0.0, 1.0),
            iou_threshold: self.iou_thres.clamp(0.0, 1.0),
            max_detections: self.max_det.max(1),
        }
    }

    pub fn inference_config(&self) -> InferenceConfig {
        InferenceConfig {
            model: self.model_id(),
            params: self.yolo_params(),
        }
    }

    pub fn router_config(&self) -> RouterConfig {
        RouterConfig {
            static_dir: self.static_dir.clone(),
            index_page: self.index_page.clone(),
            max_upload_bytes: self.max_upload_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_contract() {
        let s = Settings::try_parse_from(["yolo-onnx-predict"]).unwrap();
        assert_eq!(s.max_upload_bytes, 16 * 1024 * 1024);
        assert_eq!(s.model_id().onnx_path, PathBuf::from("models/yolov8s.onnx"));
        assert_eq!(s.yolo_params().input_size, 640);
        assert_eq!(s.jpeg_quality, 70);
    }

    #[test]
    fn flags_override_defaults() {
        let s = Settings::try_parse_from([
            "yolo-onnx-predict",
            "--port",
            "8090",
            "--model-dir",
            "/opt/yolo",
            "--model-name",
            "yolo11n.onnx",
            "--conf-thres",
            "1.5",
        ])
        .unwrap();
        assert_eq!(s.port, 8090);
        assert!(s.addr().ends_with(":8090"));
        assert_eq!(s.model_id().onnx_path, PathBuf::from("/opt/yolo/yolo11n.onnx"));
        assert_eq!(s.yolo_params().conf_threshold, 1.0);
    }
}
