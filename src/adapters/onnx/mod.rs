pub mod classes;
pub mod detector_pool;
pub mod model_catalog;
pub mod yolo_engine;
