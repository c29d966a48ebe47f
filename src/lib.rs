//! Upload an image, run a YOLO model over it through ONNX Runtime, and get
//! back an annotated copy plus a short `2 persons, 1 dog` summary.
//!
//! Layout follows ports and adapters: `domain` holds plain types,
//! `application` the use case and the ports it needs, `adapters` the ONNX,
//! imaging, storage and HTTP implementations.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
