use anyhow::{bail, Context, Result};
use image::{imageops::FilterType, RgbImage};
use ndarray::{s, Array4, ArrayView2, ArrayViewD, Axis, Ix2, IxDyn};
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use ort::value::Tensor;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::domain::detection::{non_maximum_suppression, Detection};
use crate::domain::model::YoloParams;

pub struct OnnxYoloEngine {
    session: Session,
    params: YoloParams,
    classes: Arc<[String]>,
}

impl OnnxYoloEngine {
    pub fn load(path: &Path, params: YoloParams, classes: Arc<[String]>, intra_threads: usize) -> Result<Self> {
        let mut builder = Session::builder()?.with_intra_threads(intra_threads.max(1))?;

        // CUDA is opportunistic: registered when available, CPU otherwise.
        let cuda = CUDAExecutionProvider::default().build();
        if let Ok(builder_with_cuda) = builder.clone().with_execution_providers([cuda]) {
            builder = builder_with_cuda;
        }

        let model_bytes = fs::read(path).with_context(|| format!("reading model {}", path.display()))?;
        let session = builder
            .commit_from_memory(&model_bytes)
            .with_context(|| format!("building session for {}", path.display()))?;

        Ok(Self { session, params, classes })
    }

    pub fn infer(&mut self, rgb: &RgbImage) -> Result<Vec<Detection>> {
        let imgsz = self.params.input_size as usize;
        let input = to_input_tensor(rgb, self.params.input_size);

        let input_shape = vec![1, 3, imgsz as i64, imgsz as i64];
        let input_tensor = Tensor::from_array((input_shape, input.into_raw_vec_and_offset().0))?;

        let outputs = self.session.run(ort::inputs![input_tensor])?;
        let (shape_out, data_out) = outputs[0].try_extract_tensor::<f32>()?;

        let dims: Vec<usize> = shape_out.iter().map(|&x| x as usize).collect();
        if dims.len() != 3 {
            bail!("unexpected YOLO output rank {} (shape {:?})", dims.len(), dims);
        }
        let array_view = ArrayViewD::from_shape(IxDyn(&dims), data_out)?;
        let view = array_view.index_axis(Axis(0), 0).into_dimensionality::<Ix2>()?;

        let detections = decode_predictions(view, &self.params, &self.classes, rgb.dimensions());
        debug!(candidates = dims[2], kept = detections.len(), "yolo output decoded");
        Ok(detections)
    }
}

/// RGB frame -> NCHW f32 in [0, 1], resized to the model input when needed.
pub fn to_input_tensor(rgb: &RgbImage, input_size: u32) -> Array4<f32> {
    let imgsz = input_size as usize;
    let resized;
    let src = if rgb.dimensions() == (input_size, input_size) {
        rgb
    } else {
        resized = image::imageops::resize(rgb, input_size, input_size, FilterType::Triangle);
        &resized
    };

    let mut input = Array4::<f32>::zeros((1, 3, imgsz, imgsz));
    for (x, y, pixel) in src.enumerate_pixels() {
        input[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
        input[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
        input[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
    }
    input
}

/// Decodes a single-image YOLOv8 head: rows `cx, cy, w, h, score_0..score_n`,
/// one column per candidate. A transposed `[candidates, 4 + n]` layout is
/// accepted too. Boxes are scaled to `frame` and clamped to it.
pub fn decode_predictions(
    output: ArrayView2<'_, f32>,
    params: &YoloParams,
    classes: &[String],
    frame: (u32, u32),
) -> Vec<Detection> {
    let expected = classes.len() + 4;
    let output = if output.shape()[0] != expected && output.shape()[1] == expected {
        output.reversed_axes()
    } else {
        output
    };
    if output.shape()[0] <= 4 {
        return Vec::new();
    }

    let (fw, fh) = (frame.0 as f32, frame.1 as f32);
    let sx = fw / params.input_size as f32;
    let sy = fh / params.input_size as f32;

    let mut detections = Vec::new();
    for i in 0..output.shape()[1] {
        let scores = output.slice(s![4.., i]);
        let Some((class_id, &max_score)) = scores.indexed_iter().max_by(|(_, a), (_, b)| a.total_cmp(b)) else {
            continue;
        };
        if max_score <= params.conf_threshold {
            continue;
        }

        let cx = output[[0, i]];
        let cy = output[[1, i]];
        let w = output[[2, i]];
        let h = output[[3, i]];

        detections.push(Detection {
            x1: ((cx - w / 2.0) * sx).clamp(0.0, fw),
            y1: ((cy - h / 2.0) * sy).clamp(0.0, fh),
            x2: ((cx + w / 2.0) * sx).clamp(0.0, fw),
            y2: ((cy + h / 2.0) * sy).clamp(0.0, fh),
            score: max_score,
            class_id,
            label: classes
                .get(class_id)
                .cloned()
                .unwrap_or_else(|| format!("class {class_id}")),
        });
    }

    let mut kept = non_maximum_suppression(detections, params.iou_threshold);
    kept.truncate(params.max_detections);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use ndarray::Array2;

    fn classes() -> Vec<String> {
        vec!["cat".into(), "dog".into(), "bird".into()]
    }

    /// Columns are candidates: cx, cy, w, h, cat, dog, bird.
    fn head(candidates: &[[f32; 7]]) -> Array2<f32> {
        let mut out = Array2::<f32>::zeros((7, candidates.len()));
        for (i, c) in candidates.iter().enumerate() {
            for (row, v) in c.iter().enumerate() {
                out[[row, i]] = *v;
            }
        }
        out
    }

    #[test]
    fn keeps_confident_candidates_with_their_best_class() {
        let out = head(&[
            [100.0, 100.0, 20.0, 40.0, 0.1, 0.9, 0.0],
            [300.0, 300.0, 10.0, 10.0, 0.1, 0.1, 0.2],
        ]);
        let dets = decode_predictions(out.view(), &YoloParams::default(), &classes(), (640, 640));
        assert_eq!(dets.len(), 1);
        let d = &dets[0];
        assert_eq!(d.label, "dog");
        assert_eq!(d.class_id, 1);
        assert_eq!((d.x1, d.y1, d.x2, d.y2), (90.0, 80.0, 110.0, 120.0));
    }

    #[test]
    fn suppresses_duplicate_boxes() {
        let out = head(&[
            [100.0, 100.0, 20.0, 40.0, 0.0, 0.9, 0.0],
            [101.0, 100.0, 20.0, 40.0, 0.0, 0.8, 0.0],
            [101.0, 100.0, 20.0, 40.0, 0.7, 0.0, 0.0],
        ]);
        let dets = decode_predictions(out.view(), &YoloParams::default(), &classes(), (640, 640));
        let labels: Vec<_> = dets.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["dog", "cat"]);
    }

    #[test]
    fn scales_and_clamps_to_frame() {
        let out = head(&[[10.0, 630.0, 40.0, 40.0, 0.95, 0.0, 0.0]]);
        let dets = decode_predictions(out.view(), &YoloParams::default(), &classes(), (320, 320));
        let d = &dets[0];
        assert_eq!(d.x1, 0.0);
        assert_eq!(d.x2, 15.0);
        assert_eq!(d.y1, 305.0);
        assert_eq!(d.y2, 320.0);
    }

    #[test]
    fn accepts_transposed_layout() {
        let out = head(&[
            [100.0, 100.0, 20.0, 40.0, 0.0, 0.0, 0.6],
            [400.0, 400.0, 20.0, 40.0, 0.0, 0.0, 0.0],
        ]);
        let transposed = out.t().to_owned();
        let dets = decode_predictions(transposed.view(), &YoloParams::default(), &classes(), (640, 640));
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].label, "bird");
    }

    #[test]
    fn caps_at_max_detections() {
        let out = head(&[
            [50.0, 50.0, 10.0, 10.0, 0.9, 0.0, 0.0],
            [200.0, 200.0, 10.0, 10.0, 0.8, 0.0, 0.0],
            [400.0, 400.0, 10.0, 10.0, 0.7, 0.0, 0.0],
        ]);
        let params = YoloParams { max_detections: 2, ..YoloParams::default() };
        let dets = decode_predictions(out.view(), &params, &classes(), (640, 640));
        assert_eq!(dets.len(), 2);
        assert_eq!(dets[0].score, 0.9);
    }

    #[test]
    fn unknown_class_ids_get_a_generic_label() {
        let out = head(&[[100.0, 100.0, 20.0, 20.0, 0.0, 0.0, 0.9]]);
        let dets = decode_predictions(out.view(), &YoloParams::default(), &classes()[..2], (640, 640));
        // With two names the head no longer matches 4 + n rows, so it is read as-is.
        assert_eq!(dets[0].label, "class 2");
    }

    #[test]
    fn input_tensor_is_nchw_and_normalized() {
        let rgb = RgbImage::from_pixel(4, 4, Rgb([255, 0, 51]));
        let t = to_input_tensor(&rgb, 4);
        assert_eq!(t.shape(), &[1, 3, 4, 4]);
        assert_eq!(t[[0, 0, 2, 3]], 1.0);
        assert_eq!(t[[0, 1, 2, 3]], 0.0);
        assert!((t[[0, 2, 2, 3]] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn input_tensor_resizes_other_sizes() {
        let rgb = RgbImage::new(7, 3);
        assert_eq!(to_input_tensor(&rgb, 8).shape(), &[1, 3, 8, 8]);
    }
}
