use serde::{Deserialize, Serialize};

/// One detected object. Coordinates are pixels of the frame handed to the detector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Detection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub score: f32,
    pub class_id: usize,
    pub label: String,
}

impl Detection {
    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn intersection_over_union(&self, other: &Detection) -> f32 {
        let ix = (self.x2.min(other.x2) - self.x1.max(other.x1)).max(0.0);
        let iy = (self.y2.min(other.y2) - self.y1.max(other.y1)).max(0.0);
        let intersection = ix * iy;
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            return 0.0;
        }
        intersection / union
    }
}

/// Class-aware non maximum suppression.
///
/// Returns the survivors ordered by descending score. Boxes of different
/// classes never suppress each other.
pub fn non_maximum_suppression(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| b.score.total_cmp(&a.score));
    let mut removed = vec![false; detections.len()];
    for current in 0..detections.len() {
        if removed[current] {
            continue;
        }
        for other in current + 1..detections.len() {
            if removed[other] || detections[current].class_id != detections[other].class_id {
                continue;
            }
            if detections[current].intersection_over_union(&detections[other]) > iou_threshold {
                removed[other] = true;
            }
        }
    }
    let mut flags = removed.into_iter();
    detections.retain(|_| !flags.next().unwrap_or(false));
    detections
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x1: f32, y1: f32, x2: f32, y2: f32, score: f32, class_id: usize) -> Detection {
        Detection { x1, y1, x2, y2, score, class_id, label: format!("c{class_id}") }
    }

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let a = det(0.0, 0.0, 10.0, 10.0, 0.9, 0);
        assert!((a.intersection_over_union(&a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        let a = det(0.0, 0.0, 1.0, 1.0, 0.9, 0);
        let b = det(2.0, 2.0, 3.0, 3.0, 0.9, 0);
        assert_eq!(a.intersection_over_union(&b), 0.0);
    }

    #[test]
    fn degenerate_boxes_do_not_divide_by_zero() {
        let a = det(5.0, 5.0, 5.0, 5.0, 0.9, 0);
        assert_eq!(a.intersection_over_union(&a), 0.0);
    }

    #[test]
    fn nms_keeps_the_strongest_of_overlapping_boxes() {
        let dets = vec![
            det(0.0, 0.0, 4.0, 4.0, 0.6, 0),
            det(0.0, 0.0, 5.0, 5.0, 0.55, 0),
            det(6.0, 6.0, 10.0, 10.0, 0.75, 0),
        ];
        let kept = non_maximum_suppression(dets, 0.5);
        assert_eq!(
            kept,
            vec![det(6.0, 6.0, 10.0, 10.0, 0.75, 0), det(0.0, 0.0, 4.0, 4.0, 0.6, 0)]
        );
    }

    #[test]
    fn nms_ignores_overlap_across_classes() {
        let dets = vec![
            det(0.0, 0.0, 4.5, 4.5, 0.6, 0),
            det(0.0, 0.0, 5.0, 5.0, 0.55, 1),
            det(0.5, 0.5, 4.0, 4.0, 0.8, 0),
        ];
        let kept = non_maximum_suppression(dets, 0.5);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].score, 0.8);
        assert_eq!(kept[1].class_id, 1);
    }

    #[test]
    fn suppressed_boxes_do_not_suppress_others() {
        // b overlaps a and c, but a and c do not overlap; once b is gone c must survive.
        let a = det(0.0, 0.0, 10.0, 10.0, 0.9, 0);
        let b = det(2.0, 0.0, 12.0, 10.0, 0.8, 0);
        let c = det(9.0, 0.0, 19.0, 10.0, 0.7, 0);
        let kept = non_maximum_suppression(vec![c.clone(), b, a.clone()], 0.5);
        assert_eq!(kept, vec![a, c]);
    }
}
