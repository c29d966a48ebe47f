use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// The 80 COCO classes YOLO checkpoints are trained on, in model index order.
pub const COCO_CLASSES: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich",
    "orange", "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch",
    "potted plant", "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote",
    "keyboard", "cell phone", "microwave", "oven", "toaster", "sink", "refrigerator", "book",
    "clock", "vase", "scissors", "teddy bear", "hair drier", "toothbrush",
];

/// Reads one class name per line so the numeric ids coming out of the
/// session can be given names. Blank lines are skipped.
pub fn read_class_names(path: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for line in BufReader::new(File::open(path)?).lines() {
        let line = line?;
        let name = line.trim();
        if !name.is_empty() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

/// Class names from `path` when given, otherwise the COCO set.
pub fn load_class_names(path: Option<&Path>) -> io::Result<Vec<String>> {
    match path {
        Some(p) => read_class_names(p),
        None => Ok(COCO_CLASSES.iter().map(|s| s.to_string()).collect()),
    }
}
