//! Object vocabulary on both sides of a comparison: nouns and named entities
//! from the description, labels from a detector run over the image.

use std::collections::BTreeSet;

mod detect;
mod lexicon;
mod text;
#[cfg(feature = "onnx")]
mod yolo;

pub use detect::{Detection, ObjectDetector, SidecarDetector, detected_labels};
pub use text::TextObjectExtractor;
#[cfg(feature = "onnx")]
pub use yolo::OnnxYoloDetector;

/// Lowercased, deduplicated object names.
pub type ObjectSet = BTreeSet<String>;

/// Share of description objects the detector also found, as a percentage.
/// Zero when either side is empty.
pub fn object_match_score(text_objects: &ObjectSet, image_objects: &ObjectSet) -> f64 {
    if text_objects.is_empty() || image_objects.is_empty() {
        return 0.0;
    }
    let matched = text_objects.intersection(image_objects).count();
    matched as f64 / text_objects.len() as f64 * 100.0
}

pub fn matched_objects(text_objects: &ObjectSet, image_objects: &ObjectSet) -> Vec<String> {
    text_objects.intersection(image_objects).cloned().collect()
}
