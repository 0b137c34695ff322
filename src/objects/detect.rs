use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::debug;

use super::ObjectSet;
use crate::model::DetectionManifest;

#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
}

pub trait ObjectDetector: Send + Sync {
    fn name(&self) -> &str;

    fn detect(&self, image: &Path) -> Result<Vec<Detection>>;
}

/// Lowercased, deduplicated class labels of every detection.
pub fn detected_labels(detector: &dyn ObjectDetector, image: &Path) -> Result<ObjectSet> {
    let detections = detector.detect(image)?;
    let top_confidence = detections
        .iter()
        .map(|detection| detection.confidence)
        .fold(0.0_f32, f32::max);
    let labels = detections
        .iter()
        .map(|detection| detection.label.trim().to_lowercase())
        .filter(|label| !label.is_empty())
        .collect::<ObjectSet>();
    debug!(
        detector = detector.name(),
        image = %image.display(),
        detections = detections.len(),
        top_confidence,
        ?labels,
        "detected image objects"
    );
    Ok(labels)
}

/// Reads detections written next to the image by an upstream detector run,
/// `<image-stem>.detections.json`.
#[derive(Debug, Clone)]
pub struct SidecarDetector {
    name: String,
    min_confidence: f32,
}

impl SidecarDetector {
    pub fn new(name: &str, min_confidence: f32) -> Self {
        Self {
            name: name.to_string(),
            min_confidence,
        }
    }

    pub fn sidecar_path(image: &Path) -> PathBuf {
        image.with_extension("detections.json")
    }
}

impl ObjectDetector for SidecarDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn detect(&self, image: &Path) -> Result<Vec<Detection>> {
        if !image.is_file() {
            bail!("image not found: {}", image.display());
        }

        let path = Self::sidecar_path(image);
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read detections: {}", path.display()))?;
        let manifest: DetectionManifest = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse detections: {}", path.display()))?;

        debug!(
            sidecar = %path.display(),
            source = manifest.detector.as_deref().unwrap_or("unknown"),
            "read sidecar detections"
        );

        Ok(manifest
            .detections
            .into_iter()
            .filter(|record| record.confidence >= self.min_confidence)
            .map(|record| Detection {
                label: record.label,
                confidence: record.confidence,
            })
            .collect())
    }
}
