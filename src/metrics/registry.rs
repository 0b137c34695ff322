use std::path::Path;

use anyhow::{Result, anyhow};
use clap::ValueEnum;
use tracing::info;

use super::ImageRole;
use super::calculators::{Calculator, ImageImageMetric, ImageTextMetric};
use crate::cli::{DetectorBackend, EmbeddingBackend};
use crate::config::ModelConfig;
use crate::embedding::{EmbeddingExtractor, LocalHashEmbedder};
use crate::objects::{ObjectDetector, SidecarDetector, TextObjectExtractor};

/// Long-lived model context shared by every collector. Read-only while
/// scoring.
pub struct ModelRegistry {
    pub embedder: Box<dyn EmbeddingExtractor>,
    pub detector: Box<dyn ObjectDetector>,
    pub text_objects: TextObjectExtractor,
}

impl ModelRegistry {
    pub fn new(
        embedder: Box<dyn EmbeddingExtractor>,
        detector: Box<dyn ObjectDetector>,
        text_objects: TextObjectExtractor,
    ) -> Self {
        Self {
            embedder,
            detector,
            text_objects,
        }
    }

    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let embedding_backend = EmbeddingBackend::from_str(&config.embedding_backend, false)
            .map_err(|err| anyhow!("unknown embedding backend {}: {err}", config.embedding_backend))?;
        let detector_backend = DetectorBackend::from_str(&config.detector_backend, false)
            .map_err(|err| anyhow!("unknown detector backend {}: {err}", config.detector_backend))?;
        let models_dir = Path::new(&config.models_dir);

        let embedder: Box<dyn EmbeddingExtractor> = match embedding_backend {
            EmbeddingBackend::LocalHash => Box::new(LocalHashEmbedder::new(
                &config.embedding_model_id,
                config.dimensions,
                config.logit_scale,
                config.max_text_tokens,
            )?),
            EmbeddingBackend::OnnxClip => load_clip(config, models_dir)?,
        };

        let detector: Box<dyn ObjectDetector> = match detector_backend {
            DetectorBackend::Sidecar => Box::new(SidecarDetector::new(
                &config.detector_model_id,
                config.detection_confidence,
            )),
            DetectorBackend::OnnxYolo => load_yolo(config, models_dir)?,
        };

        info!(
            embedding_backend = %config.embedding_backend,
            embedding_model_id = %config.embedding_model_id,
            dimensions = config.dimensions,
            detector_backend = %config.detector_backend,
            detector_model_id = %config.detector_model_id,
            "model registry ready"
        );

        Ok(Self::new(embedder, detector, TextObjectExtractor::standard()?))
    }
}

#[cfg(feature = "onnx")]
fn load_clip(config: &ModelConfig, models_dir: &Path) -> Result<Box<dyn EmbeddingExtractor>> {
    Ok(Box::new(crate::embedding::OnnxClipEmbedder::load(
        models_dir,
        &config.embedding_model_id,
        config.dimensions,
        config.logit_scale,
        config.max_text_tokens,
    )?))
}

#[cfg(not(feature = "onnx"))]
fn load_clip(_config: &ModelConfig, _models_dir: &Path) -> Result<Box<dyn EmbeddingExtractor>> {
    Err(anyhow!(
        "embedding backend onnx-clip requires a build with the `onnx` feature"
    ))
}

#[cfg(feature = "onnx")]
fn load_yolo(config: &ModelConfig, models_dir: &Path) -> Result<Box<dyn ObjectDetector>> {
    Ok(Box::new(crate::objects::OnnxYoloDetector::load(
        models_dir,
        &config.detector_model_id,
        config.detection_confidence,
    )?))
}

#[cfg(not(feature = "onnx"))]
fn load_yolo(_config: &ModelConfig, _models_dir: &Path) -> Result<Box<dyn ObjectDetector>> {
    Err(anyhow!(
        "detector backend onnx-yolo requires a build with the `onnx` feature"
    ))
}

/// Ordered calculator lists. Report keys follow this order: every
/// image-vs-description metric per image role, then the image-vs-image
/// metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculatorRegistry {
    image_text: Vec<ImageTextMetric>,
    image_image: Vec<ImageImageMetric>,
}

impl CalculatorRegistry {
    pub fn standard() -> Self {
        Self {
            image_text: ImageTextMetric::ALL.to_vec(),
            image_image: ImageImageMetric::ALL.to_vec(),
        }
    }

    pub fn empty() -> Self {
        Self {
            image_text: Vec::new(),
            image_image: Vec::new(),
        }
    }

    pub fn with_image_image(mut self, metric: ImageImageMetric) -> Self {
        if !self.image_image.contains(&metric) {
            self.image_image.push(metric);
        }
        self
    }

    /// `(key, role, calculator)` for every computation, in report order.
    pub fn plan(&self) -> Vec<(String, Option<ImageRole>, Calculator)> {
        let mut plan = Vec::with_capacity(
            ImageRole::ALL.len() * self.image_text.len() + self.image_image.len(),
        );
        for role in ImageRole::ALL {
            for metric in &self.image_text {
                plan.push((
                    format!("{}_{}", role.as_str(), metric.name()),
                    Some(role),
                    Calculator::ImageText(*metric),
                ));
            }
        }
        for metric in &self.image_image {
            plan.push((
                metric.name().to_string(),
                None,
                Calculator::ImageImage(*metric),
            ));
        }
        plan
    }

    pub fn expected_keys(&self) -> Vec<String> {
        self.plan().into_iter().map(|(key, _, _)| key).collect()
    }
}

impl Default for CalculatorRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
