use std::path::Path;

use anyhow::Result;
use tracing::debug;

use super::registry::ModelRegistry;
use crate::numeric::{frechet_distance, logit_similarity, ssim_from_paths};
use crate::objects::{detected_labels, object_match_score};

/// Metrics comparing one image against the description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageTextMetric {
    ClipSimilarity,
    ObjectMatch,
    Fid,
}

impl ImageTextMetric {
    pub const ALL: [ImageTextMetric; 3] = [Self::ClipSimilarity, Self::ObjectMatch, Self::Fid];

    pub fn name(self) -> &'static str {
        match self {
            Self::ClipSimilarity => "clip_similarity",
            Self::ObjectMatch => "object_match_score",
            Self::Fid => "fid_score",
        }
    }

    /// Value reported when the computation fails: the worst score for a
    /// distance, zero otherwise.
    pub fn failure_sentinel(self) -> f64 {
        match self {
            Self::Fid => f64::INFINITY,
            Self::ClipSimilarity | Self::ObjectMatch => 0.0,
        }
    }

    pub fn compute(self, models: &ModelRegistry, image: &Path, description: &str) -> Result<f64> {
        match self {
            Self::ClipSimilarity => clip_similarity(models, image, description),
            Self::ObjectMatch => object_match(models, image, description),
            Self::Fid => description_frechet(models, image, description),
        }
    }
}

/// Metrics comparing the original image against the generated one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageImageMetric {
    Ssim,
}

impl ImageImageMetric {
    pub const ALL: [ImageImageMetric; 1] = [Self::Ssim];

    pub fn name(self) -> &'static str {
        match self {
            Self::Ssim => "ssim_metric",
        }
    }

    pub fn failure_sentinel(self) -> f64 {
        match self {
            Self::Ssim => 0.0,
        }
    }

    pub fn compute(self, _models: &ModelRegistry, original: &Path, generated: &Path) -> Result<f64> {
        match self {
            Self::Ssim => ssim_from_paths(original, generated),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Calculator {
    ImageText(ImageTextMetric),
    ImageImage(ImageImageMetric),
}

impl Calculator {
    pub fn name(self) -> &'static str {
        match self {
            Self::ImageText(metric) => metric.name(),
            Self::ImageImage(metric) => metric.name(),
        }
    }

    pub fn failure_sentinel(self) -> f64 {
        match self {
            Self::ImageText(metric) => metric.failure_sentinel(),
            Self::ImageImage(metric) => metric.failure_sentinel(),
        }
    }
}

fn clip_similarity(models: &ModelRegistry, image: &Path, description: &str) -> Result<f64> {
    let image_features = models.embedder.embed_image(image)?;
    let text_features = models.embedder.embed_text(description)?;
    logit_similarity(
        &image_features,
        &text_features,
        models.embedder.logit_scale(),
    )
}

fn object_match(models: &ModelRegistry, image: &Path, description: &str) -> Result<f64> {
    let text_objects = models.text_objects.extract(description)?;
    let image_objects = detected_labels(models.detector.as_ref(), image)?;
    Ok(object_match_score(&text_objects, &image_objects))
}

/// Fréchet distance between two single-sample populations: the image
/// embedding and the embedding of the whole (truncated) description.
fn description_frechet(models: &ModelRegistry, image: &Path, description: &str) -> Result<f64> {
    let image_population = vec![models.embedder.embed_image(image)?];
    let text_population = vec![models.embedder.embed_text(description)?];
    let distance = frechet_distance(&image_population, &text_population)?;
    debug!(
        image = %image.display(),
        dimensions = image_population[0].len(),
        distance,
        "computed frechet distance"
    );
    Ok(distance)
}
