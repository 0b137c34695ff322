use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

use anyhow::{Context, Result, bail};
use image::imageops::FilterType;

use super::{EmbeddingExtractor, FeatureVector, l2_normalize, truncate_to_spans, word_spans};

const THUMBNAIL_SIZE: u32 = 16;
const CELL_SIZE: u32 = 4;
const INTENSITY_BINS: u32 = 8;

/// Offline feature-hashing backend. Deterministic for a given toolchain, with
/// no model files; text and image tokens hash into the same vector space.
#[derive(Debug, Clone)]
pub struct LocalHashEmbedder {
    model_id: String,
    dimensions: usize,
    logit_scale: f32,
    max_text_tokens: usize,
}

impl LocalHashEmbedder {
    pub fn new(
        model_id: &str,
        dimensions: usize,
        logit_scale: f32,
        max_text_tokens: usize,
    ) -> Result<Self> {
        if dimensions < 8 {
            bail!("local hash embeddings need at least 8 dimensions, got {dimensions}");
        }
        if max_text_tokens == 0 {
            bail!("max text tokens must be positive");
        }

        Ok(Self {
            model_id: model_id.to_string(),
            dimensions,
            logit_scale,
            max_text_tokens,
        })
    }
}

impl EmbeddingExtractor for LocalHashEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn logit_scale(&self) -> f32 {
        self.logit_scale
    }

    fn max_text_tokens(&self) -> usize {
        self.max_text_tokens
    }

    fn truncate_text(&self, text: &str) -> Result<String> {
        let spans = word_spans(text);
        Ok(truncate_to_spans(text, &spans, self.max_text_tokens))
    }

    fn embed_image(&self, path: &Path) -> Result<FeatureVector> {
        let image = image::open(path)
            .with_context(|| format!("failed to decode image: {}", path.display()))?;
        let thumbnail = image
            .resize_exact(THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Triangle)
            .to_rgb8();

        let mut tokens = Vec::<String>::with_capacity((THUMBNAIL_SIZE * THUMBNAIL_SIZE * 6) as usize);
        for (x, y, pixel) in thumbnail.enumerate_pixels() {
            for (channel, value) in pixel.0.iter().enumerate() {
                let bin = u32::from(*value) * INTENSITY_BINS / 256;
                tokens.push(format!(
                    "i:{}:{}:{channel}:{bin}",
                    x / CELL_SIZE,
                    y / CELL_SIZE
                ));
                tokens.push(format!("h:{channel}:{bin}"));
            }
        }

        Ok(hash_features(tokens, self.dimensions))
    }

    fn embed_text(&self, text: &str) -> Result<FeatureVector> {
        let truncated = self.truncate_text(text)?;
        Ok(hash_features(tokenize_payload(&truncated), self.dimensions))
    }
}

fn hash_features(tokens: Vec<String>, dimensions: usize) -> FeatureVector {
    let mut vector = vec![0_f32; dimensions];

    for token in tokens {
        let hash = stable_hash(&token);
        let index = (hash as usize) % dimensions;
        let sign = if (hash >> 63) & 1 == 0 { 1.0 } else { -1.0 };
        let weight = 1.0 + (((hash >> 48) & 0xFF) as f32 / 255.0);
        vector[index] += sign * weight;
    }

    l2_normalize(&mut vector);
    vector
}

fn stable_hash(value: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn tokenize_payload(payload: &str) -> Vec<String> {
    let words = payload
        .split_whitespace()
        .map(|value| {
            value
                .chars()
                .filter(|character| character.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|value| !value.is_empty())
        .collect::<Vec<String>>();

    let mut features = Vec::<String>::with_capacity(words.len() * 2);
    for (index, word) in words.iter().enumerate() {
        features.push(format!("w:{word}"));
        if let Some(next) = words.get(index + 1) {
            features.push(format!("b:{word}_{next}"));
        }
    }
    features
}
