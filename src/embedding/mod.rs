//! Joint image/text embedding extractors.
//!
//! Every backend produces L2-normalized vectors in one shared space so image and
//! text features can be compared directly. Backends may fail; callers decide how
//! a failure degrades.

use std::path::Path;

use anyhow::Result;

mod local;
#[cfg(feature = "onnx")]
pub(crate) mod onnx;
#[cfg(test)]
mod tests;

pub use local::LocalHashEmbedder;
#[cfg(feature = "onnx")]
pub use onnx::OnnxClipEmbedder;

pub type FeatureVector = Vec<f32>;

pub trait EmbeddingExtractor: Send + Sync {
    fn model_id(&self) -> &str;

    fn dimensions(&self) -> usize;

    /// Multiplier the model applies to cosine similarity in its paired head.
    fn logit_scale(&self) -> f32;

    fn max_text_tokens(&self) -> usize;

    /// Cut `text` to at most `max_text_tokens` model tokens, rebuilding it from
    /// the source span of the kept tokens.
    fn truncate_text(&self, text: &str) -> Result<String>;

    fn embed_image(&self, path: &Path) -> Result<FeatureVector>;

    /// Embeds `text` after truncating it to the model's input length.
    fn embed_text(&self, text: &str) -> Result<FeatureVector>;

    fn embed_images(&self, paths: &[&Path]) -> Result<Vec<FeatureVector>> {
        paths.iter().map(|path| self.embed_image(path)).collect()
    }

    fn embed_texts(&self, texts: &[String]) -> Result<Vec<FeatureVector>> {
        texts.iter().map(|text| self.embed_text(text)).collect()
    }
}

pub fn l2_normalize(values: &mut [f32]) {
    let squared_norm = values
        .iter()
        .map(|value| f64::from(*value) * f64::from(*value))
        .sum::<f64>();

    if squared_norm <= 0.0 {
        return;
    }

    let norm = squared_norm.sqrt() as f32;
    if norm == 0.0 {
        return;
    }

    for value in values {
        *value /= norm;
    }
}

/// Byte spans of whitespace-separated words.
pub fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;

    for (index, character) in text.char_indices() {
        match (character.is_whitespace(), start) {
            (true, Some(begin)) => {
                spans.push((begin, index));
                start = None;
            }
            (false, None) => start = Some(index),
            _ => {}
        }
    }

    if let Some(begin) = start {
        spans.push((begin, text.len()));
    }
    spans
}

/// Rebuilds `text` from the first `max_tokens` spans. Spans are byte offsets
/// produced by a tokenizer over `text`; an end that falls inside a multi-byte
/// character is pulled back to the previous boundary.
pub fn truncate_to_spans(text: &str, spans: &[(usize, usize)], max_tokens: usize) -> String {
    if spans.len() <= max_tokens {
        return text.to_string();
    }
    if max_tokens == 0 {
        return String::new();
    }

    let start = floor_char_boundary(text, spans[0].0);
    let mut end = floor_char_boundary(text, spans[max_tokens - 1].1);
    if end < start {
        end = start;
    }
    text[start..end].to_string()
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}
