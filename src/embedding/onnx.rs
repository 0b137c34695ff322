use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow, bail};
use image::imageops::FilterType;
use ndarray::{Array2, Array4};
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::info;

use super::{EmbeddingExtractor, FeatureVector, l2_normalize, truncate_to_spans};

const CLIP_IMAGE_SIZE: u32 = 224;
#[allow(clippy::excessive_precision)]
const CLIP_MEAN: [f32; 3] = [0.48145466, 0.4578275, 0.40821073];
#[allow(clippy::excessive_precision)]
const CLIP_STD: [f32; 3] = [0.26862954, 0.26130258, 0.27577711];
/// Start and end-of-text markers take two of the context slots.
const SPECIAL_TOKENS: usize = 2;

/// CLIP vision and text towers exported to ONNX. Expects
/// `<model_id>-visual.onnx`, `<model_id>-textual.onnx` and
/// `<model_id>-tokenizer.json` under the models directory.
pub struct OnnxClipEmbedder {
    model_id: String,
    dimensions: usize,
    logit_scale: f32,
    max_text_tokens: usize,
    vision: Mutex<Session>,
    text: Mutex<Session>,
    tokenizer: Tokenizer,
}

impl OnnxClipEmbedder {
    pub fn load(
        models_dir: &Path,
        model_id: &str,
        dimensions: usize,
        logit_scale: f32,
        max_text_tokens: usize,
    ) -> Result<Self> {
        if max_text_tokens <= SPECIAL_TOKENS {
            bail!("max text tokens must exceed {SPECIAL_TOKENS} for CLIP");
        }

        let vision_path = model_file(models_dir, &format!("{model_id}-visual.onnx"))?;
        let text_path = model_file(models_dir, &format!("{model_id}-textual.onnx"))?;
        let tokenizer_path = model_file(models_dir, &format!("{model_id}-tokenizer.json"))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|err| {
            anyhow!(
                "failed to load tokenizer {}: {err}",
                tokenizer_path.display()
            )
        })?;

        let vision = build_session(&vision_path)?;
        let text = build_session(&text_path)?;
        info!(model_id, vision = %vision_path.display(), text = %text_path.display(), "loaded CLIP sessions");

        Ok(Self {
            model_id: model_id.to_string(),
            dimensions,
            logit_scale,
            max_text_tokens,
            vision: Mutex::new(vision),
            text: Mutex::new(text),
            tokenizer,
        })
    }

    fn check_dimensions(&self, embedding: &[f32], tower: &str) -> Result<()> {
        if embedding.len() != self.dimensions {
            bail!(
                "{tower} embedding has {} dimensions, configured {}",
                embedding.len(),
                self.dimensions
            );
        }
        if embedding.iter().any(|value| !value.is_finite()) {
            bail!("{tower} embedding contains non-finite values");
        }
        Ok(())
    }
}

impl EmbeddingExtractor for OnnxClipEmbedder {
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
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|err| anyhow!("text tokenization failed: {err}"))?;
        let budget = self.max_text_tokens - SPECIAL_TOKENS;
        Ok(truncate_to_spans(text, encoding.get_offsets(), budget))
    }

    fn embed_image(&self, path: &Path) -> Result<FeatureVector> {
        let image = image::open(path)
            .with_context(|| format!("failed to decode image: {}", path.display()))?;
        let pixel_values = preprocess_image(&image);

        let mut session = self
            .vision
            .lock()
            .map_err(|_| anyhow!("CLIP vision session lock poisoned"))?;
        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "pixel_values".to_string());

        let input = Tensor::from_array(pixel_values)
            .map_err(|err| anyhow!("failed to create pixel tensor: {err}"))?;
        let outputs = session
            .run(ort::inputs![input_name => input])
            .map_err(|err| anyhow!("CLIP vision inference failed: {err}"))?;
        let (_shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|err| anyhow!("failed to extract image embedding: {err}"))?;

        let mut embedding = data.to_vec();
        self.check_dimensions(&embedding, "image")?;
        l2_normalize(&mut embedding);
        Ok(embedding)
    }

    fn embed_text(&self, text: &str) -> Result<FeatureVector> {
        let truncated = self.truncate_text(text)?;
        let encoding = self
            .tokenizer
            .encode(truncated.as_str(), true)
            .map_err(|err| anyhow!("text tokenization failed: {err}"))?;

        let mut ids = encoding
            .get_ids()
            .iter()
            .map(|id| i64::from(*id))
            .collect::<Vec<i64>>();
        ids.truncate(self.max_text_tokens);
        let mask = vec![1_i64; ids.len()];
        let length = ids.len();

        let ids = Array2::from_shape_vec((1, length), ids)?;
        let mask = Array2::from_shape_vec((1, length), mask)?;

        let mut session = self
            .text
            .lock()
            .map_err(|_| anyhow!("CLIP text session lock poisoned"))?;
        let input_names = session
            .inputs
            .iter()
            .map(|input| input.name.clone())
            .collect::<Vec<String>>();

        let ids = Tensor::from_array(ids)
            .map_err(|err| anyhow!("failed to create input_ids tensor: {err}"))?;
        let outputs = if input_names.len() >= 2 {
            let mask = Tensor::from_array(mask)
                .map_err(|err| anyhow!("failed to create attention_mask tensor: {err}"))?;
            session.run(ort::inputs![
                input_names[0].clone() => ids,
                input_names[1].clone() => mask
            ])
        } else {
            let name = input_names
                .first()
                .cloned()
                .unwrap_or_else(|| "input_ids".to_string());
            session.run(ort::inputs![name => ids])
        }
        .map_err(|err| anyhow!("CLIP text inference failed: {err}"))?;

        let (_shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|err| anyhow!("failed to extract text embedding: {err}"))?;

        let mut embedding = data.to_vec();
        self.check_dimensions(&embedding, "text")?;
        l2_normalize(&mut embedding);
        Ok(embedding)
    }
}

pub(crate) fn model_file(models_dir: &Path, filename: &str) -> Result<PathBuf> {
    let path = models_dir.join(filename);
    if !path.is_file() {
        bail!("model file not found: {}", path.display());
    }
    Ok(path)
}

pub(crate) fn build_session(path: &Path) -> Result<Session> {
    Session::builder()
        .and_then(|builder| builder.with_optimization_level(GraphOptimizationLevel::Level3))
        .and_then(|builder| builder.with_intra_threads(1))
        .and_then(|builder| builder.commit_from_file(path))
        .map_err(|err| anyhow!("failed to load ONNX model {}: {err}", path.display()))
}

/// Shortest-edge resize then center crop, normalised with CLIP statistics, NCHW.
fn preprocess_image(image: &image::DynamicImage) -> Array4<f32> {
    let (width, height) = (image.width().max(1), image.height().max(1));
    let scale = CLIP_IMAGE_SIZE as f32 / width.min(height) as f32;
    let resized_width = ((width as f32 * scale).round() as u32).max(CLIP_IMAGE_SIZE);
    let resized_height = ((height as f32 * scale).round() as u32).max(CLIP_IMAGE_SIZE);
    let resized = image
        .resize_exact(resized_width, resized_height, FilterType::CatmullRom)
        .to_rgb8();

    let offset_x = (resized_width - CLIP_IMAGE_SIZE) / 2;
    let offset_y = (resized_height - CLIP_IMAGE_SIZE) / 2;
    let size = CLIP_IMAGE_SIZE as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));

    for y in 0..CLIP_IMAGE_SIZE {
        for x in 0..CLIP_IMAGE_SIZE {
            let pixel = resized.get_pixel(offset_x + x, offset_y + y);
            for channel in 0..3usize {
                let value = f32::from(pixel[channel]) / 255.0;
                tensor[[0, channel, y as usize, x as usize]] =
                    (value - CLIP_MEAN[channel]) / CLIP_STD[channel];
            }
        }
    }

    tensor
}
