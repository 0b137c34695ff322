use std::path::Path;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::cli::{DetectorBackend, EmbeddingBackend, ModelArgs};
use crate::util::{ensure_directory, now_utc_string, sha256_text, write_json_pretty};

pub const DEFAULT_LOCAL_MODEL_ID: &str = "local-hash-v1";
pub const DEFAULT_CLIP_MODEL_ID: &str = "clip-vit-base-patch32";
pub const DEFAULT_YOLO_MODEL_ID: &str = "yolov8s";
pub const DEFAULT_EMBEDDING_DIM: usize = 512;
pub const DEFAULT_MAX_TEXT_TOKENS: usize = 77;
pub const DEFAULT_LOGIT_SCALE: f32 = 100.0;
pub const DEFAULT_DETECTION_CONFIDENCE: f32 = 0.25;
pub const MODEL_CONFIG_LOCK_PATH: &str = "manifests/model_config.lock.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub embedding_backend: String,
    pub embedding_model_id: String,
    pub dimensions: usize,
    pub normalization: String,
    pub logit_scale: f32,
    pub max_text_tokens: usize,
    pub detector_backend: String,
    pub detector_model_id: String,
    pub detection_confidence: f32,
    pub models_dir: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            embedding_backend: EmbeddingBackend::LocalHash.as_str().to_string(),
            embedding_model_id: DEFAULT_LOCAL_MODEL_ID.to_string(),
            dimensions: DEFAULT_EMBEDDING_DIM,
            normalization: "l2".to_string(),
            logit_scale: DEFAULT_LOGIT_SCALE,
            max_text_tokens: DEFAULT_MAX_TEXT_TOKENS,
            detector_backend: DetectorBackend::Sidecar.as_str().to_string(),
            detector_model_id: "sidecar-json-v1".to_string(),
            detection_confidence: DEFAULT_DETECTION_CONFIDENCE,
            models_dir: ".cache/sketchscore/models".to_string(),
        }
    }
}

impl ModelConfig {
    pub fn checksum(&self) -> String {
        sha256_text(&format!(
            "{}|{}|{}|{}|{}|{}|{}|{}|{}",
            self.embedding_backend,
            self.embedding_model_id,
            self.dimensions,
            self.normalization,
            self.logit_scale,
            self.max_text_tokens,
            self.detector_backend,
            self.detector_model_id,
            self.detection_confidence
        ))
    }
}

#[derive(Debug, Serialize)]
struct ModelConfigLock<'a> {
    manifest_version: u32,
    created_at: String,
    checksum: String,
    config: &'a ModelConfig,
}

pub fn resolve_model_config(args: &ModelArgs) -> Result<ModelConfig> {
    if args.embedding_dim == 0 {
        bail!("--embedding-dim must be positive");
    }
    if args.max_text_tokens == 0 {
        bail!("--max-text-tokens must be positive");
    }
    if !args.logit_scale.is_finite() || args.logit_scale <= 0.0 {
        bail!("--logit-scale must be a positive finite number");
    }
    if !(0.0..=1.0).contains(&args.detection_confidence) {
        bail!("--detection-confidence must lie in [0, 1]");
    }

    let requested_id = args
        .embedding_model_id
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());

    let embedding_model_id = match (args.embedding_backend, requested_id) {
        (_, Some(value)) => value.to_string(),
        (EmbeddingBackend::LocalHash, None) => DEFAULT_LOCAL_MODEL_ID.to_string(),
        (EmbeddingBackend::OnnxClip, None) => DEFAULT_CLIP_MODEL_ID.to_string(),
    };

    let detector_model_id = match args.detector_backend {
        DetectorBackend::Sidecar => "sidecar-json-v1",
        DetectorBackend::OnnxYolo => DEFAULT_YOLO_MODEL_ID,
    };

    Ok(ModelConfig {
        embedding_backend: args.embedding_backend.as_str().to_string(),
        embedding_model_id,
        dimensions: args.embedding_dim,
        normalization: "l2".to_string(),
        logit_scale: args.logit_scale,
        max_text_tokens: args.max_text_tokens,
        detector_backend: args.detector_backend.as_str().to_string(),
        detector_model_id: detector_model_id.to_string(),
        detection_confidence: args.detection_confidence,
        models_dir: args.models_dir.display().to_string(),
    })
}

pub fn write_model_config_lockfile(config: &ModelConfig, lock_path: &Path) -> Result<()> {
    let lock = ModelConfigLock {
        manifest_version: 1,
        created_at: now_utc_string(),
        checksum: config.checksum(),
        config,
    };

    if let Some(parent) = lock_path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory(parent)?;
        }
    }

    write_json_pretty(lock_path, &lock)
}
