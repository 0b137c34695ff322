use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionManifest {
    #[serde(default)]
    pub detector: Option<String>,
    pub detections: Vec<DetectionRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub label: String,
    #[serde(default = "default_detection_confidence")]
    pub confidence: f32,
}

fn default_detection_confidence() -> f32 {
    1.0
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactDigest {
    pub role: String,
    pub path: String,
    pub bytes: u64,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportEntryRecord {
    pub key: String,
    pub metric: String,
    pub role: Option<String>,
    /// Non-finite sentinels serialize as `null`; `status` tells the cases apart.
    pub score: f64,
    pub status: String,
    pub error: Option<String>,
    pub duration_ms: u128,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsReportManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub generated_at: String,
    pub model_config: ModelConfig,
    pub model_config_checksum: String,
    pub artifacts: Vec<ArtifactDigest>,
    pub entries: Vec<ReportEntryRecord>,
    pub failed_count: usize,
    pub duration_ms: u128,
}

#[derive(Debug, Clone, Serialize)]
pub struct ObjectsView {
    pub run_id: String,
    pub description_objects: Vec<String>,
    pub roles: Vec<RoleObjectsView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleObjectsView {
    pub role: String,
    pub detected_objects: Vec<String>,
    pub matched_objects: Vec<String>,
    pub object_match_score: f64,
    pub error: Option<String>,
}
