use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "sketchscore",
    version,
    about = "Score generated images against their sketch and description"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Collect(CollectArgs),
    Objects(ObjectsArgs),
    Status(StatusArgs),
    History(HistoryArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum EmbeddingBackend {
    LocalHash,
    OnnxClip,
}

impl EmbeddingBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LocalHash => "local-hash",
            Self::OnnxClip => "onnx-clip",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum DetectorBackend {
    Sidecar,
    OnnxYolo,
}

impl DetectorBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sidecar => "sidecar",
            Self::OnnxYolo => "onnx-yolo",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    #[arg(long, value_enum, default_value_t = EmbeddingBackend::LocalHash)]
    pub embedding_backend: EmbeddingBackend,

    #[arg(long)]
    pub embedding_model_id: Option<String>,

    #[arg(long, default_value_t = 512)]
    pub embedding_dim: usize,

    #[arg(long, default_value_t = 100.0)]
    pub logit_scale: f32,

    #[arg(long, default_value_t = 77)]
    pub max_text_tokens: usize,

    #[arg(long, value_enum, default_value_t = DetectorBackend::Sidecar)]
    pub detector_backend: DetectorBackend,

    #[arg(long, default_value_t = 0.25)]
    pub detection_confidence: f32,

    #[arg(long, default_value = ".cache/sketchscore/models")]
    pub models_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct CollectArgs {
    #[arg(long = "run-id", required = true)]
    pub run_ids: Vec<String>,

    #[arg(long, default_value = "storage/data")]
    pub storage_root: PathBuf,

    #[arg(long, default_value = ".cache/sketchscore")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub report_dir: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub no_persist: bool,

    #[arg(long)]
    pub metric_timeout_ms: Option<u64>,

    #[arg(long, default_value_t = false)]
    pub parallel: bool,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[command(flatten)]
    pub models: ModelArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ObjectsArgs {
    #[arg(long)]
    pub run_id: String,

    #[arg(long, default_value = "storage/data")]
    pub storage_root: PathBuf,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[command(flatten)]
    pub models: ModelArgs,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long)]
    pub run_id: String,

    #[arg(long, default_value = "storage/data")]
    pub storage_root: PathBuf,

    #[arg(long, default_value = ".cache/sketchscore")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct HistoryArgs {
    #[arg(long, default_value = ".cache/sketchscore")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub run_id: Option<String>,

    #[arg(long, default_value_t = 10)]
    pub limit: usize,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}
