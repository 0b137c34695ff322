use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Result, bail};
use image::{Rgb, RgbImage};

use super::calculators::ImageImageMetric;
use super::report::MetricFailure;
use super::*;
use crate::config::ModelConfig;
use crate::embedding::{EmbeddingExtractor, FeatureVector, LocalHashEmbedder};
use crate::numeric::frechet_distance;
use crate::objects::{Detection, ObjectDetector, SidecarDetector, TextObjectExtractor};

const RUN_ID: &str = "3f1c9b2e-7d4a-4e1f-9a55-0c2b7d9e8f10";
const DETECTIONS: &str = r#"{"detections": [
    {"label": "ball", "confidence": 0.93},
    {"label": "grass", "confidence": 0.81},
    {"label": "person", "confidence": 0.66}
]}"#;

fn sketch(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 7 % 256) as u8, (y * 5 % 256) as u8, ((x + y) * 3 % 256) as u8])
    })
}

fn write_run(root: &Path, generated: &RgbImage) {
    let run_dir = root.join(RUN_ID);
    fs::create_dir_all(&run_dir).expect("run dir should be created");
    fs::write(run_dir.join("description.txt"), "a red ball on green grass")
        .expect("description should be written");

    sketch(32, 32)
        .save(run_dir.join("original.png"))
        .expect("original should be saved");
    generated
        .save(run_dir.join("generated.png"))
        .expect("generated should be saved");
    for image in ["original", "generated"] {
        fs::write(run_dir.join(format!("{image}.detections.json")), DETECTIONS)
            .expect("detections should be written");
    }
}

fn models_with(
    embedder: Box<dyn EmbeddingExtractor>,
    detector: Box<dyn ObjectDetector>,
) -> Arc<ModelRegistry> {
    Arc::new(ModelRegistry::new(
        embedder,
        detector,
        TextObjectExtractor::standard().expect("text extractor builds"),
    ))
}

fn local_embedder() -> Box<dyn EmbeddingExtractor> {
    Box::new(LocalHashEmbedder::new("local-hash-v1", 64, 100.0, 77).expect("embedder builds"))
}

fn sidecar() -> Box<dyn ObjectDetector> {
    Box::new(SidecarDetector::new("sidecar-json-v1", 0.25))
}

fn open(root: &Path, models: Arc<ModelRegistry>, options: CollectOptions) -> MetricsCollector {
    MetricsCollector::open(root, RUN_ID, models, CalculatorRegistry::standard(), options)
        .expect("collector should open")
}

struct FailingEmbedder;

impl EmbeddingExtractor for FailingEmbedder {
    fn model_id(&self) -> &str {
        "failing"
    }

    fn dimensions(&self) -> usize {
        4
    }

    fn logit_scale(&self) -> f32 {
        100.0
    }

    fn max_text_tokens(&self) -> usize {
        77
    }

    fn truncate_text(&self, text: &str) -> Result<String> {
        Ok(text.to_string())
    }

    fn embed_image(&self, _path: &Path) -> Result<FeatureVector> {
        bail!("embedding service unavailable")
    }

    fn embed_text(&self, _text: &str) -> Result<FeatureVector> {
        bail!("embedding service unavailable")
    }
}

struct SlowEmbedder {
    delay: Duration,
}

impl EmbeddingExtractor for SlowEmbedder {
    fn model_id(&self) -> &str {
        "slow"
    }

    fn dimensions(&self) -> usize {
        4
    }

    fn logit_scale(&self) -> f32 {
        100.0
    }

    fn max_text_tokens(&self) -> usize {
        77
    }

    fn truncate_text(&self, text: &str) -> Result<String> {
        Ok(text.to_string())
    }

    fn embed_image(&self, _path: &Path) -> Result<FeatureVector> {
        thread::sleep(self.delay);
        Ok(vec![1.0, 0.0, 0.0, 0.0])
    }

    fn embed_text(&self, _text: &str) -> Result<FeatureVector> {
        thread::sleep(self.delay);
        Ok(vec![1.0, 0.0, 0.0, 0.0])
    }
}

struct PanickingDetector;

impl ObjectDetector for PanickingDetector {
    fn name(&self) -> &str {
        "panicking"
    }

    fn detect(&self, _image: &Path) -> Result<Vec<Detection>> {
        panic!("detector exploded")
    }
}

#[test]
fn standard_registry_keys_are_role_major_then_image_pairs() {
    assert_eq!(
        CalculatorRegistry::standard().expected_keys(),
        vec![
            "original_clip_similarity",
            "original_object_match_score",
            "original_fid_score",
            "generated_clip_similarity",
            "generated_object_match_score",
            "generated_fid_score",
            "ssim_metric",
        ]
    );
}

#[test]
fn custom_registries_only_produce_their_keys() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    write_run(dir.path(), &sketch(32, 32));
    let models = models_with(local_embedder(), sidecar());

    let empty = MetricsCollector::open(
        dir.path(),
        RUN_ID,
        Arc::clone(&models),
        CalculatorRegistry::empty(),
        CollectOptions::default(),
    )
    .expect("collector should open");
    assert!(empty.collect().entries.is_empty());

    let ssim_only = MetricsCollector::open(
        dir.path(),
        RUN_ID,
        models,
        CalculatorRegistry::empty()
            .with_image_image(ImageImageMetric::Ssim)
            .with_image_image(ImageImageMetric::Ssim),
        CollectOptions::default(),
    )
    .expect("collector should open");
    assert_eq!(ssim_only.collect().keys(), vec!["ssim_metric"]);
}

#[test]
fn collect_scores_identical_images_end_to_end() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    write_run(dir.path(), &sketch(32, 32));
    let collector = open(
        dir.path(),
        models_with(local_embedder(), sidecar()),
        CollectOptions::default(),
    );

    let report = collector.collect();
    assert_eq!(report.keys(), CalculatorRegistry::standard().expected_keys());
    assert_eq!(report.failed_count(), 0, "{:?}", report.entries);
    assert_eq!(report.get("original_object_match_score"), Some(100.0));
    assert_eq!(report.get("generated_object_match_score"), Some(100.0));

    let ssim = report.get("ssim_metric").expect("ssim present");
    assert!((ssim - 1.0).abs() < 1e-12, "unexpected ssim {ssim}");

    for role in ImageRole::ALL {
        let fid = report
            .get(&format!("{}_fid_score", role.as_str()))
            .expect("fid present");
        assert!(fid.is_finite(), "unexpected fid {fid}");
        let clip = report
            .get(&format!("{}_clip_similarity", role.as_str()))
            .expect("clip present");
        assert!(clip.abs() <= 100.0 + 1e-6, "unexpected clip {clip}");
    }
    assert_eq!(
        report.get("original_clip_similarity"),
        report.get("generated_clip_similarity")
    );
}

#[test]
fn fid_embeds_the_whole_description_as_one_sample() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    write_run(dir.path(), &sketch(32, 32));
    let description =
        "A red ball on the lawn. Green grass everywhere, with trees in the distance.";
    let run_dir = dir.path().join(RUN_ID);
    fs::write(run_dir.join("description.txt"), description)
        .expect("description should be rewritten");

    let embedder = local_embedder();
    let image_features = embedder
        .embed_image(&run_dir.join("original.png"))
        .expect("image embeds");
    let text_features = embedder.embed_text(description).expect("text embeds");
    let expected =
        frechet_distance(&[image_features], &[text_features]).expect("distance computes");

    let collector = open(
        dir.path(),
        models_with(local_embedder(), sidecar()),
        CollectOptions::default(),
    );
    let reported = collector
        .collect()
        .get("original_fid_score")
        .expect("fid present");
    assert_eq!(reported, expected);
}

#[test]
fn collect_is_repeatable_for_unchanged_artifacts() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    write_run(dir.path(), &sketch(32, 32));
    let collector = open(
        dir.path(),
        models_with(local_embedder(), sidecar()),
        CollectOptions::default(),
    );

    assert_eq!(collector.collect().to_map(), collector.collect().to_map());
}

#[test]
fn report_renders_every_key_as_text() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    write_run(dir.path(), &sketch(32, 32));
    let collector = open(
        dir.path(),
        models_with(local_embedder(), sidecar()),
        CollectOptions::default(),
    );

    let text = collector.report();
    assert!(text.starts_with("=== Image-Text Comparison Metrics ==="));
    assert!(text.contains("Original Object Match Score: 100.00"), "{text}");
    assert!(text.contains("Ssim Metric: 1.00"), "{text}");
    assert_eq!(text.lines().count(), 9);
}

#[test]
fn ssim_drops_when_generated_image_differs() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let inverted = RgbImage::from_fn(48, 40, |x, y| {
        Rgb([255 - (x * 7 % 256) as u8, (y * 11 % 256) as u8, 20])
    });
    write_run(dir.path(), &inverted);
    let collector = open(
        dir.path(),
        models_with(local_embedder(), sidecar()),
        CollectOptions::default(),
    );

    let ssim = collector.collect().get("ssim_metric").expect("ssim present");
    assert!(ssim < 0.9, "different images scored {ssim}");
}

#[test]
fn failing_embedder_degrades_only_embedding_metrics() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    write_run(dir.path(), &sketch(32, 32));
    let collector = open(
        dir.path(),
        models_with(Box::new(FailingEmbedder), sidecar()),
        CollectOptions::default(),
    );

    let report = collector.collect();
    assert_eq!(report.keys(), CalculatorRegistry::standard().expected_keys());
    assert_eq!(report.failed_count(), 4);
    assert_eq!(report.get("original_clip_similarity"), Some(0.0));
    assert_eq!(report.get("generated_fid_score"), Some(f64::INFINITY));
    assert_eq!(report.get("original_object_match_score"), Some(100.0));

    let entry = report.entry("original_clip_similarity").expect("entry present");
    assert_eq!(entry.status(), "failed");
    let record = entry.to_record();
    assert!(
        record
            .error
            .as_deref()
            .is_some_and(|error| error.contains("embedding service unavailable"))
    );
}

#[test]
fn panicking_detector_is_isolated_from_other_metrics() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    write_run(dir.path(), &sketch(32, 32));
    let collector = open(
        dir.path(),
        models_with(local_embedder(), Box::new(PanickingDetector)),
        CollectOptions::default(),
    );

    let report = collector.collect();
    assert_eq!(report.failed_count(), 2);
    for role in ImageRole::ALL {
        let entry = report
            .entry(&format!("{}_object_match_score", role.as_str()))
            .expect("entry present");
        assert_eq!(entry.status(), "panicked");
        assert_eq!(entry.score(), 0.0);
    }
    assert!(report.entry("ssim_metric").is_some_and(|entry| !entry.is_failed()));
}

#[test]
fn slow_metrics_time_out_to_sentinels() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    write_run(dir.path(), &sketch(32, 32));
    let collector = open(
        dir.path(),
        models_with(
            Box::new(SlowEmbedder {
                delay: Duration::from_secs(10),
            }),
            sidecar(),
        ),
        CollectOptions {
            metric_timeout: Some(Duration::from_millis(1500)),
            parallel: true,
        },
    );

    let report = collector.collect();
    assert_eq!(report.keys(), CalculatorRegistry::standard().expected_keys());
    let clip = report.entry("generated_clip_similarity").expect("entry present");
    assert_eq!(clip.status(), "timed_out");
    assert_eq!(clip.score(), 0.0);
    assert_eq!(report.get("original_fid_score"), Some(f64::INFINITY));
    assert_eq!(report.get("original_object_match_score"), Some(100.0));
    assert!(report.duration < Duration::from_secs(10));
}

#[test]
fn parallel_collection_matches_sequential() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    write_run(dir.path(), &sketch(40, 36));
    let models = models_with(local_embedder(), sidecar());

    let sequential = open(dir.path(), Arc::clone(&models), CollectOptions::default()).collect();
    let parallel = open(
        dir.path(),
        models,
        CollectOptions {
            metric_timeout: None,
            parallel: true,
        },
    )
    .collect();

    assert_eq!(sequential.keys(), parallel.keys());
    assert_eq!(sequential.to_map(), parallel.to_map());
}

#[test]
fn open_fails_when_artifacts_are_missing() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let models = models_with(local_embedder(), sidecar());
    let error = MetricsCollector::open(
        dir.path(),
        RUN_ID,
        models,
        CalculatorRegistry::standard(),
        CollectOptions::default(),
    )
    .err()
    .expect("missing run must fail");
    assert!(error.to_string().contains("description artifact"));
}

#[test]
fn report_text_uses_title_case_and_two_decimals() {
    let report = MetricsReport {
        run_id: RUN_ID.to_string(),
        entries: vec![
            MetricEntry {
                key: "original_clip_similarity".to_string(),
                metric: "clip_similarity",
                role: Some(ImageRole::Original),
                outcome: Ok(23.456),
                sentinel: 0.0,
                duration: Duration::ZERO,
            },
            MetricEntry {
                key: "generated_fid_score".to_string(),
                metric: "fid_score",
                role: Some(ImageRole::Generated),
                outcome: Err(MetricFailure::Error("boom".to_string())),
                sentinel: f64::INFINITY,
                duration: Duration::ZERO,
            },
        ],
        duration: Duration::ZERO,
    };

    let text = format_report(&report);
    let lines = text.lines().collect::<Vec<&str>>();
    assert_eq!(lines[0], "=== Image-Text Comparison Metrics ===");
    assert_eq!(lines[1], "Original Clip Similarity: 23.46");
    assert_eq!(lines[2], "Generated Fid Score: inf");
    assert_eq!(lines.len(), 4);

    assert_eq!(title_case("ssim_metric"), "Ssim Metric");
    assert_eq!(title_case("original_object_match_score"), "Original Object Match Score");
}

#[test]
fn model_registry_builds_from_default_config() {
    let models = ModelRegistry::from_config(&ModelConfig::default()).expect("registry builds");
    assert_eq!(models.embedder.model_id(), "local-hash-v1");
    assert_eq!(models.embedder.dimensions(), 512);
    assert_eq!(models.detector.name(), "sidecar-json-v1");
}

#[cfg(not(feature = "onnx"))]
#[test]
fn onnx_backends_require_the_feature() {
    let config = ModelConfig {
        embedding_backend: "onnx-clip".to_string(),
        ..ModelConfig::default()
    };
    let error = ModelRegistry::from_config(&config)
        .err()
        .expect("onnx backend must fail without the feature");
    assert!(error.to_string().contains("onnx"));
}
