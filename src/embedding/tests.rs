use image::{Rgb, RgbImage};

use super::*;

fn embedder(max_text_tokens: usize) -> LocalHashEmbedder {
    LocalHashEmbedder::new("local-hash-v1", 64, 100.0, max_text_tokens)
        .expect("local embedder should build")
}

fn norm(values: &[f32]) -> f64 {
    values
        .iter()
        .map(|value| f64::from(*value) * f64::from(*value))
        .sum::<f64>()
        .sqrt()
}

#[test]
fn text_embeddings_are_unit_length_and_deterministic() {
    let model = embedder(77);
    let first = model.embed_text("a red ball on green grass").expect("text embeds");
    let second = model.embed_text("a red ball on green grass").expect("text embeds");

    assert_eq!(first.len(), 64);
    assert_eq!(first, second);
    assert!((norm(&first) - 1.0).abs() < 1e-5);
}

#[test]
fn image_embeddings_are_unit_length_and_match_for_identical_files() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let image = RgbImage::from_fn(32, 24, |x, y| Rgb([(x * 7) as u8, (y * 9) as u8, 128]));
    let left = dir.path().join("left.png");
    let right = dir.path().join("right.png");
    image.save(&left).expect("left image saves");
    image.save(&right).expect("right image saves");

    let model = embedder(77);
    let batch = model
        .embed_images(&[left.as_path(), right.as_path()])
        .expect("images embed");

    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0], batch[1]);
    assert!((norm(&batch[0]) - 1.0).abs() < 1e-5);
}

#[test]
fn embed_image_reports_undecodable_files() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().join("broken.png");
    std::fs::write(&path, b"not a png").expect("broken file writes");

    let error = embedder(77).embed_image(&path).expect_err("decode must fail");
    assert!(error.to_string().contains("failed to decode image"));
}

#[test]
fn truncation_keeps_leading_tokens_only() {
    let model = embedder(3);
    let truncated = model
        .truncate_text("one  two three four five")
        .expect("truncation succeeds");
    assert_eq!(truncated, "one  two three");

    let short = model.truncate_text("one two").expect("truncation succeeds");
    assert_eq!(short, "one two");
}

#[test]
fn truncation_never_splits_multibyte_characters() {
    let model = embedder(2);
    let truncated = model
        .truncate_text("café ünïcödé straße tail")
        .expect("truncation succeeds");
    assert_eq!(truncated, "café ünïcödé");

    // A span ending mid-character is pulled back to the previous boundary.
    assert_eq!(truncate_to_spans("é", &[(0, 1), (1, 2)], 1), "");
    assert_eq!(truncate_to_spans("éa", &[(0, 2), (2, 3)], 1), "é");
}

#[test]
fn embed_text_only_sees_truncated_prefix() {
    let model = embedder(4);
    let long = model
        .embed_text("a red ball on green grass under a blue sky")
        .expect("text embeds");
    let prefix = model.embed_text("a red ball on").expect("text embeds");
    assert_eq!(long, prefix);
}

#[test]
fn embed_texts_matches_per_text_embeddings() {
    let model = embedder(77);
    let texts = vec!["a red ball".to_string(), "green grass".to_string()];
    let batch = model.embed_texts(&texts).expect("texts embed");
    assert_eq!(batch.len(), 2);
    assert_eq!(batch[1], model.embed_text("green grass").expect("text embeds"));
}

#[test]
fn l2_normalize_leaves_zero_vector_untouched() {
    let mut zeros = vec![0.0_f32; 4];
    l2_normalize(&mut zeros);
    assert!(zeros.iter().all(|value| *value == 0.0));

    let mut values = vec![3.0_f32, 4.0];
    l2_normalize(&mut values);
    assert!((values[0] - 0.6).abs() < 1e-6);
    assert!((values[1] - 0.8).abs() < 1e-6);
}
