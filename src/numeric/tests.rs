use image::{GrayImage, Luma, Rgb, RgbImage};
use ndarray::array;

use super::frechet::*;
use super::similarity::*;
use super::ssim::*;

fn gradient(width: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| Luma([((x * 13 + y * 7) % 256) as u8]))
}

fn shifted(population: &[Vec<f32>], offset: f32) -> Vec<Vec<f32>> {
    population
        .iter()
        .map(|row| row.iter().map(|value| value + offset).collect())
        .collect()
}

fn sample_population() -> Vec<Vec<f32>> {
    vec![
        vec![0.1, 0.4, -0.2, 0.3],
        vec![0.3, 0.1, 0.0, -0.1],
        vec![-0.2, 0.2, 0.5, 0.1],
        vec![0.0, -0.3, 0.2, 0.4],
        vec![0.25, 0.05, -0.15, 0.2],
    ]
}

#[test]
fn logit_similarity_scales_cosine_by_model_logit() {
    let image = vec![0.6_f32, 0.8];
    let text = vec![0.8_f32, 0.6];
    let score = logit_similarity(&image, &text, 100.0).expect("similarity computes");
    assert!((score - 96.0).abs() < 1e-4, "unexpected score {score}");

    let opposite = vec![-0.6_f32, -0.8];
    let negative = logit_similarity(&image, &opposite, 100.0).expect("similarity computes");
    assert!(negative < 0.0, "logit similarity is not clamped to [0, 1]");
}

#[test]
fn logit_similarity_rejects_mismatched_dimensions() {
    let error = logit_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0], 100.0)
        .expect_err("mismatched dimensions must fail");
    assert!(error.to_string().contains("dimensionality mismatch"));
    assert!(dot_product(&[], &[]).is_err());
}

#[test]
fn jacobi_recovers_known_eigenvalues() {
    let mut values = symmetric_eigenvalues(array![[2.0, 1.0], [1.0, 2.0]]);
    values.sort_by(|a, b| a.total_cmp(b));
    assert!((values[0] - 1.0).abs() < 1e-10);
    assert!((values[1] - 3.0).abs() < 1e-10);

    let mut values = symmetric_eigenvalues(array![
        [4.0, 1.0, 0.0],
        [1.0, 3.0, 1.0],
        [0.0, 1.0, 2.0]
    ]);
    values.sort_by(|a, b| a.total_cmp(b));
    let trace = values.iter().sum::<f64>();
    assert!((trace - 9.0).abs() < 1e-10);
    assert!((values[1] - 3.0).abs() < 1e-10);
}

#[test]
fn frechet_keeps_epsilon_offset_for_identical_single_samples() {
    let features = vec![vec![0.6_f32, 0.8, 0.0, 0.0]];
    let distance = frechet_distance(&features, &features).expect("distance computes");
    let expected = -2.0 * 4.0 * COVARIANCE_EPSILON.sqrt();
    assert!(distance < 0.0, "epsilon offset must not be clamped away");
    assert!((distance - expected).abs() < 1e-9, "unexpected distance {distance}");
}

#[test]
fn frechet_is_near_zero_for_identical_populations() {
    let population = sample_population();
    let distance = frechet_distance(&population, &population).expect("distance computes");
    assert!(distance.abs() < 1e-2, "identical populations should be ~0, got {distance}");
}

#[test]
fn frechet_grows_with_mean_separation() {
    let population = sample_population();
    let distances = [0.5_f32, 1.0, 2.0, 4.0]
        .iter()
        .map(|offset| {
            frechet_distance(&population, &shifted(&population, *offset))
                .expect("distance computes")
        })
        .collect::<Vec<f64>>();

    for pair in distances.windows(2) {
        assert!(pair[1] > pair[0], "distances not increasing: {distances:?}");
    }
    // Shifting every coordinate by 1 adds |mu1 - mu2|^2 = 4 over 4 dimensions.
    let base = frechet_distance(&population, &population).expect("distance computes");
    assert!((distances[1] - base - 4.0).abs() < 1e-2);
}

#[test]
fn frechet_single_sample_uses_zero_covariance() {
    let single = vec![vec![1.0_f32, 0.0, 0.0]];
    let other = vec![vec![0.0_f32, 1.0, 0.0]];
    let distance = frechet_distance(&single, &other).expect("distance computes");
    let expected = 2.0 - 2.0 * 3.0 * COVARIANCE_EPSILON.sqrt();
    assert!((distance - expected).abs() < 1e-9, "unexpected distance {distance}");
}

#[test]
fn frechet_gram_route_matches_wide_and_tall_populations() {
    let left = sample_population();
    let right = shifted(&sample_population()[..3], 0.1);
    let forward = frechet_distance(&left, &right).expect("distance computes");
    let backward = frechet_distance(&right, &left).expect("distance computes");
    assert!((forward - backward).abs() < 1e-9);
}

#[test]
fn frechet_rejects_mismatched_dimensionality() {
    let left = vec![vec![0.0_f32; 4], vec![1.0_f32; 4]];
    let right = vec![vec![0.0_f32; 3], vec![1.0_f32; 3]];
    let error = frechet_distance(&left, &right).expect_err("shape mismatch must fail");
    assert_eq!(error, FrechetError::ShapeMismatch { left: 4, right: 3 });
}

#[test]
fn frechet_rejects_empty_and_ragged_populations() {
    let populated = vec![vec![0.0_f32; 2]];
    assert_eq!(
        frechet_distance(&[], &populated),
        Err(FrechetError::EmptyPopulation { side: "left" })
    );
    let ragged = vec![vec![0.0_f32; 2], vec![0.0_f32; 3]];
    assert_eq!(
        frechet_distance(&populated, &ragged),
        Err(FrechetError::RaggedPopulation { side: "right" })
    );
}

#[test]
fn ssim_of_identical_images_is_one() {
    let image = gradient(40, 30);
    let score = structural_similarity(&image, &image).expect("ssim computes");
    assert!((score - 1.0).abs() < 1e-12, "unexpected ssim {score}");
}

#[test]
fn ssim_drops_for_structurally_different_images() {
    let image = gradient(40, 30);
    let inverted = GrayImage::from_fn(40, 30, |x, y| Luma([255 - image.get_pixel(x, y)[0]]));
    let score = structural_similarity(&image, &inverted).expect("ssim computes");
    assert!(score < 0.5, "inverted image should not look similar, got {score}");
}

#[test]
fn ssim_rejects_images_smaller_than_window() {
    let tiny = gradient(6, 20);
    let error = structural_similarity(&tiny, &tiny).expect_err("tiny images must fail");
    assert!(error.to_string().contains("at least 7x7"));
}

#[test]
fn align_dimensions_resizes_candidate_to_reference() {
    let reference = gradient(40, 30);
    let candidate = gradient(80, 20);
    let aligned = align_dimensions(&reference, candidate);
    assert_eq!(aligned.dimensions(), (40, 30));
}

#[test]
fn grayscale_uses_bt601_weights() {
    assert_eq!(bt601_luma(Rgb([255, 0, 0])), 76);
    assert_eq!(bt601_luma(Rgb([0, 255, 0])), 150);
    assert_eq!(bt601_luma(Rgb([0, 0, 255])), 29);
    assert_eq!(bt601_luma(Rgb([255, 255, 255])), 255);

    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().join("primaries.png");
    RgbImage::from_fn(3, 1, |x, _| match x {
        0 => Rgb([255, 0, 0]),
        1 => Rgb([0, 255, 0]),
        _ => Rgb([0, 0, 255]),
    })
    .save(&path)
    .expect("image saves");
    let gray = load_grayscale(&path).expect("image decodes");
    assert_eq!(gray.into_raw(), vec![76, 150, 29]);
}

#[test]
fn bilinear_resize_interpolates_between_pixel_centres() {
    let source = GrayImage::from_raw(2, 2, vec![0, 255, 0, 255]).expect("buffer fits");
    let upscaled = resize_bilinear(&source, 4, 2);
    assert_eq!(upscaled.into_raw(), vec![0, 64, 191, 255, 0, 64, 191, 255]);

    let source = GrayImage::from_raw(4, 1, vec![0, 100, 200, 240]).expect("buffer fits");
    let downscaled = resize_bilinear(&source, 2, 1);
    assert_eq!(downscaled.into_raw(), vec![50, 220]);
}

#[test]
fn ssim_from_paths_handles_colour_and_size_differences() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let original = dir.path().join("original.png");
    let generated = dir.path().join("generated.png");
    let image = RgbImage::from_fn(48, 32, |x, y| Rgb([(x * 5) as u8, (y * 7) as u8, 90]));
    image.save(&original).expect("original saves");
    image.save(&generated).expect("generated saves");

    let identical = ssim_from_paths(&original, &generated).expect("ssim computes");
    assert!((identical - 1.0).abs() < 1e-12);

    let larger = image::imageops::resize(&image, 96, 64, image::imageops::FilterType::Triangle);
    larger.save(&generated).expect("larger generated saves");
    let resized = ssim_from_paths(&original, &generated).expect("ssim computes after resize");
    assert!(resized > 0.5 && resized <= 1.0, "unexpected ssim {resized}");
}
