use anyhow::{Result, bail};

pub fn dot_product(left: &[f32], right: &[f32]) -> Result<f64> {
    if left.len() != right.len() {
        bail!(
            "embedding dimensionality mismatch: {} vs {}",
            left.len(),
            right.len()
        );
    }
    if left.is_empty() {
        bail!("cannot compare empty embeddings");
    }

    Ok(left
        .iter()
        .zip(right.iter())
        .map(|(left_value, right_value)| f64::from(*left_value) * f64::from(*right_value))
        .sum::<f64>())
}

/// Paired image/text score on the model's own logit scale. Inputs are unit
/// vectors, so this is `logit_scale * cosine`; no range is promised.
pub fn logit_similarity(image: &[f32], text: &[f32], logit_scale: f32) -> Result<f64> {
    Ok(f64::from(logit_scale) * dot_product(image, text)?)
}
