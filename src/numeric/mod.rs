mod frechet;
mod similarity;
mod ssim;
#[cfg(test)]
mod tests;

pub use frechet::{FrechetError, frechet_distance};
pub use similarity::logit_similarity;
pub use ssim::ssim_from_paths;
