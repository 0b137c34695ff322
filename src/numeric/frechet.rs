use ndarray::{Array1, Array2, Axis};
use thiserror::Error;

pub const COVARIANCE_EPSILON: f64 = 1e-6;

const JACOBI_MAX_SWEEPS: usize = 100;
const JACOBI_TOLERANCE: f64 = 1e-24;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrechetError {
    #[error("feature shapes do not match: {left} vs {right} dimensions")]
    ShapeMismatch { left: usize, right: usize },
    #[error("{side} feature population is empty")]
    EmptyPopulation { side: &'static str },
    #[error("{side} feature population mixes vector lengths")]
    RaggedPopulation { side: &'static str },
}

/// Fréchet distance between two feature populations:
/// `|mu1 - mu2|^2 + tr(S1 + S2 - 2 sqrtm(S1 S2 + eps I))`.
///
/// With fewer than two samples on either side both covariances are taken as
/// zero. `tr sqrtm(S1 S2 + eps I)` is summed from the eigenvalues of `S1 S2`,
/// which equal those of the small symmetric Gram matrix `M M^T` with
/// `M = A B^T` for the centred populations `A` and `B`. Only the real part of
/// each root is kept. The `eps` term can leave the result slightly negative
/// (by up to `2 d sqrt(eps)` for single samples); it is returned as is.
pub fn frechet_distance(left: &[Vec<f32>], right: &[Vec<f32>]) -> Result<f64, FrechetError> {
    let left = population_matrix(left, "left")?;
    let right = population_matrix(right, "right")?;

    if left.ncols() != right.ncols() {
        return Err(FrechetError::ShapeMismatch {
            left: left.ncols(),
            right: right.ncols(),
        });
    }
    let dims = left.ncols();

    let left_mean = population_mean(&left, "left")?;
    let right_mean = population_mean(&right, "right")?;
    let diff = &left_mean - &right_mean;
    let mean_term = diff.dot(&diff);

    let degenerate = left.nrows() < 2 || right.nrows() < 2;
    let (left_trace, right_trace, mut eigenvalues) = if degenerate {
        (0.0, 0.0, Vec::new())
    } else {
        let left_centred = &left - &left_mean;
        let right_centred = &right - &right_mean;
        let left_scale = (left.nrows() - 1) as f64;
        let right_scale = (right.nrows() - 1) as f64;

        let left_trace = left_centred.iter().map(|value| value * value).sum::<f64>() / left_scale;
        let right_trace =
            right_centred.iter().map(|value| value * value).sum::<f64>() / right_scale;

        let cross = left_centred.dot(&right_centred.t());
        let gram = if cross.nrows() <= cross.ncols() {
            cross.dot(&cross.t())
        } else {
            cross.t().dot(&cross)
        };
        let gram = gram.mapv(|value| value / (left_scale * right_scale));

        (left_trace, right_trace, symmetric_eigenvalues(gram))
    };

    eigenvalues.sort_by(|a, b| b.total_cmp(a));
    eigenvalues.truncate(dims);
    let zero_eigenvalues = dims - eigenvalues.len();

    let covmean_trace = eigenvalues
        .iter()
        .map(|value| (value + COVARIANCE_EPSILON).max(0.0).sqrt())
        .sum::<f64>()
        + zero_eigenvalues as f64 * COVARIANCE_EPSILON.sqrt();

    Ok(mean_term + left_trace + right_trace - 2.0 * covmean_trace)
}

/// Eigenvalues of a symmetric matrix by cyclic Jacobi rotation, unordered.
pub fn symmetric_eigenvalues(mut matrix: Array2<f64>) -> Vec<f64> {
    let n = matrix.nrows();
    debug_assert_eq!(n, matrix.ncols());

    let scale = matrix.iter().map(|value| value * value).sum::<f64>();
    if scale == 0.0 {
        return vec![0.0; n];
    }

    for _ in 0..JACOBI_MAX_SWEEPS {
        let off_diagonal = off_diagonal_energy(&matrix);
        if off_diagonal <= JACOBI_TOLERANCE * scale {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = matrix[[p, q]];
                if apq == 0.0 {
                    continue;
                }

                let theta = (matrix[[q, q]] - matrix[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let kp = matrix[[k, p]];
                    let kq = matrix[[k, q]];
                    matrix[[k, p]] = c * kp - s * kq;
                    matrix[[k, q]] = s * kp + c * kq;
                }
                for k in 0..n {
                    let pk = matrix[[p, k]];
                    let qk = matrix[[q, k]];
                    matrix[[p, k]] = c * pk - s * qk;
                    matrix[[q, k]] = s * pk + c * qk;
                }
            }
        }
    }

    (0..n).map(|index| matrix[[index, index]]).collect()
}

fn off_diagonal_energy(matrix: &Array2<f64>) -> f64 {
    matrix
        .indexed_iter()
        .filter(|((row, col), _)| row != col)
        .map(|(_, value)| value * value)
        .sum()
}

fn population_matrix(rows: &[Vec<f32>], side: &'static str) -> Result<Array2<f64>, FrechetError> {
    let dims = rows
        .first()
        .map(Vec::len)
        .filter(|dims| *dims > 0)
        .ok_or(FrechetError::EmptyPopulation { side })?;

    let mut matrix = Array2::<f64>::zeros((rows.len(), dims));
    for (row_index, row) in rows.iter().enumerate() {
        if row.len() != dims {
            return Err(FrechetError::RaggedPopulation { side });
        }
        for (col_index, value) in row.iter().enumerate() {
            matrix[[row_index, col_index]] = f64::from(*value);
        }
    }
    Ok(matrix)
}

fn population_mean(matrix: &Array2<f64>, side: &'static str) -> Result<Array1<f64>, FrechetError> {
    matrix
        .mean_axis(Axis(0))
        .ok_or(FrechetError::EmptyPopulation { side })
}
