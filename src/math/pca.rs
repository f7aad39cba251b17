//! First principal component via power iteration.

use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::CoexnetError;

const MAX_ITERATIONS: usize = 300;
const TOLERANCE: f64 = 1e-12;
const INIT_SEED: u64 = 42;

/// Dominant eigenvector of the column covariance of a row-standardized
/// matrix (features × samples): one value per sample, sign-aligned to the
/// mean profile of the rows.
///
/// The start vector is drawn from a fixed-seed generator because the
/// all-ones vector lies in the null space of the covariance whenever the
/// rows are centered.
pub fn first_component(standardized: &Array2<f64>) -> Result<Array1<f64>, CoexnetError> {
    let m = standardized.nrows();
    let n = standardized.ncols();
    if m == 0 || n == 0 {
        return Err(CoexnetError::Numerical(
            "empty matrix has no principal component".to_string(),
        ));
    }
    let divisor = m.saturating_sub(1).max(1) as f64;
    let cov = standardized.t().dot(standardized) / divisor;

    let mut rng = ChaCha8Rng::seed_from_u64(INIT_SEED);
    let mut v: Array1<f64> = Array1::from_shape_fn(n, |_| rng.gen_range(-1.0..1.0));
    let norm = v.dot(&v).sqrt();
    if norm <= TOLERANCE {
        return Err(CoexnetError::Numerical(
            "degenerate start vector".to_string(),
        ));
    }
    v /= norm;

    for _ in 0..MAX_ITERATIONS {
        let w = cov.dot(&v);
        let norm = w.dot(&w).sqrt();
        if !norm.is_finite() || norm <= TOLERANCE {
            return Err(CoexnetError::Numerical(
                "singular eigengene computation".to_string(),
            ));
        }
        let w = w / norm;
        let shift = (&w - &v).mapv(f64::abs).sum();
        v = w;
        if shift < TOLERANCE {
            break;
        }
    }
    if v.iter().any(|x| !x.is_finite()) {
        return Err(CoexnetError::Numerical(
            "singular eigengene computation".to_string(),
        ));
    }

    let profile = standardized.sum_axis(Axis(0));
    if v.dot(&profile) < 0.0 {
        v.mapv_inplace(|x| -x);
    }
    Ok(v)
}
