//! Signed adjacency from feature-wise Pearson correlation.

use ndarray::Array2;

use crate::error::CoexnetError;
use crate::math::standardize_rows;

/// Rows whose sample standard deviation vanishes; they carry no correlation
/// signal and must be excluded before building the network.
pub fn zero_variance_rows(expression: &Array2<f64>) -> Vec<usize> {
    let n = expression.ncols();
    expression
        .rows()
        .into_iter()
        .enumerate()
        .filter_map(|(i, row)| {
            if n < 2 {
                return Some(i);
            }
            let m = row.sum() / n as f64;
            let ss: f64 = row.iter().map(|v| (v - m) * (v - m)).sum();
            let sd = (ss / (n - 1) as f64).sqrt();
            (sd <= f64::EPSILON || !sd.is_finite()).then_some(i)
        })
        .collect()
}

/// `((1 + r) / 2)^beta` over all feature pairs. Correlations come from one
/// standardized product so the matrix is exactly symmetric; the diagonal is
/// pinned to 1.
pub fn signed_adjacency(expression: &Array2<f64>, beta: f64) -> Result<Array2<f64>, CoexnetError> {
    let samples = expression.ncols();
    if samples < 3 {
        return Err(CoexnetError::Input(format!(
            "network construction needs at least 3 samples, found {samples}"
        )));
    }
    let z = standardize_rows(expression)?;
    let mut adjacency = z.dot(&z.t());
    adjacency /= (samples - 1) as f64;
    adjacency.mapv_inplace(|r| ((1.0 + r.clamp(-1.0, 1.0)) / 2.0).powf(beta));
    for i in 0..expression.nrows() {
        adjacency[(i, i)] = 1.0;
    }
    Ok(adjacency)
}
