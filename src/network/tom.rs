//! Topological overlap of a signed adjacency matrix.

use ndarray::Array2;
use rayon::prelude::*;

use crate::cancel::CancelToken;
use crate::error::CoexnetError;

/// TOM over an adjacency with unit diagonal. Connectivity and shared
/// neighbourhood both exclude the pair itself, which keeps every entry in
/// [0, 1]; the diagonal is 1 by convention.
pub fn topological_overlap(
    adjacency: &Array2<f64>,
    cancel: &CancelToken,
) -> Result<Array2<f64>, CoexnetError> {
    let n = adjacency.nrows();
    let slice = adjacency.as_slice().ok_or_else(|| {
        CoexnetError::Numerical("adjacency matrix is not in standard layout".to_string())
    })?;
    let degree: Vec<f64> = adjacency.rows().into_iter().map(|r| r.sum() - 1.0).collect();

    let mut tom = vec![0.0; n * n];
    tom.par_chunks_mut(n).enumerate().for_each(|(i, row)| {
        if cancel.is_cancelled() {
            return;
        }
        let a_i = &slice[i * n..(i + 1) * n];
        for (j, out) in row.iter_mut().enumerate() {
            if j == i {
                *out = 1.0;
                continue;
            }
            let a_j = &slice[j * n..(j + 1) * n];
            let a_ij = a_i[j];
            let mut dot = 0.0;
            for u in 0..n {
                dot += a_i[u] * a_j[u];
            }
            let shared = dot - 2.0 * a_ij;
            // k_i >= a_ij, so the denominator never drops below 1.
            let denom = degree[i].min(degree[j]) + 1.0 - a_ij;
            *out = (shared + a_ij) / denom;
        }
    });
    cancel.check("topological overlap")?;

    Array2::from_shape_vec((n, n), tom).map_err(|e| CoexnetError::Numerical(e.to_string()))
}
