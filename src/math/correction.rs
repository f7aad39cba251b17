//! Multiple-testing correction.

use std::cmp::Ordering;

/// Benjamini-Hochberg adjusted p-values, returned in input order.
pub fn benjamini_hochberg(pvalues: &[f64]) -> Vec<f64> {
    let n = pvalues.len();
    if n == 0 {
        return Vec::new();
    }
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        pvalues[a]
            .partial_cmp(&pvalues[b])
            .unwrap_or(Ordering::Equal)
    });
    let mut adjusted = vec![0.0; n];
    let mut running_min = 1.0_f64;
    for rank in (0..n).rev() {
        let i = order[rank];
        let adj = (pvalues[i] * n as f64 / (rank + 1) as f64).min(1.0);
        running_min = running_min.min(adj);
        adjusted[i] = running_min;
    }
    adjusted
}
