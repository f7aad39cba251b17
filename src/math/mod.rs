//! Numeric primitives shared by the analysis stages.

use std::cmp::Ordering;

use ndarray::Array2;

use crate::error::CoexnetError;

pub mod correction;
pub mod forest;
pub mod gsea;
pub mod pca;
pub mod sam;
pub mod tree;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Linear-interpolated percentile; sorts in place. `pct` in [0, 100].
pub fn percentile(values: &mut [f64], pct: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let rank = pct.clamp(0.0, 100.0) / 100.0 * (values.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return values[lo];
    }
    let frac = rank - lo as f64;
    values[lo] * (1.0 - frac) + values[hi] * frac
}

pub fn median(values: &mut [f64]) -> f64 {
    percentile(values, 50.0)
}

/// Pearson correlation; NaN when either input has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return f64::NAN;
    }
    let mx = mean(&x[..n]);
    let my = mean(&y[..n]);
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for i in 0..n {
        let dx = x[i] - mx;
        let dy = y[i] - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    sxy / (sxx * syy).sqrt()
}

/// Indices sorted by value ascending, ties broken by index for determinism.
pub fn argsort(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });
    order
}

/// Z-scores each row across columns (sample-variance denominator).
/// Zero-variance rows are a NumericalError; callers filter them out first.
pub fn standardize_rows(values: &Array2<f64>) -> Result<Array2<f64>, CoexnetError> {
    let n = values.ncols();
    if n < 2 {
        return Err(CoexnetError::Numerical(
            "cannot standardize rows with fewer than 2 columns".to_string(),
        ));
    }
    let mut out = values.clone();
    for (i, mut row) in out.rows_mut().into_iter().enumerate() {
        let m = row.sum() / n as f64;
        let ss: f64 = row.iter().map(|v| (v - m) * (v - m)).sum();
        let sd = (ss / (n - 1) as f64).sqrt();
        if sd <= f64::EPSILON || !sd.is_finite() {
            return Err(CoexnetError::Numerical(format!(
                "zero-variance row {} cannot be standardized",
                i
            )));
        }
        row.mapv_inplace(|v| (v - m) / sd);
    }
    Ok(out)
}
