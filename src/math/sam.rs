//! Permutation-based two-class significance testing.
//!
//! Per-feature statistic: difference of group means over a pooled standard
//! error stabilized by the fudge constant s0 (a percentile of the per-feature
//! standard errors). The null is built from repeated label permutations; the
//! expected statistic per rank is the mean of the sorted null vectors, and a
//! feature is called when its observed statistic diverges from the
//! rank-matched expectation by more than delta.

use std::cmp::Ordering;

use ndarray::Array2;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::cancel::CancelToken;
use crate::error::CoexnetError;
use crate::math::{argsort, median, percentile};
use crate::matrix::{ExpressionMatrix, Group, SampleAnnotation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SamParams {
    pub permutations: usize,
    pub delta: f64,
    pub s0_percentile: f64,
    pub seed: u64,
}

#[derive(Debug, Clone)]
pub struct DeResult {
    /// Observed stabilized statistic per feature.
    pub statistic: Vec<f64>,
    /// Rank-matched expected statistic, aligned per feature.
    pub expected: Vec<f64>,
    pub call: Vec<Option<Direction>>,
    /// Feature indices called up/down, ascending.
    pub up: Vec<usize>,
    pub down: Vec<usize>,
    pub s0: f64,
    pub delta: f64,
    /// Median count of null calls exceeding delta across permutations.
    pub false_calls: f64,
}

impl DeResult {
    pub fn significant_count(&self) -> usize {
        self.up.len() + self.down.len()
    }

    /// Median false calls over observed calls; 0 when nothing was called.
    pub fn fdr(&self) -> f64 {
        let called = self.significant_count();
        if called == 0 {
            0.0
        } else {
            self.false_calls / called as f64
        }
    }
}

pub fn test(
    matrix: &ExpressionMatrix,
    annotation: &SampleAnnotation,
    params: &SamParams,
    cancel: &CancelToken,
) -> Result<DeResult, CoexnetError> {
    annotation.validate_against(matrix)?;
    let case = annotation.group_indices(Group::Case);
    let control = annotation.group_indices(Group::Control);

    let (diff, spool) = group_statistics(&matrix.values, &case, &control);
    let mut s_sorted = spool.clone();
    let s0 = percentile(&mut s_sorted, params.s0_percentile);
    let observed: Vec<f64> = diff
        .iter()
        .zip(&spool)
        .map(|(d, s)| stabilized(*d, *s, s0))
        .collect();

    let n = matrix.n_samples();
    let n_case = case.len();
    let nulls: Vec<Option<Vec<f64>>> = (0..params.permutations)
        .into_par_iter()
        .map(|p| {
            if cancel.is_cancelled() {
                return None;
            }
            let mut rng = ChaCha8Rng::seed_from_u64(params.seed.wrapping_add(p as u64));
            let mut order: Vec<usize> = (0..n).collect();
            order.shuffle(&mut rng);
            let (perm_case, perm_control) = order.split_at(n_case);
            let (d, s) = group_statistics(&matrix.values, perm_case, perm_control);
            let mut stats: Vec<f64> = d
                .iter()
                .zip(&s)
                .map(|(d, s)| stabilized(*d, *s, s0))
                .collect();
            stats.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
            Some(stats)
        })
        .collect();
    cancel.check("permutation loop")?;
    let nulls: Vec<Vec<f64>> = nulls.into_iter().flatten().collect();
    if nulls.len() != params.permutations {
        return Err(CoexnetError::Cancelled("permutation loop"));
    }

    let n_features = matrix.n_features();
    let mut expected_by_rank = vec![0.0; n_features];
    for null in &nulls {
        for (acc, v) in expected_by_rank.iter_mut().zip(null) {
            *acc += v;
        }
    }
    for acc in &mut expected_by_rank {
        *acc /= nulls.len() as f64;
    }

    let order = argsort(&observed);
    let mut expected = vec![0.0; n_features];
    let mut call: Vec<Option<Direction>> = vec![None; n_features];
    let mut up = Vec::new();
    let mut down = Vec::new();
    for (rank, &feature) in order.iter().enumerate() {
        expected[feature] = expected_by_rank[rank];
        let gap = observed[feature] - expected_by_rank[rank];
        if gap > params.delta {
            call[feature] = Some(Direction::Up);
            up.push(feature);
        } else if gap < -params.delta {
            call[feature] = Some(Direction::Down);
            down.push(feature);
        }
    }
    up.sort_unstable();
    down.sort_unstable();

    let mut null_calls = Vec::with_capacity(nulls.len());
    for null in &nulls {
        let mut count = 0usize;
        for (v, e) in null.iter().zip(&expected_by_rank) {
            if (v - e).abs() > params.delta {
                count += 1;
            }
        }
        null_calls.push(count as f64);
    }
    let false_calls = median(&mut null_calls);

    Ok(DeResult {
        statistic: observed,
        expected,
        call,
        up,
        down,
        s0,
        delta: params.delta,
        false_calls,
    })
}

fn group_statistics(
    values: &Array2<f64>,
    case: &[usize],
    control: &[usize],
) -> (Vec<f64>, Vec<f64>) {
    let n1 = case.len() as f64;
    let n2 = control.len() as f64;
    let norm = (1.0 / n1 + 1.0 / n2) / (n1 + n2 - 2.0);
    let mut diff = Vec::with_capacity(values.nrows());
    let mut spool = Vec::with_capacity(values.nrows());
    for row in values.rows() {
        let mut s1 = 0.0;
        let mut q1 = 0.0;
        for &i in case {
            let v = row[i];
            s1 += v;
            q1 += v * v;
        }
        let mut s2 = 0.0;
        let mut q2 = 0.0;
        for &i in control {
            let v = row[i];
            s2 += v;
            q2 += v * v;
        }
        let m1 = s1 / n1;
        let m2 = s2 / n2;
        let ss1 = q1 - n1 * m1 * m1;
        let ss2 = q2 - n2 * m2 * m2;
        let s = (norm * (ss1 + ss2)).max(0.0).sqrt();
        diff.push(m1 - m2);
        spool.push(s);
    }
    (diff, spool)
}

fn stabilized(diff: f64, s: f64, s0: f64) -> f64 {
    let denom = s + s0;
    if denom > 0.0 { diff / denom } else { 0.0 }
}
