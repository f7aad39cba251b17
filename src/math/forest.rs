//! Bootstrap tree ensemble with mean-decrease-impurity importances.

use std::cmp::Ordering;

use ndarray::ArrayView2;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::cancel::CancelToken;
use crate::error::CoexnetError;
use crate::math::sam::{DeResult, Direction};
use crate::math::tree::{DecisionTree, TreeOptions};

#[derive(Debug, Clone)]
pub struct ForestParams {
    pub trees: usize,
    pub max_depth: usize,
    pub seed: u64,
}

#[derive(Debug, Clone)]
pub struct RandomForest {
    /// Normalized importance per feature (sums to 1 when any split fired).
    pub importance: Vec<f64>,
    /// Majority-vote accuracy over out-of-bag predictions.
    pub oob_accuracy: f64,
}

struct TreePartial {
    importance: Vec<f64>,
    votes: Vec<[u32; 2]>,
}

/// Trains `params.trees` trees on bootstrap resamples of `x`
/// (samples × features), √P candidate features per split. Per-tree seeds
/// derive from the run seed, so rankings reproduce regardless of scheduling.
pub fn train(
    x: &ArrayView2<'_, f64>,
    y: &[u8],
    params: &ForestParams,
    cancel: &CancelToken,
) -> Result<RandomForest, CoexnetError> {
    let n = x.nrows();
    let p = x.ncols();
    if n != y.len() {
        return Err(CoexnetError::Input(format!(
            "labels cover {} samples but the matrix has {}",
            y.len(),
            n
        )));
    }
    if n < 2 || p == 0 {
        return Err(CoexnetError::Input(
            "ensemble training needs at least 2 samples and 1 feature".to_string(),
        ));
    }
    if !y.contains(&0) || !y.contains(&1) {
        return Err(CoexnetError::Input(
            "ensemble training needs both classes present".to_string(),
        ));
    }
    let mtry = ((p as f64).sqrt().floor() as usize).max(1);
    let opts = TreeOptions {
        max_depth: params.max_depth,
        mtry,
    };

    let partials: Vec<Option<TreePartial>> = (0..params.trees)
        .into_par_iter()
        .map(|t| {
            if cancel.is_cancelled() {
                return None;
            }
            let mut rng = ChaCha8Rng::seed_from_u64(params.seed.wrapping_add(t as u64));
            let mut in_bag = vec![false; n];
            let mut rows = Vec::with_capacity(n);
            for _ in 0..n {
                let r = rng.gen_range(0..n);
                in_bag[r] = true;
                rows.push(r);
            }
            let mut importance = vec![0.0; p];
            let tree = DecisionTree::fit(x, y, rows, &opts, &mut rng, &mut importance);
            let mut votes = vec![[0u32; 2]; n];
            for (sample, vote) in votes.iter_mut().enumerate() {
                if !in_bag[sample] {
                    let class = tree.predict(x, sample);
                    vote[class as usize] += 1;
                }
            }
            Some(TreePartial { importance, votes })
        })
        .collect();
    cancel.check("tree training")?;
    let partials: Vec<TreePartial> = partials.into_iter().flatten().collect();
    if partials.len() != params.trees {
        return Err(CoexnetError::Cancelled("tree training"));
    }

    let mut importance = vec![0.0; p];
    let mut votes = vec![[0u32; 2]; n];
    for partial in &partials {
        for (acc, v) in importance.iter_mut().zip(&partial.importance) {
            *acc += v;
        }
        for (acc, v) in votes.iter_mut().zip(&partial.votes) {
            acc[0] += v[0];
            acc[1] += v[1];
        }
    }
    for v in &mut importance {
        *v /= params.trees as f64;
    }
    let total: f64 = importance.iter().sum();
    if total > 0.0 {
        for v in &mut importance {
            *v /= total;
        }
    }

    let mut voted = 0usize;
    let mut correct = 0usize;
    for (sample, v) in votes.iter().enumerate() {
        if v[0] + v[1] == 0 {
            continue;
        }
        voted += 1;
        let pred = if v[1] > v[0] { 1 } else { 0 };
        if pred == y[sample] {
            correct += 1;
        }
    }
    let oob_accuracy = if voted > 0 {
        correct as f64 / voted as f64
    } else {
        0.0
    };

    Ok(RandomForest {
        importance,
        oob_accuracy,
    })
}

#[derive(Debug, Clone)]
pub struct ImportanceRanking {
    pub importance: Vec<f64>,
    /// Feature indices by importance descending, index-stable under ties.
    pub order: Vec<usize>,
    pub oob_accuracy: f64,
}

impl ImportanceRanking {
    pub fn new(forest: &RandomForest) -> Self {
        let mut order: Vec<usize> = (0..forest.importance.len()).collect();
        order.sort_by(|&a, &b| {
            forest.importance[b]
                .partial_cmp(&forest.importance[a])
                .unwrap_or(Ordering::Equal)
                .then(a.cmp(&b))
        });
        Self {
            importance: forest.importance.clone(),
            order,
            oob_accuracy: forest.oob_accuracy,
        }
    }

    pub fn top_k(&self, k: usize) -> &[usize] {
        &self.order[..k.min(self.order.len())]
    }
}

/// Top-K features that also carry a significant call, split by direction and
/// kept in descending importance order.
#[derive(Debug, Clone, Default)]
pub struct CandidateFeatureSet {
    pub up: Vec<usize>,
    pub down: Vec<usize>,
}

impl CandidateFeatureSet {
    pub fn from_ranking(ranking: &ImportanceRanking, k: usize, de: &DeResult) -> Self {
        let mut up = Vec::new();
        let mut down = Vec::new();
        for &feature in ranking.top_k(k) {
            match de.call.get(feature).copied().flatten() {
                Some(Direction::Up) => up.push(feature),
                Some(Direction::Down) => down.push(feature),
                None => {}
            }
        }
        Self { up, down }
    }

    pub fn all(&self) -> Vec<usize> {
        let mut all = self.up.clone();
        all.extend_from_slice(&self.down);
        all
    }

    pub fn len(&self) -> usize {
        self.up.len() + self.down.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
