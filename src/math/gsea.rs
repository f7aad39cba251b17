//! Pre-ranked gene-set enrichment.
//!
//! Weighted running-sum statistic over a descending ranked list,
//! gene-permutation null, sign-matched empirical p-values, normalization by
//! the same-sign null mean and Benjamini-Hochberg correction across the sets
//! tested within one category run.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::warn;

use crate::cancel::CancelToken;
use crate::error::CoexnetError;
use crate::geneset::source::GenesetSource;
use crate::geneset::{GeneSet, GenesetCategory};
use crate::math::correction::benjamini_hochberg;

#[derive(Debug, Clone)]
pub struct GseaParams {
    pub permutations: usize,
    /// Exponent on |score| when weighting hits.
    pub weight: f64,
    pub min_size: usize,
    pub max_size: usize,
    /// Adjusted p-value cutoff applied to the reported results.
    pub alpha: f64,
    pub seed: u64,
}

/// Identifier -> score list, held sorted descending by score. Duplicate
/// identifiers keep their strongest-ranked occurrence.
#[derive(Debug, Clone)]
pub struct RankedList {
    pub names: Vec<String>,
    pub scores: Vec<f64>,
}

impl RankedList {
    pub fn new(mut entries: Vec<(String, f64)>) -> Self {
        entries.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        let mut seen = HashSet::new();
        let mut names = Vec::with_capacity(entries.len());
        let mut scores = Vec::with_capacity(entries.len());
        for (name, score) in entries {
            if seen.insert(name.clone()) {
                names.push(name);
                scores.push(score);
            }
        }
        Self { names, scores }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct EnrichmentResult {
    pub category: GenesetCategory,
    pub name: String,
    /// Members matched against the ranked list, after dedup.
    pub size: usize,
    pub es: f64,
    pub nes: f64,
    pub p_value: f64,
    pub adj_p_value: f64,
}

/// Aggregate over all requested categories; skipped entries carry the
/// category code and the reason it was left out.
#[derive(Debug, Clone, Default)]
pub struct EnrichmentRun {
    pub results: Vec<EnrichmentResult>,
    pub skipped: Vec<(String, String)>,
}

enum Outcome {
    Done(Vec<EnrichmentResult>),
    Skipped { code: String, reason: String },
    Cancelled,
}

/// Runs every category against the source, isolating per-category failures.
pub fn run_categories(
    source: &dyn GenesetSource,
    categories: &[GenesetCategory],
    ranked: &RankedList,
    params: &GseaParams,
    cancel: &CancelToken,
) -> Result<EnrichmentRun, CoexnetError> {
    let outcomes: Vec<Outcome> = categories
        .par_iter()
        .enumerate()
        .map(|(c, category)| {
            if cancel.is_cancelled() {
                return Outcome::Cancelled;
            }
            let sets = match source.fetch(*category) {
                Ok(sets) => sets,
                Err(e) => {
                    warn!(category = category.code(), error = %e, "gene-set source unavailable; skipping");
                    return Outcome::Skipped {
                        code: category.code().to_string(),
                        reason: e.to_string(),
                    };
                }
            };
            if sets.is_empty() {
                warn!(category = category.code(), "gene-set source returned no sets; skipping");
                return Outcome::Skipped {
                    code: category.code().to_string(),
                    reason: "source returned no gene sets".to_string(),
                };
            }
            let mut cat_params = params.clone();
            cat_params.seed = params.seed.wrapping_add((c as u64) << 32);
            match prerank(ranked, &sets, &cat_params, cancel) {
                Ok(results) => Outcome::Done(results),
                Err(CoexnetError::Cancelled(unit)) => {
                    let _ = unit;
                    Outcome::Cancelled
                }
                Err(e) => {
                    warn!(category = category.code(), error = %e, "enrichment failed; skipping");
                    Outcome::Skipped {
                        code: category.code().to_string(),
                        reason: e.to_string(),
                    }
                }
            }
        })
        .collect();

    let mut run = EnrichmentRun::default();
    for outcome in outcomes {
        match outcome {
            Outcome::Done(mut results) => run.results.append(&mut results),
            Outcome::Skipped { code, reason } => run.skipped.push((code, reason)),
            Outcome::Cancelled => return Err(CoexnetError::Cancelled("enrichment categories")),
        }
    }
    Ok(run)
}

/// Pre-ranked test over one category's sets: size-filter against the ranked
/// list, score, permute, correct across the tested sets, filter by alpha.
pub fn prerank(
    ranked: &RankedList,
    sets: &[GeneSet],
    params: &GseaParams,
    cancel: &CancelToken,
) -> Result<Vec<EnrichmentResult>, CoexnetError> {
    let position: HashMap<&str, usize> = ranked
        .names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    let mut kept: Vec<(&GeneSet, Vec<usize>)> = Vec::new();
    for set in sets {
        let mut hits: Vec<usize> = set
            .genes
            .iter()
            .filter_map(|g| position.get(g.as_str()).copied())
            .collect();
        hits.sort_unstable();
        hits.dedup();
        if hits.len() >= params.min_size && hits.len() <= params.max_size {
            kept.push((set, hits));
        }
    }

    let scored: Vec<Option<(f64, f64, f64)>> = kept
        .par_iter()
        .enumerate()
        .map(|(i, (_, hits))| {
            if cancel.is_cancelled() {
                return None;
            }
            let es = enrichment_score(&ranked.scores, hits, params.weight);
            let nulls = null_scores(
                &ranked.scores,
                hits.len(),
                params.weight,
                params.permutations,
                params.seed.wrapping_add(i as u64),
            );
            let (nes, p) = significance(es, &nulls);
            Some((es, nes, p))
        })
        .collect();
    cancel.check("enrichment sets")?;
    let scored: Vec<(f64, f64, f64)> = scored.into_iter().flatten().collect();
    if scored.len() != kept.len() {
        return Err(CoexnetError::Cancelled("enrichment sets"));
    }

    let pvalues: Vec<f64> = scored.iter().map(|(_, _, p)| *p).collect();
    let adjusted = benjamini_hochberg(&pvalues);

    let mut results: Vec<EnrichmentResult> = kept
        .iter()
        .zip(scored.iter().zip(&adjusted))
        .filter(|(_, (_, adj))| **adj < params.alpha)
        .map(|((set, hits), ((es, nes, p), adj))| EnrichmentResult {
            category: set.category,
            name: set.name.clone(),
            size: hits.len(),
            es: *es,
            nes: *nes,
            p_value: *p,
            adj_p_value: *adj,
        })
        .collect();
    results.sort_by(|a, b| {
        a.adj_p_value
            .partial_cmp(&b.adj_p_value)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                a.p_value
                    .partial_cmp(&b.p_value)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.name.cmp(&b.name))
    });
    Ok(results)
}

/// Running-sum enrichment score. `hits` are ranked-list positions, sorted
/// ascending; the returned value is the deviation of largest magnitude.
pub fn enrichment_score(scores: &[f64], hits: &[usize], weight: f64) -> f64 {
    let n = scores.len();
    let nh = hits.len();
    if nh == 0 || nh >= n {
        return 0.0;
    }
    let mut sum_w = 0.0;
    for &h in hits {
        sum_w += scores[h].abs().powf(weight);
    }
    if sum_w <= 0.0 {
        return 0.0;
    }
    let miss = 1.0 / (n - nh) as f64;
    let mut running = 0.0;
    let mut best = 0.0_f64;
    let mut next = 0usize;
    for (i, score) in scores.iter().enumerate() {
        if next < nh && hits[next] == i {
            running += score.abs().powf(weight) / sum_w;
            next += 1;
        } else {
            running -= miss;
        }
        if running.abs() > best.abs() {
            best = running;
        }
    }
    best
}

fn null_scores(scores: &[f64], nh: usize, weight: f64, permutations: usize, seed: u64) -> Vec<f64> {
    let n = scores.len();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut positions: Vec<usize> = (0..n).collect();
    let mut draw = vec![0usize; nh];
    let mut nulls = Vec::with_capacity(permutations);
    for _ in 0..permutations {
        for t in 0..nh {
            let j = rng.gen_range(t..n);
            positions.swap(t, j);
        }
        draw.copy_from_slice(&positions[..nh]);
        draw.sort_unstable();
        nulls.push(enrichment_score(scores, &draw, weight));
    }
    nulls
}

/// NES by same-sign null mean and a sign-matched empirical p-value.
fn significance(es: f64, nulls: &[f64]) -> (f64, f64) {
    if es >= 0.0 {
        let same: Vec<f64> = nulls.iter().copied().filter(|v| *v >= 0.0).collect();
        let p = if same.is_empty() {
            1.0
        } else {
            same.iter().filter(|v| **v >= es).count() as f64 / same.len() as f64
        };
        let mean = if same.is_empty() {
            0.0
        } else {
            same.iter().sum::<f64>() / same.len() as f64
        };
        let nes = if mean > 0.0 { es / mean } else { 0.0 };
        (nes, p)
    } else {
        let same: Vec<f64> = nulls.iter().copied().filter(|v| *v < 0.0).collect();
        let p = if same.is_empty() {
            1.0
        } else {
            same.iter().filter(|v| **v <= es).count() as f64 / same.len() as f64
        };
        let mean = if same.is_empty() {
            0.0
        } else {
            same.iter().sum::<f64>() / same.len() as f64
        };
        let nes = if mean < 0.0 { -(es / mean) } else { 0.0 };
        (nes, p)
    }
}
