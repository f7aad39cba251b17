//! Module detection: cluster the TOM dissimilarity, cut the tree, compute
//! eigengenes and merge modules whose eigengenes are nearly collinear.

use ndarray::{Array1, Array2, Axis};
use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::error::CoexnetError;
use crate::math::{pca, standardize_rows};
use crate::network::ModulePartition;
use crate::network::dendro::{average_linkage, dynamic_cut};

#[derive(Debug, Clone)]
pub struct ModuleParams {
    pub min_module_size: usize,
    pub split_sensitivity: f64,
    /// Modules merge while eigengene correlation exceeds 1 minus this height.
    pub merge_cut_height: f64,
}

/// Runs the full detection pass over the candidate rows (features x samples)
/// and their TOM. Returns the partition with labels ordered by descending
/// module size, plus notes worth surfacing to the caller.
pub fn detect_modules(
    expression: &Array2<f64>,
    tom: &Array2<f64>,
    params: &ModuleParams,
    cancel: &CancelToken,
) -> Result<(ModulePartition, Vec<String>), CoexnetError> {
    let mut warnings = Vec::new();

    let dissimilarity = tom.mapv(|v| 1.0 - v);
    let dendrogram = average_linkage(&dissimilarity, cancel)?;
    let mut assignments = dynamic_cut(
        &dendrogram,
        params.min_module_size,
        params.split_sensitivity,
    );
    let mut n_modules = assignments
        .iter()
        .flatten()
        .copied()
        .max()
        .map_or(0, |m| m + 1);
    debug!(modules = n_modules, "initial tree cut");

    if n_modules == 0 {
        warnings.push(
            "module detection produced no modules; all network features unassigned".to_string(),
        );
        return Ok((
            ModulePartition {
                assignments,
                labels: Vec::new(),
                eigengenes: Vec::new(),
            },
            warnings,
        ));
    }

    // Fold the closest over-threshold eigengene pair, one pair at a time,
    // recomputing eigengenes after each fold.
    let threshold = 1.0 - params.merge_cut_height;
    let eigengenes = loop {
        cancel.check("module merge")?;
        let eigengenes =
            module_eigengenes(expression, &mut assignments, &mut n_modules, &mut warnings);
        if n_modules < 2 {
            break eigengenes;
        }
        let mut best: Option<(usize, usize, f64)> = None;
        for a in 0..n_modules {
            for b in (a + 1)..n_modules {
                let r = eigengene_correlation(&eigengenes[a], &eigengenes[b]);
                if r > threshold && best.is_none_or(|(_, _, br)| r > br) {
                    best = Some((a, b, r));
                }
            }
        }
        let Some((a, b, r)) = best else {
            break eigengenes;
        };
        debug!(correlation = r, "merging module pair");
        for slot in assignments.iter_mut() {
            match slot {
                Some(m) if *m == b => *slot = Some(a),
                Some(m) if *m > b => *m -= 1,
                _ => {}
            }
        }
        n_modules -= 1;
    };

    // Relabel by descending size; M1 is always the largest module.
    let mut sizes = vec![0usize; n_modules];
    for m in assignments.iter().flatten() {
        sizes[*m] += 1;
    }
    let mut order: Vec<usize> = (0..n_modules).collect();
    order.sort_by(|&x, &y| sizes[y].cmp(&sizes[x]).then(x.cmp(&y)));
    let mut rank = vec![0usize; n_modules];
    for (new_idx, &old) in order.iter().enumerate() {
        rank[old] = new_idx;
    }
    for slot in assignments.iter_mut() {
        if let Some(m) = slot {
            *m = rank[*m];
        }
    }
    let eigengenes: Vec<Array1<f64>> = order.iter().map(|&old| eigengenes[old].clone()).collect();
    let labels: Vec<String> = (1..=n_modules).map(|i| format!("M{i}")).collect();

    let unassigned = assignments.iter().filter(|a| a.is_none()).count();
    if unassigned > 0 {
        warnings.push(format!(
            "{unassigned} network features left unassigned by module detection"
        ));
    }

    Ok((
        ModulePartition {
            assignments,
            labels,
            eigengenes,
        },
        warnings,
    ))
}

/// Eigengene per module. A module whose eigengene cannot be computed is
/// dropped: its members go back to unassigned and later module indices
/// shift down, so the run continues without it.
fn module_eigengenes(
    expression: &Array2<f64>,
    assignments: &mut [Option<usize>],
    n_modules: &mut usize,
    warnings: &mut Vec<String>,
) -> Vec<Array1<f64>> {
    loop {
        let mut eigengenes = Vec::with_capacity(*n_modules);
        let mut failure: Option<(usize, usize, CoexnetError)> = None;
        for module in 0..*n_modules {
            let members: Vec<usize> = assignments
                .iter()
                .enumerate()
                .filter_map(|(i, a)| (*a == Some(module)).then_some(i))
                .collect();
            let sub = expression.select(Axis(0), &members);
            match standardize_rows(&sub).and_then(|z| pca::first_component(&z)) {
                Ok(eigengene) => eigengenes.push(eigengene),
                Err(e) => {
                    failure = Some((module, members.len(), e));
                    break;
                }
            }
        }
        let Some((module, size, cause)) = failure else {
            return eigengenes;
        };
        warn!(size, %cause, "dropping module with no eigengene");
        warnings.push(format!(
            "module of {size} network features dropped: {cause}"
        ));
        for slot in assignments.iter_mut() {
            match slot {
                Some(m) if *m == module => *slot = None,
                Some(m) if *m > module => *m -= 1,
                _ => {}
            }
        }
        *n_modules -= 1;
    }
}

fn eigengene_correlation(a: &Array1<f64>, b: &Array1<f64>) -> f64 {
    let am = a.mean().unwrap_or(0.0);
    let bm = b.mean().unwrap_or(0.0);
    let ac = a.mapv(|v| v - am);
    let bc = b.mapv(|v| v - bm);
    let denom = (ac.dot(&ac) * bc.dot(&bc)).sqrt();
    if denom <= 0.0 {
        return 0.0;
    }
    ac.dot(&bc) / denom
}
