//! Signed co-expression network construction and module detection.

use ndarray::{Array1, Array2};

pub mod adjacency;
pub mod association;
pub mod dendro;
pub mod modules;
pub mod tom;

/// Label reported for features that belong to no module.
pub const UNASSIGNED_LABEL: &str = "unassigned";

/// Dense signed network over the candidate features.
#[derive(Debug, Clone)]
pub struct CoexpressionNetwork {
    /// Rows of the full expression matrix the network was built from.
    pub feature_indices: Vec<usize>,
    pub feature_ids: Vec<String>,
    pub adjacency: Array2<f64>,
    pub tom: Array2<f64>,
}

impl CoexpressionNetwork {
    pub fn n_features(&self) -> usize {
        self.feature_ids.len()
    }
}

/// Module assignment per network feature plus one eigengene per module.
#[derive(Debug, Clone)]
pub struct ModulePartition {
    /// Index into `labels` per network feature, `None` for unassigned.
    pub assignments: Vec<Option<usize>>,
    /// Module labels, ordered by descending member count.
    pub labels: Vec<String>,
    /// Eigengene per module, aligned with `labels`; one value per sample.
    pub eigengenes: Vec<Array1<f64>>,
}

impl ModulePartition {
    pub fn n_modules(&self) -> usize {
        self.labels.len()
    }

    pub fn module_size(&self, module: usize) -> usize {
        self.assignments
            .iter()
            .filter(|a| **a == Some(module))
            .count()
    }

    pub fn members(&self, module: usize) -> Vec<usize> {
        self.assignments
            .iter()
            .enumerate()
            .filter_map(|(i, a)| (*a == Some(module)).then_some(i))
            .collect()
    }

    pub fn unassigned_count(&self) -> usize {
        self.assignments.iter().filter(|a| a.is_none()).count()
    }

    pub fn label_for(&self, feature: usize) -> &str {
        match self.assignments[feature] {
            Some(m) => &self.labels[m],
            None => UNASSIGNED_LABEL,
        }
    }
}
