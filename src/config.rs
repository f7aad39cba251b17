use crate::error::CoexnetError;
use crate::geneset::GenesetCategory;

/// All analysis parameters for one run, built from CLI arguments and
/// validated once before the first stage executes. No stage reads
/// configuration from anywhere else.
#[derive(Debug, Clone)]
pub struct PipelineParams {
    pub permutations: usize,
    pub delta: f64,
    pub s0_percentile: f64,
    pub trees: usize,
    pub max_depth: usize,
    pub top_k: usize,
    pub seed: u64,
    pub beta: f64,
    pub min_module_size: usize,
    pub merge_cut_height: f64,
    pub split_sensitivity: f64,
    pub min_set_size: usize,
    pub max_set_size: usize,
    pub enrich_permutations: usize,
    pub enrich_alpha: f64,
    pub assoc_alpha: f64,
    pub edge_threshold: f64,
    pub max_dense_features: usize,
    pub threads: usize,
    pub timeout_secs: u64,
    pub categories: Vec<GenesetCategory>,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            permutations: 1000,
            delta: 1.0,
            s0_percentile: 5.0,
            trees: 500,
            max_depth: 12,
            top_k: 500,
            seed: 42,
            beta: 12.0,
            min_module_size: 10,
            merge_cut_height: 0.25,
            split_sensitivity: 0.15,
            min_set_size: 5,
            max_set_size: 500,
            enrich_permutations: 1000,
            enrich_alpha: 0.05,
            assoc_alpha: 0.05,
            edge_threshold: 0.05,
            max_dense_features: 2000,
            threads: 0,
            timeout_secs: 0,
            categories: Vec::new(),
        }
    }
}

impl PipelineParams {
    pub fn validate(&self) -> Result<(), CoexnetError> {
        if self.permutations == 0 {
            return Err(config_err("permutations must be >= 1"));
        }
        if !self.delta.is_finite() || self.delta <= 0.0 {
            return Err(config_err("delta must be a positive finite number"));
        }
        if !(0.0..=100.0).contains(&self.s0_percentile) {
            return Err(config_err("s0-percentile must lie in [0, 100]"));
        }
        if self.trees == 0 {
            return Err(config_err("trees must be >= 1"));
        }
        if self.max_depth == 0 {
            return Err(config_err("max-depth must be >= 1"));
        }
        if self.top_k == 0 {
            return Err(config_err("top-k must be >= 1"));
        }
        if !self.beta.is_finite() || self.beta < 1.0 {
            return Err(config_err("beta must be >= 1"));
        }
        if self.min_module_size == 0 {
            return Err(config_err("min-module-size must be >= 1"));
        }
        if !(0.0..=1.0).contains(&self.merge_cut_height) {
            return Err(config_err("merge-cut-height must lie in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.split_sensitivity) {
            return Err(config_err("split-sensitivity must lie in [0, 1]"));
        }
        if self.min_set_size == 0 {
            return Err(config_err("min-set-size must be >= 1"));
        }
        if self.min_set_size > self.max_set_size {
            return Err(config_err(&format!(
                "min-set-size ({}) exceeds max-set-size ({})",
                self.min_set_size, self.max_set_size
            )));
        }
        if self.enrich_permutations == 0 {
            return Err(config_err("enrich-permutations must be >= 1"));
        }
        if !(0.0 < self.enrich_alpha && self.enrich_alpha <= 1.0) {
            return Err(config_err("enrichment alpha must lie in (0, 1]"));
        }
        if !(0.0 < self.assoc_alpha && self.assoc_alpha <= 1.0) {
            return Err(config_err("association alpha must lie in (0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.edge_threshold) {
            return Err(config_err("edge-threshold must lie in [0, 1]"));
        }
        if self.max_dense_features < 2 {
            return Err(config_err("max-dense-features must be >= 2"));
        }
        for (i, category) in self.categories.iter().enumerate() {
            if self.categories[..i].contains(category) {
                return Err(config_err(&format!(
                    "duplicate gene-set category {}",
                    category.code()
                )));
            }
        }
        Ok(())
    }
}

fn config_err(msg: &str) -> CoexnetError {
    CoexnetError::Configuration(msg.to_string())
}
