use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputMeta {
    pub features: u64,
    pub samples: u64,
    pub cases: u64,
    pub controls: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifferentialSummary {
    pub permutations: u64,
    pub delta: f64,
    pub s0: f64,
    pub up: u64,
    pub down: u64,
    pub estimated_fdr: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinementSummary {
    pub trees: u64,
    pub oob_accuracy: f64,
    pub top_k: u64,
    pub candidates_up: u64,
    pub candidates_down: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleSummary {
    pub label: String,
    pub size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSummary {
    pub features: u64,
    pub beta: f64,
    pub modules: Vec<ModuleSummary>,
    pub unassigned: u64,
    pub edges_exported: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleTraitEntry {
    pub module: String,
    pub size: u64,
    pub correlation: f64,
    pub p_value: f64,
    pub significant: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentEntry {
    pub category: String,
    pub gene_set: String,
    pub size: u64,
    pub es: f64,
    pub nes: f64,
    pub p_value: f64,
    pub adj_p_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedCategory {
    pub category: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentSummary {
    pub results: Vec<EnrichmentEntry>,
    pub skipped: Vec<SkippedCategory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoexnetV1 {
    pub tool: String,
    pub version: String,
    pub schema_version: String,
    pub input_meta: InputMeta,
    pub differential: DifferentialSummary,
    pub refinement: RefinementSummary,
    pub network: NetworkSummary,
    pub module_traits: Vec<ModuleTraitEntry>,
    pub enrichment: EnrichmentSummary,
    pub warnings: Vec<String>,
}
