use std::path::PathBuf;
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::config::PipelineParams;
use crate::geneset::symbols::TsvSymbolLookup;
use crate::math::forest::{CandidateFeatureSet, ImportanceRanking};
use crate::math::gsea::EnrichmentRun;
use crate::math::sam::DeResult;
use crate::matrix::{ExpressionMatrix, SampleAnnotation};
use crate::network::association::TraitAssociation;
use crate::network::{CoexpressionNetwork, ModulePartition};

#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub out_dir: PathBuf,
    pub de_path: PathBuf,
    pub module_trait_path: PathBuf,
    pub enrichment_path: PathBuf,
    pub edges_path: PathBuf,
    pub nodes_path: PathBuf,
    pub json_path: PathBuf,
}

/// Shared pipeline state. Stages read the artifacts of earlier stages and
/// fill in their own; every slot starts empty.
#[derive(Debug)]
pub struct Ctx {
    pub matrix_path: PathBuf,
    pub annotation_path: PathBuf,
    pub geneset_dir: Option<PathBuf>,
    pub symbols_path: Option<PathBuf>,
    pub params: PipelineParams,
    pub write_json: bool,
    pub tool_version: String,
    pub cancel: CancelToken,
    pub warnings: Vec<String>,

    pub matrix: Option<ExpressionMatrix>,
    pub annotation: Option<SampleAnnotation>,
    pub symbols: Option<TsvSymbolLookup>,
    pub de: Option<DeResult>,
    pub ranking: Option<ImportanceRanking>,
    pub candidates: Option<CandidateFeatureSet>,
    pub network: Option<CoexpressionNetwork>,
    pub partition: Option<ModulePartition>,
    pub associations: Option<Vec<TraitAssociation>>,
    pub enrichment: Option<EnrichmentRun>,
    pub edges_exported: u64,

    pub output: OutputPaths,
}

impl Ctx {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        matrix_path: PathBuf,
        annotation_path: PathBuf,
        out_dir: PathBuf,
        geneset_dir: Option<PathBuf>,
        symbols_path: Option<PathBuf>,
        params: PipelineParams,
        write_json: bool,
        tool_version: &str,
    ) -> Self {
        let cancel = if params.timeout_secs > 0 {
            CancelToken::with_timeout(Duration::from_secs(params.timeout_secs))
        } else {
            CancelToken::new()
        };
        let output = OutputPaths {
            de_path: out_dir.join("de_results.tsv"),
            module_trait_path: out_dir.join("module_trait.tsv"),
            enrichment_path: out_dir.join("enrichment.tsv"),
            edges_path: out_dir.join("network_edges.tsv"),
            nodes_path: out_dir.join("network_nodes.tsv"),
            json_path: out_dir.join("coexnet.json"),
            out_dir,
        };
        Self {
            matrix_path,
            annotation_path,
            geneset_dir,
            symbols_path,
            params,
            write_json,
            tool_version: tool_version.to_string(),
            cancel,
            warnings: Vec::new(),
            matrix: None,
            annotation: None,
            symbols: None,
            de: None,
            ranking: None,
            candidates: None,
            network: None,
            partition: None,
            associations: None,
            enrichment: None,
            edges_exported: 0,
            output,
        }
    }

    /// Feature symbol for reporting; falls back to the feature id itself.
    pub fn display_symbol<'a>(&'a self, feature_id: &'a str) -> &'a str {
        use crate::geneset::symbols::SymbolLookup;
        self.symbols
            .as_ref()
            .and_then(|s| s.symbol(feature_id))
            .unwrap_or(feature_id)
    }
}
