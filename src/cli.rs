use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "kira-coexnet", version, about = "Co-expression network analysis CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Run(RunArgs),
    Geneset(GenesetArgs),
    Validate(ValidateArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[arg(long, help = "Expression matrix TSV (features x samples, log scale)")]
    pub matrix: PathBuf,

    #[arg(long, help = "Sample annotation TSV (sample_id, group, tissue)")]
    pub annotation: PathBuf,

    #[arg(long)]
    pub out: PathBuf,

    #[arg(long, help = "Directory holding one GMT file per category")]
    pub genesets: Option<PathBuf>,

    #[arg(long, num_args = 1.., help = "Gene-set categories to test (e.g. H C2:CP:KEGG)")]
    pub category: Vec<String>,

    #[arg(long, help = "Probe-to-symbol TSV map")]
    pub symbols: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[arg(
        long,
        default_value_t = 1000,
        help = "Label permutations for the differential test"
    )]
    pub permutations: usize,

    #[arg(
        long,
        default_value_t = 1.0,
        help = "Call threshold on the observed-expected gap"
    )]
    pub delta: f64,

    #[arg(
        long,
        default_value_t = 5.0,
        help = "Percentile of pooled errors used as the fudge constant"
    )]
    pub s0_percentile: f64,

    #[arg(long, default_value_t = 500)]
    pub trees: usize,

    #[arg(long, default_value_t = 12)]
    pub max_depth: usize,

    #[arg(
        long,
        default_value_t = 500,
        help = "Importance rank cutoff for candidate features"
    )]
    pub top_k: usize,

    #[arg(
        long,
        default_value_t = 12.0,
        help = "Soft-threshold power for the signed network"
    )]
    pub beta: f64,

    #[arg(long, default_value_t = 10)]
    pub min_module_size: usize,

    #[arg(long, default_value_t = 0.25)]
    pub merge_cut_height: f64,

    #[arg(
        long,
        default_value_t = 0.15,
        help = "Height gap required to split a dendrogram branch"
    )]
    pub split_sensitivity: f64,

    #[arg(long, default_value_t = 5)]
    pub min_set_size: usize,

    #[arg(long, default_value_t = 500)]
    pub max_set_size: usize,

    #[arg(
        long,
        default_value_t = 1000,
        help = "Gene permutations per enrichment set"
    )]
    pub enrich_permutations: usize,

    #[arg(long, default_value_t = 0.05)]
    pub enrich_alpha: f64,

    #[arg(long, default_value_t = 0.05)]
    pub assoc_alpha: f64,

    #[arg(
        long,
        default_value_t = 0.05,
        help = "Minimum TOM weight for exported edges"
    )]
    pub edge_threshold: f64,

    #[arg(
        long,
        default_value_t = 2000,
        help = "Dense network ceiling (features)"
    )]
    pub max_dense_features: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[arg(long, default_value_t = 0, help = "Number of threads (0 = auto)")]
    pub threads: usize,

    #[arg(long, default_value_t = 0, help = "Wall-clock limit in seconds (0 = none)")]
    pub timeout_secs: u64,
}

#[derive(Debug, Args)]
pub struct GenesetArgs {
    #[command(subcommand)]
    pub command: GenesetCommand,
}

#[derive(Debug, Subcommand)]
pub enum GenesetCommand {
    Show(GenesetShowArgs),
}

#[derive(Debug, Args)]
pub struct GenesetShowArgs {
    #[arg(long, help = "Directory holding one GMT file per category")]
    pub genesets: PathBuf,

    #[arg(long, help = "Show the sets of one category instead of the overview")]
    pub category: Option<String>,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    #[arg(long, help = "Expression matrix TSV")]
    pub matrix: PathBuf,

    #[arg(long, help = "Sample annotation TSV")]
    pub annotation: PathBuf,

    #[arg(long, help = "Probe-to-symbol TSV map")]
    pub symbols: Option<PathBuf>,
}
