use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use kira_coexnet::cli::{Cli, Commands, GenesetCommand, GenesetShowArgs, RunArgs, ValidateArgs};
use kira_coexnet::config::PipelineParams;
use kira_coexnet::ctx::Ctx;
use kira_coexnet::geneset::GenesetCategory;
use kira_coexnet::geneset::source::{DirGenesetSource, GenesetSource};
use kira_coexnet::io;
use kira_coexnet::matrix::Group;
use kira_coexnet::pipeline::Pipeline;
use kira_coexnet::pipeline::stage1_input::Stage1Input;
use kira_coexnet::pipeline::stage2_detest::Stage2DeTest;
use kira_coexnet::pipeline::stage3_refine::Stage3Refine;
use kira_coexnet::pipeline::stage4_network::Stage4Network;
use kira_coexnet::pipeline::stage5_modtrait::Stage5ModuleTrait;
use kira_coexnet::pipeline::stage6_enrich::Stage6Enrich;
use kira_coexnet::pipeline::stage7_output::Stage7Output;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Geneset(args) => match args.command {
            GenesetCommand::Show(show) => geneset_show(show),
        },
        Commands::Validate(args) => validate(args),
    }
}

fn run(args: RunArgs) -> Result<()> {
    let params = params_from_args(&args)?;
    params.validate()?;

    if params.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(params.threads)
            .build_global()
            .context("failed to size the worker pool")?;
        tracing::info!(threads = params.threads, "worker pool sized");
    }

    let mut ctx = Ctx::new(
        args.matrix,
        args.annotation,
        args.out,
        args.genesets,
        args.symbols,
        params,
        args.json,
        env!("CARGO_PKG_VERSION"),
    );

    let pipeline = Pipeline::new(vec![
        Box::new(Stage1Input::new()),
        Box::new(Stage2DeTest::new()),
        Box::new(Stage3Refine::new()),
        Box::new(Stage4Network::new()),
        Box::new(Stage5ModuleTrait::new()),
        Box::new(Stage6Enrich::new()),
        Box::new(Stage7Output::new()),
    ]);
    pipeline.run(&mut ctx)?;

    print_summary(&ctx)
}

fn params_from_args(args: &RunArgs) -> Result<PipelineParams> {
    let mut categories = Vec::with_capacity(args.category.len());
    for raw in &args.category {
        categories.push(GenesetCategory::parse(raw)?);
    }
    Ok(PipelineParams {
        permutations: args.permutations,
        delta: args.delta,
        s0_percentile: args.s0_percentile,
        trees: args.trees,
        max_depth: args.max_depth,
        top_k: args.top_k,
        seed: args.seed,
        beta: args.beta,
        min_module_size: args.min_module_size,
        merge_cut_height: args.merge_cut_height,
        split_sensitivity: args.split_sensitivity,
        min_set_size: args.min_set_size,
        max_set_size: args.max_set_size,
        enrich_permutations: args.enrich_permutations,
        enrich_alpha: args.enrich_alpha,
        assoc_alpha: args.assoc_alpha,
        edge_threshold: args.edge_threshold,
        max_dense_features: args.max_dense_features,
        threads: args.threads,
        timeout_secs: args.timeout_secs,
        categories,
    })
}

fn print_summary(ctx: &Ctx) -> Result<()> {
    let summary = io::summary::format_summary(ctx)?;
    print!("{}", summary);
    if !ctx.warnings.is_empty() {
        println!("warnings:");
        for warning in &ctx.warnings {
            println!("- {}", warning);
        }
    }
    Ok(())
}

fn validate(args: ValidateArgs) -> Result<()> {
    let mut ctx = Ctx::new(
        args.matrix,
        args.annotation,
        PathBuf::from("."),
        None,
        args.symbols,
        PipelineParams::default(),
        false,
        env!("CARGO_PKG_VERSION"),
    );

    let pipeline = Pipeline::new(vec![Box::new(Stage1Input::new())]);
    pipeline.run(&mut ctx)?;

    print_validate_summary(&ctx);
    Ok(())
}

fn print_validate_summary(ctx: &Ctx) {
    println!("kira-coexnet validate ok");
    if let (Some(matrix), Some(annotation)) = (&ctx.matrix, &ctx.annotation) {
        println!("features: {}", matrix.n_features());
        println!("samples: {}", matrix.n_samples());
        println!("case: {}", annotation.group_indices(Group::Case).len());
        println!("control: {}", annotation.group_indices(Group::Control).len());
    }
    if !ctx.warnings.is_empty() {
        println!("warnings:");
        for warning in &ctx.warnings {
            println!("- {}", warning);
        }
    }
}

fn geneset_show(args: GenesetShowArgs) -> Result<()> {
    let source = DirGenesetSource::new(&args.genesets);
    if let Some(raw) = args.category {
        let category = GenesetCategory::parse(&raw)?;
        let sets = source.fetch(category)?;
        println!("{} ({} sets):", category.code(), sets.len());
        for set in &sets {
            println!("{}\t{}", set.name, set.genes.len());
        }
        return Ok(());
    }

    for category in GenesetCategory::ALL {
        match source.fetch(category) {
            Ok(sets) => println!("{}\t{} sets", category.code(), sets.len()),
            Err(_) => println!("{}\tunavailable", category.code()),
        }
    }
    Ok(())
}
