use std::path::Path;

use anyhow::{Context, Result};

use crate::ctx::Ctx;
use crate::matrix::Group;
use crate::schema::v1::{
    CoexnetV1, DifferentialSummary, EnrichmentEntry, EnrichmentSummary, InputMeta,
    ModuleSummary, ModuleTraitEntry, NetworkSummary, RefinementSummary, SkippedCategory,
};

pub fn build_report(ctx: &Ctx) -> Result<CoexnetV1> {
    let matrix = ctx.matrix.as_ref().context("expression matrix missing")?;
    let annotation = ctx.annotation.as_ref().context("sample annotation missing")?;
    let de = ctx.de.as_ref().context("differential results missing")?;
    let ranking = ctx.ranking.as_ref().context("importance ranking missing")?;
    let candidates = ctx.candidates.as_ref().context("candidate set missing")?;
    let network = ctx.network.as_ref().context("network missing")?;
    let partition = ctx.partition.as_ref().context("module partition missing")?;
    let associations = ctx
        .associations
        .as_ref()
        .context("module-trait associations missing")?;

    let input_meta = InputMeta {
        features: matrix.n_features() as u64,
        samples: matrix.n_samples() as u64,
        cases: annotation.group_indices(Group::Case).len() as u64,
        controls: annotation.group_indices(Group::Control).len() as u64,
    };

    let differential = DifferentialSummary {
        permutations: ctx.params.permutations as u64,
        delta: de.delta,
        s0: de.s0,
        up: de.up.len() as u64,
        down: de.down.len() as u64,
        estimated_fdr: de.fdr(),
    };

    let refinement = RefinementSummary {
        trees: ctx.params.trees as u64,
        oob_accuracy: ranking.oob_accuracy,
        top_k: ctx.params.top_k as u64,
        candidates_up: candidates.up.len() as u64,
        candidates_down: candidates.down.len() as u64,
    };

    let modules = partition
        .labels
        .iter()
        .enumerate()
        .map(|(m, label)| ModuleSummary {
            label: label.clone(),
            size: partition.module_size(m) as u64,
        })
        .collect();
    let network_summary = NetworkSummary {
        features: network.n_features() as u64,
        beta: ctx.params.beta,
        modules,
        unassigned: partition.unassigned_count() as u64,
        edges_exported: ctx.edges_exported,
    };

    let module_traits = associations
        .iter()
        .map(|a| ModuleTraitEntry {
            module: a.label.clone(),
            size: a.size as u64,
            correlation: a.correlation,
            p_value: a.p_value,
            significant: a.significant,
        })
        .collect();

    let enrichment = match &ctx.enrichment {
        Some(run) => EnrichmentSummary {
            results: run
                .results
                .iter()
                .map(|r| EnrichmentEntry {
                    category: r.category.code().to_string(),
                    gene_set: r.name.clone(),
                    size: r.size as u64,
                    es: r.es,
                    nes: r.nes,
                    p_value: r.p_value,
                    adj_p_value: r.adj_p_value,
                })
                .collect(),
            skipped: run
                .skipped
                .iter()
                .map(|(category, reason)| SkippedCategory {
                    category: category.clone(),
                    reason: reason.clone(),
                })
                .collect(),
        },
        None => EnrichmentSummary {
            results: Vec::new(),
            skipped: Vec::new(),
        },
    };

    Ok(CoexnetV1 {
        tool: "kira-coexnet".to_string(),
        version: ctx.tool_version.clone(),
        schema_version: "v1".to_string(),
        input_meta,
        differential,
        refinement,
        network: network_summary,
        module_traits,
        enrichment,
        warnings: ctx.warnings.clone(),
    })
}

pub fn write_json(path: &Path, ctx: &Ctx) -> Result<()> {
    let report = build_report(ctx)?;
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let writer = std::io::BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &report)?;
    Ok(())
}
