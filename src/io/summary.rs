use anyhow::{Context, Result};

use crate::ctx::Ctx;
use crate::matrix::Group;

pub fn format_summary(ctx: &Ctx) -> Result<String> {
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

    let cases = annotation.group_indices(Group::Case).len();
    let controls = annotation.group_indices(Group::Control).len();

    let mut out = String::new();
    out.push_str(&format!("kira-coexnet v{}\n", ctx.tool_version));
    out.push_str(&format!(
        "Input: {} features, {} samples ({} case / {} control)\n",
        matrix.n_features(),
        matrix.n_samples(),
        cases,
        controls
    ));
    out.push_str(&format!(
        "Differential: {} up, {} down (s0={:.4}, estimated FDR={:.4})\n",
        de.up.len(),
        de.down.len(),
        de.s0,
        de.fdr()
    ));
    out.push_str(&format!(
        "Refinement: OOB accuracy {:.3}, {} candidates ({} up / {} down)\n",
        ranking.oob_accuracy,
        candidates.len(),
        candidates.up.len(),
        candidates.down.len()
    ));
    out.push_str(&format!(
        "Network: {} features, {} modules, {} unassigned, {} edges exported\n",
        network.n_features(),
        partition.n_modules(),
        partition.unassigned_count(),
        ctx.edges_exported
    ));

    let significant: Vec<String> = associations
        .iter()
        .filter(|a| a.significant)
        .map(|a| format!("{} (r={:+.2})", a.label, a.correlation))
        .collect();
    if significant.is_empty() {
        out.push_str("Module-trait: none significant\n");
    } else {
        out.push_str(&format!("Module-trait: {}\n", significant.join(", ")));
    }

    match &ctx.enrichment {
        Some(run) => {
            out.push_str(&format!(
                "Enrichment: {} significant sets, {} categories skipped\n",
                run.results.len(),
                run.skipped.len()
            ));
        }
        None => out.push_str("Enrichment: not run\n"),
    }

    if !ctx.warnings.is_empty() {
        out.push_str(&format!("Warnings: {}\n", ctx.warnings.len()));
    }

    Ok(out)
}
