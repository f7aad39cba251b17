//! TSV result tables.

use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::ctx::Ctx;

/// Per-feature differential table covering every input feature.
pub fn write_de_results(path: &Path, ctx: &Ctx) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut w = BufWriter::new(file);

    let matrix = ctx.matrix.as_ref().context("expression matrix missing")?;
    let de = ctx.de.as_ref().context("differential results missing")?;
    let n = matrix.n_features();
    ensure_len(de.statistic.len(), n, "statistic")?;
    ensure_len(de.expected.len(), n, "expected")?;
    ensure_len(de.call.len(), n, "call")?;

    writeln!(w, "feature_id\tsymbol\tstatistic\texpected\tcall")?;
    for (i, id) in matrix.feature_ids.iter().enumerate() {
        writeln!(
            w,
            "{}\t{}\t{:.6}\t{:.6}\t{}",
            id,
            ctx.display_symbol(id),
            de.statistic[i],
            de.expected[i],
            de.call[i].map_or("none", |d| d.as_str())
        )?;
    }
    Ok(())
}

/// One row per module with its trait correlation and significance.
pub fn write_module_trait(path: &Path, ctx: &Ctx) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut w = BufWriter::new(file);

    let associations = ctx
        .associations
        .as_ref()
        .context("module-trait associations missing")?;

    writeln!(w, "module\tsize\tcorrelation\tp_value\tsignificant")?;
    for a in associations {
        writeln!(
            w,
            "{}\t{}\t{:.6}\t{:.3e}\t{}",
            a.label, a.size, a.correlation, a.p_value, a.significant
        )?;
    }
    Ok(())
}

/// Significant gene sets across every category that ran.
pub fn write_enrichment(path: &Path, ctx: &Ctx) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut w = BufWriter::new(file);

    let enrichment = ctx.enrichment.as_ref().context("enrichment missing")?;

    writeln!(w, "category\tgene_set\tsize\tes\tnes\tp_value\tadj_p_value")?;
    for r in &enrichment.results {
        writeln!(
            w,
            "{}\t{}\t{}\t{:.6}\t{:.6}\t{:.3e}\t{:.3e}",
            r.category.code(),
            r.name,
            r.size,
            r.es,
            r.nes,
            r.p_value,
            r.adj_p_value
        )?;
    }
    Ok(())
}

fn ensure_len(got: usize, expected: usize, name: &str) -> Result<()> {
    if got != expected {
        bail!("{} length mismatch: {} != {}", name, got, expected);
    }
    Ok(())
}
