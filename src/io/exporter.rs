//! Edge and node lists for external network tools.

use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::ctx::Ctx;

/// Upper-triangle TOM entries at or above the export threshold, one edge per
/// line. Returns the number of edges written.
pub fn write_edges(path: &Path, ctx: &Ctx) -> Result<u64> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut w = BufWriter::new(file);

    let network = ctx.network.as_ref().context("network missing")?;
    let threshold = ctx.params.edge_threshold;

    writeln!(w, "source\ttarget\tweight")?;
    let mut written = 0u64;
    let n = network.n_features();
    for i in 0..n {
        for j in (i + 1)..n {
            let weight = network.tom[(i, j)];
            if weight >= threshold {
                writeln!(
                    w,
                    "{}\t{}\t{:.6}",
                    network.feature_ids[i], network.feature_ids[j], weight
                )?;
                written += 1;
            }
        }
    }
    Ok(written)
}

/// One row per network feature with its symbol and module label.
pub fn write_nodes(path: &Path, ctx: &Ctx) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut w = BufWriter::new(file);

    let network = ctx.network.as_ref().context("network missing")?;
    let partition = ctx.partition.as_ref().context("module partition missing")?;

    writeln!(w, "feature_id\tsymbol\tmodule")?;
    for (i, id) in network.feature_ids.iter().enumerate() {
        writeln!(
            w,
            "{}\t{}\t{}",
            id,
            ctx.display_symbol(id),
            partition.label_for(i)
        )?;
    }
    Ok(())
}
