use anyhow::{Context, Result};
use tracing::info;

use crate::ctx::Ctx;
use crate::io::{exporter, json_writer, tables};
use crate::pipeline::Stage;

pub struct Stage7Output;

impl Stage7Output {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage7Output {
    fn name(&self) -> &'static str {
        "stage7_output"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        std::fs::create_dir_all(&ctx.output.out_dir).with_context(|| {
            format!(
                "failed to create output dir {}",
                ctx.output.out_dir.display()
            )
        })?;

        tables::write_de_results(&ctx.output.de_path, ctx)?;
        tables::write_module_trait(&ctx.output.module_trait_path, ctx)?;
        if ctx.enrichment.is_some() {
            tables::write_enrichment(&ctx.output.enrichment_path, ctx)?;
        }
        let edges = exporter::write_edges(&ctx.output.edges_path, ctx)?;
        ctx.edges_exported = edges;
        exporter::write_nodes(&ctx.output.nodes_path, ctx)?;

        if ctx.write_json {
            json_writer::write_json(&ctx.output.json_path, ctx)?;
        }

        info!(
            out_dir = %ctx.output.out_dir.display(),
            edges,
            json = ctx.write_json,
            "outputs written"
        );
        Ok(())
    }
}
