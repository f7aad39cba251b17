use anyhow::{Context, Result};
use tracing::info;

use crate::ctx::Ctx;
use crate::geneset::source::DirGenesetSource;
use crate::math::gsea::{self, GseaParams, RankedList};
use crate::pipeline::Stage;

pub struct Stage6Enrich;

impl Stage6Enrich {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage6Enrich {
    fn name(&self) -> &'static str {
        "stage6_enrich"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let Some(dir) = ctx.geneset_dir.clone() else {
            info!("no gene-set directory configured; enrichment skipped");
            return Ok(());
        };
        if ctx.params.categories.is_empty() {
            info!("no gene-set categories requested; enrichment skipped");
            return Ok(());
        }
        let matrix = ctx.matrix.as_ref().context("expression matrix missing")?;
        let de = ctx.de.as_ref().context("differential results missing")?;

        // Called features ranked by their observed statistic, under the
        // symbols gene sets are written in.
        let mut entries = Vec::with_capacity(de.significant_count());
        for &feature in de.up.iter().chain(&de.down) {
            let id = &matrix.feature_ids[feature];
            entries.push((ctx.display_symbol(id).to_string(), de.statistic[feature]));
        }
        let ranked = RankedList::new(entries);

        let source = DirGenesetSource::new(dir);
        let params = GseaParams {
            permutations: ctx.params.enrich_permutations,
            weight: 1.0,
            min_size: ctx.params.min_set_size,
            max_size: ctx.params.max_set_size,
            alpha: ctx.params.enrich_alpha,
            seed: ctx.params.seed,
        };
        let run = gsea::run_categories(
            &source,
            &ctx.params.categories,
            &ranked,
            &params,
            &ctx.cancel,
        )?;

        for (category, reason) in &run.skipped {
            ctx.warnings
                .push(format!("enrichment skipped for {category}: {reason}"));
        }
        info!(
            ranked = ranked.len(),
            significant_sets = run.results.len(),
            skipped = run.skipped.len(),
            "enrichment finished"
        );
        ctx.enrichment = Some(run);
        Ok(())
    }
}
