use anyhow::{Context, Result};
use tracing::info;

use crate::ctx::Ctx;
use crate::matrix::Group;
use crate::math::forest::{self, CandidateFeatureSet, ForestParams, ImportanceRanking};
use crate::pipeline::Stage;

pub struct Stage3Refine;

impl Stage3Refine {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage3Refine {
    fn name(&self) -> &'static str {
        "stage3_refine"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let matrix = ctx.matrix.as_ref().context("expression matrix missing")?;
        let annotation = ctx
            .annotation
            .as_ref()
            .context("sample annotation missing")?;
        let de = ctx.de.as_ref().context("differential results missing")?;
        annotation.validate_against(matrix)?;

        // Samples in rows for the ensemble.
        let x = matrix.values.t();
        let y: Vec<u8> = annotation
            .groups
            .iter()
            .map(|g| (*g == Group::Case) as u8)
            .collect();

        let params = ForestParams {
            trees: ctx.params.trees,
            max_depth: ctx.params.max_depth,
            seed: ctx.params.seed,
        };
        let forest = forest::train(&x, &y, &params, &ctx.cancel)?;
        let ranking = ImportanceRanking::new(&forest);
        let candidates = CandidateFeatureSet::from_ranking(&ranking, ctx.params.top_k, de);

        info!(
            oob_accuracy = ranking.oob_accuracy,
            candidates = candidates.len(),
            up = candidates.up.len(),
            down = candidates.down.len(),
            "importance refinement finished"
        );
        ctx.ranking = Some(ranking);
        ctx.candidates = Some(candidates);
        Ok(())
    }
}
