use anyhow::{Context, Result};
use tracing::info;

use crate::ctx::Ctx;
use crate::math::sam::{self, SamParams};
use crate::pipeline::Stage;

pub struct Stage2DeTest;

impl Stage2DeTest {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage2DeTest {
    fn name(&self) -> &'static str {
        "stage2_detest"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let matrix = ctx.matrix.as_ref().context("expression matrix missing")?;
        let annotation = ctx
            .annotation
            .as_ref()
            .context("sample annotation missing")?;

        let params = SamParams {
            permutations: ctx.params.permutations,
            delta: ctx.params.delta,
            s0_percentile: ctx.params.s0_percentile,
            seed: ctx.params.seed,
        };
        let de = sam::test(matrix, annotation, &params, &ctx.cancel)?;

        info!(
            up = de.up.len(),
            down = de.down.len(),
            s0 = de.s0,
            estimated_fdr = de.fdr(),
            "differential test finished"
        );
        ctx.de = Some(de);
        Ok(())
    }
}
