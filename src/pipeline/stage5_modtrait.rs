use anyhow::{Context, Result};
use tracing::info;

use crate::ctx::Ctx;
use crate::network::association;
use crate::pipeline::Stage;

pub struct Stage5ModuleTrait;

impl Stage5ModuleTrait {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage5ModuleTrait {
    fn name(&self) -> &'static str {
        "stage5_modtrait"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let matrix = ctx.matrix.as_ref().context("expression matrix missing")?;
        let annotation = ctx
            .annotation
            .as_ref()
            .context("sample annotation missing")?;
        let partition = ctx.partition.as_ref().context("module partition missing")?;
        annotation.validate_against(matrix)?;

        let phenotype = annotation.phenotype();
        let associations = association::associate(partition, &phenotype, ctx.params.assoc_alpha)?;

        let significant = associations.iter().filter(|a| a.significant).count();
        info!(
            modules = associations.len(),
            significant, "module-trait association finished"
        );
        ctx.associations = Some(associations);
        Ok(())
    }
}
