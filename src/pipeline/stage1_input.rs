use anyhow::{Context, Result};
use tracing::info;

use crate::ctx::Ctx;
use crate::geneset::symbols::TsvSymbolLookup;
use crate::io::matrix_reader;
use crate::pipeline::Stage;

pub struct Stage1Input;

impl Stage1Input {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage1Input {
    fn name(&self) -> &'static str {
        "stage1_input"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let matrix = matrix_reader::read_expression_matrix(&ctx.matrix_path)?;
        let annotation = matrix_reader::read_annotation(&ctx.annotation_path, &matrix.sample_ids)?;
        annotation.validate_against(&matrix)?;

        info!(
            features = matrix.n_features(),
            samples = matrix.n_samples(),
            "expression matrix loaded"
        );

        if let Some(path) = &ctx.symbols_path {
            let lookup = TsvSymbolLookup::load(path)
                .with_context(|| format!("failed to load symbol map {}", path.display()))?;
            info!(symbols = lookup.len(), "symbol map loaded");
            ctx.symbols = Some(lookup);
        }

        ctx.matrix = Some(matrix);
        ctx.annotation = Some(annotation);
        Ok(())
    }
}
