use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::ctx::Ctx;
use crate::error::CoexnetError;
use crate::network::adjacency::{signed_adjacency, zero_variance_rows};
use crate::network::modules::{ModuleParams, detect_modules};
use crate::network::tom::topological_overlap;
use crate::network::CoexpressionNetwork;
use crate::pipeline::Stage;

pub struct Stage4Network;

impl Stage4Network {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage4Network {
    fn name(&self) -> &'static str {
        "stage4_network"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let matrix = ctx.matrix.as_ref().context("expression matrix missing")?;
        let candidates = ctx.candidates.as_ref().context("candidate set missing")?;

        let mut feature_indices = candidates.all();
        feature_indices.sort_unstable();

        // Constant rows carry no correlation signal; drop them up front.
        let sub = matrix.restrict(&feature_indices);
        let degenerate = zero_variance_rows(&sub);
        if !degenerate.is_empty() {
            for &row in &degenerate {
                let id = &matrix.feature_ids[feature_indices[row]];
                warn!(feature = %id, "zero-variance candidate excluded from network");
                ctx.warnings
                    .push(format!("zero-variance candidate '{id}' excluded from network"));
            }
            let drop: std::collections::HashSet<usize> = degenerate.into_iter().collect();
            feature_indices = feature_indices
                .iter()
                .enumerate()
                .filter(|(row, _)| !drop.contains(row))
                .map(|(_, &feature)| feature)
                .collect();
        }

        if feature_indices.len() < 2 {
            bail!(
                "network construction needs at least 2 candidate features, found {}",
                feature_indices.len()
            );
        }
        if feature_indices.len() > ctx.params.max_dense_features {
            return Err(CoexnetError::Resource(format!(
                "{} candidate features exceed the dense network ceiling of {}",
                feature_indices.len(),
                ctx.params.max_dense_features
            ))
            .into());
        }

        let expression = matrix.restrict(&feature_indices);
        let adjacency = signed_adjacency(&expression, ctx.params.beta)?;
        let tom = topological_overlap(&adjacency, &ctx.cancel)?;

        let (partition, notes) = detect_modules(
            &expression,
            &tom,
            &ModuleParams {
                min_module_size: ctx.params.min_module_size,
                split_sensitivity: ctx.params.split_sensitivity,
                merge_cut_height: ctx.params.merge_cut_height,
            },
            &ctx.cancel,
        )?;
        ctx.warnings.extend(notes);

        info!(
            features = feature_indices.len(),
            modules = partition.n_modules(),
            unassigned = partition.unassigned_count(),
            "network construction finished"
        );

        let feature_ids = feature_indices
            .iter()
            .map(|&f| matrix.feature_ids[f].clone())
            .collect();
        ctx.network = Some(CoexpressionNetwork {
            feature_indices,
            feature_ids,
            adjacency,
            tom,
        });
        ctx.partition = Some(partition);
        Ok(())
    }
}
