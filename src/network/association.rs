//! Module-trait association: eigengene versus phenotype correlation with a
//! Student-t significance test.

use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::error::CoexnetError;
use crate::math::pearson;
use crate::network::ModulePartition;

#[derive(Debug, Clone)]
pub struct TraitAssociation {
    pub label: String,
    pub size: usize,
    pub correlation: f64,
    pub p_value: f64,
    pub significant: bool,
}

/// Correlates each module eigengene with the sample phenotype. Unassigned
/// features have no eigengene and are never tested.
pub fn associate(
    partition: &ModulePartition,
    phenotype: &[f64],
    alpha: f64,
) -> Result<Vec<TraitAssociation>, CoexnetError> {
    let n = phenotype.len();
    if n < 3 {
        return Err(CoexnetError::Input(format!(
            "module-trait association needs at least 3 samples, found {n}"
        )));
    }
    let mut associations = Vec::with_capacity(partition.labels.len());
    for (module, label) in partition.labels.iter().enumerate() {
        let eigengene = &partition.eigengenes[module];
        if eigengene.len() != n {
            return Err(CoexnetError::Numerical(format!(
                "eigengene for {label} has {} values, expected {n}",
                eigengene.len()
            )));
        }
        let r = pearson(&eigengene.to_vec(), phenotype);
        if !r.is_finite() {
            return Err(CoexnetError::Numerical(format!(
                "correlation between {label} and the trait is undefined"
            )));
        }
        let p = correlation_p_value(r, n)?;
        associations.push(TraitAssociation {
            label: label.clone(),
            size: partition.module_size(module),
            correlation: r,
            p_value: p,
            significant: p < alpha,
        });
    }
    Ok(associations)
}

/// Two-sided p for a correlation over n samples: t = r sqrt((n-2)/(1-r^2))
/// on n-2 degrees of freedom. A correlation of magnitude 1 has no finite
/// statistic and maps to p = 0.
fn correlation_p_value(r: f64, n: usize) -> Result<f64, CoexnetError> {
    let df = (n - 2) as f64;
    let denom = 1.0 - r * r;
    if denom <= f64::EPSILON {
        return Ok(0.0);
    }
    let t = r * (df / denom).sqrt();
    let dist = StudentsT::new(0.0, 1.0, df).map_err(|e| {
        CoexnetError::Numerical(format!("t-distribution with {df} degrees of freedom: {e}"))
    })?;
    Ok((2.0 * (1.0 - dist.cdf(t.abs()))).min(1.0))
}
