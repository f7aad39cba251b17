use std::collections::HashMap;

use ndarray::{Array2, ArrayView1};

use crate::error::CoexnetError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    Case,
    Control,
}

impl Group {
    pub fn parse(s: &str) -> Option<Group> {
        match s.to_ascii_lowercase().as_str() {
            "case" => Some(Group::Case),
            "control" => Some(Group::Control),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Group::Case => "case",
            Group::Control => "control",
        }
    }
}

/// Per-sample group and tissue tags, ordered to match the matrix columns.
#[derive(Debug, Clone)]
pub struct SampleAnnotation {
    pub sample_ids: Vec<String>,
    pub groups: Vec<Group>,
    pub tissues: Vec<String>,
}

impl SampleAnnotation {
    pub fn group_indices(&self, group: Group) -> Vec<usize> {
        self.groups
            .iter()
            .enumerate()
            .filter(|(_, g)| **g == group)
            .map(|(i, _)| i)
            .collect()
    }

    /// Phenotype vector for correlation: case = 1, control = 0.
    pub fn phenotype(&self) -> Vec<f64> {
        self.groups
            .iter()
            .map(|g| match g {
                Group::Case => 1.0,
                Group::Control => 0.0,
            })
            .collect()
    }

    /// Checked at every stage boundary: the annotation must describe exactly
    /// the matrix columns, in order, with at least 2 samples per group.
    pub fn validate_against(&self, matrix: &ExpressionMatrix) -> Result<(), CoexnetError> {
        if self.sample_ids.len() != matrix.n_samples() {
            return Err(CoexnetError::Input(format!(
                "annotation covers {} samples but the matrix has {} columns",
                self.sample_ids.len(),
                matrix.n_samples()
            )));
        }
        for (i, (a, b)) in self
            .sample_ids
            .iter()
            .zip(matrix.sample_ids.iter())
            .enumerate()
        {
            if a != b {
                return Err(CoexnetError::Input(format!(
                    "annotation order diverges from matrix columns at position {} ('{}' vs '{}')",
                    i + 1,
                    a,
                    b
                )));
            }
        }
        let cases = self.group_indices(Group::Case).len();
        let controls = self.group_indices(Group::Control).len();
        if cases < 2 || controls < 2 {
            return Err(CoexnetError::Input(format!(
                "each group needs at least 2 samples (case: {}, control: {})",
                cases, controls
            )));
        }
        Ok(())
    }
}

/// Log-scale expression values, features in rows and samples in columns.
#[derive(Debug, Clone)]
pub struct ExpressionMatrix {
    pub feature_ids: Vec<String>,
    pub sample_ids: Vec<String>,
    pub values: Array2<f64>,
    pub feature_index: HashMap<String, usize>,
}

impl ExpressionMatrix {
    /// Rejects dimension mismatches, duplicate feature ids and non-finite
    /// values; upstream acquisition is expected to have cleaned all three.
    pub fn new(
        feature_ids: Vec<String>,
        sample_ids: Vec<String>,
        values: Array2<f64>,
    ) -> Result<Self, CoexnetError> {
        if values.nrows() != feature_ids.len() {
            return Err(CoexnetError::Input(format!(
                "matrix has {} rows but {} feature ids",
                values.nrows(),
                feature_ids.len()
            )));
        }
        if values.ncols() != sample_ids.len() {
            return Err(CoexnetError::Input(format!(
                "matrix has {} columns but {} sample ids",
                values.ncols(),
                sample_ids.len()
            )));
        }
        let mut feature_index = HashMap::with_capacity(feature_ids.len());
        for (i, id) in feature_ids.iter().enumerate() {
            if let Some(first) = feature_index.insert(id.clone(), i) {
                return Err(CoexnetError::Input(format!(
                    "duplicate feature id '{}' (rows {} and {})",
                    id,
                    first + 1,
                    i + 1
                )));
            }
        }
        if let Some(((row, col), value)) = values
            .indexed_iter()
            .find(|(_, v)| !v.is_finite())
            .map(|(pos, v)| (pos, *v))
        {
            return Err(CoexnetError::Input(format!(
                "non-finite value {} at feature '{}', sample '{}'",
                value, feature_ids[row], sample_ids[col]
            )));
        }
        Ok(Self {
            feature_ids,
            sample_ids,
            values,
            feature_index,
        })
    }

    pub fn n_features(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_samples(&self) -> usize {
        self.values.ncols()
    }

    pub fn feature_row(&self, feature: usize) -> ArrayView1<'_, f64> {
        self.values.row(feature)
    }

    /// Submatrix over the given feature rows, preserving their order.
    pub fn restrict(&self, rows: &[usize]) -> Array2<f64> {
        let mut out = Array2::zeros((rows.len(), self.n_samples()));
        for (r, &feature) in rows.iter().enumerate() {
            out.row_mut(r).assign(&self.values.row(feature));
        }
        out
    }
}
