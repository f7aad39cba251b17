//! TSV readers for the expression matrix and the sample annotation table.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use ndarray::Array2;

use crate::error::CoexnetError;
use crate::matrix::{ExpressionMatrix, Group, SampleAnnotation};

/// Expression TSV: a `feature_id` header naming every sample column, then
/// one row per feature. Values are expected on log scale.
pub fn read_expression_matrix(path: &Path) -> Result<ExpressionMatrix, CoexnetError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| CoexnetError::Input(format!("failed to read {}: {e}", path.display())))?;
    parse_expression(&content, &path.display().to_string())
}

fn parse_expression(content: &str, source: &str) -> Result<ExpressionMatrix, CoexnetError> {
    let mut lines = content.lines().enumerate();
    let (header_no, header) = loop {
        match lines.next() {
            Some((idx, line)) => {
                let trimmed = line.trim();
                if trimmed.is_empty() || trimmed.starts_with('#') {
                    continue;
                }
                break (idx + 1, trimmed);
            }
            None => {
                return Err(CoexnetError::Input(format!(
                    "{source} contains no header line"
                )));
            }
        }
    };

    let mut columns = header.split('\t');
    let first = columns.next().unwrap_or("").trim();
    if !first.eq_ignore_ascii_case("feature_id") {
        return Err(CoexnetError::Input(format!(
            "{source}:{header_no} header must start with 'feature_id', found '{first}'"
        )));
    }
    let sample_ids: Vec<String> = columns.map(|c| c.trim().to_string()).collect();
    if sample_ids.is_empty() {
        return Err(CoexnetError::Input(format!(
            "{source}:{header_no} header names no sample columns"
        )));
    }
    let mut seen = HashSet::new();
    for id in &sample_ids {
        if id.is_empty() {
            return Err(CoexnetError::Input(format!(
                "{source}:{header_no} empty sample id in header"
            )));
        }
        if !seen.insert(id.as_str()) {
            return Err(CoexnetError::Input(format!(
                "{source}:{header_no} duplicate sample id '{id}'"
            )));
        }
    }

    let n = sample_ids.len();
    let mut feature_ids = Vec::new();
    let mut values: Vec<f64> = Vec::new();
    for (idx, line) in lines {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = trimmed.split('\t').collect();
        if parts.len() != n + 1 {
            return Err(CoexnetError::Input(format!(
                "{source}:{line_no} malformed TSV (expected {} columns, found {})",
                n + 1,
                parts.len()
            )));
        }
        let id = parts[0].trim();
        if id.is_empty() {
            return Err(CoexnetError::Input(format!(
                "{source}:{line_no} empty feature id"
            )));
        }
        feature_ids.push(id.to_string());
        for raw in &parts[1..] {
            let value: f64 = raw.trim().parse().map_err(|_| {
                CoexnetError::Input(format!(
                    "{source}:{line_no} invalid numeric value '{}'",
                    raw.trim()
                ))
            })?;
            values.push(value);
        }
    }
    if feature_ids.is_empty() {
        return Err(CoexnetError::Input(format!(
            "{source} contains no feature rows"
        )));
    }

    let rows = feature_ids.len();
    let matrix = Array2::from_shape_vec((rows, n), values)
        .map_err(|e| CoexnetError::Input(format!("{source}: {e}")))?;
    ExpressionMatrix::new(feature_ids, sample_ids, matrix)
}

/// Annotation TSV: `sample_id`, `group` (case/control) and an optional
/// tissue column. Rows may appear in any order; the result is reordered to
/// match the matrix columns, and every matrix sample must be covered exactly
/// once.
pub fn read_annotation(
    path: &Path,
    matrix_samples: &[String],
) -> Result<SampleAnnotation, CoexnetError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| CoexnetError::Input(format!("failed to read {}: {e}", path.display())))?;
    parse_annotation(&content, &path.display().to_string(), matrix_samples)
}

fn parse_annotation(
    content: &str,
    source: &str,
    matrix_samples: &[String],
) -> Result<SampleAnnotation, CoexnetError> {
    let mut by_sample: HashMap<String, (Group, String)> = HashMap::new();
    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = trimmed.split('\t').collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(CoexnetError::Input(format!(
                "{source}:{line_no} malformed TSV (expected 2 or 3 columns, found {})",
                parts.len()
            )));
        }
        let sample_id = parts[0].trim();
        let group_str = parts[1].trim();
        if sample_id.eq_ignore_ascii_case("sample_id") {
            continue;
        }
        if sample_id.is_empty() || group_str.is_empty() {
            return Err(CoexnetError::Input(format!(
                "{source}:{line_no} empty field in TSV"
            )));
        }
        let group = Group::parse(group_str).ok_or_else(|| {
            CoexnetError::Input(format!(
                "{source}:{line_no} group must be 'case' or 'control', found '{group_str}'"
            ))
        })?;
        let tissue = parts.get(2).map(|t| t.trim()).unwrap_or("").to_string();
        if by_sample
            .insert(sample_id.to_string(), (group, tissue))
            .is_some()
        {
            return Err(CoexnetError::Input(format!(
                "{source}:{line_no} duplicate annotation for sample '{sample_id}'"
            )));
        }
    }

    let mut groups = Vec::with_capacity(matrix_samples.len());
    let mut tissues = Vec::with_capacity(matrix_samples.len());
    for sample_id in matrix_samples {
        let (group, tissue) = by_sample.remove(sample_id).ok_or_else(|| {
            CoexnetError::Input(format!(
                "{source} has no annotation for matrix sample '{sample_id}'"
            ))
        })?;
        groups.push(group);
        tissues.push(tissue);
    }
    if let Some(extra) = by_sample.keys().next() {
        return Err(CoexnetError::Input(format!(
            "{source} annotates sample '{extra}' which is not a matrix column"
        )));
    }

    Ok(SampleAnnotation {
        sample_ids: matrix_samples.to_vec(),
        groups,
        tissues,
    })
}
