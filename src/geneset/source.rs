use std::path::{Path, PathBuf};

use crate::error::CoexnetError;
use crate::geneset::{GeneSet, GenesetCategory};

/// External provider of gene sets for one category pair. Failures are
/// isolated by the enrichment stage, never fatal to the run.
pub trait GenesetSource: Sync {
    fn fetch(&self, category: GenesetCategory) -> Result<Vec<GeneSet>, CoexnetError>;
}

/// Reads one GMT file per category (`h.gmt`, `c2.cp.kegg.gmt`, ...) from a
/// local directory.
#[derive(Debug, Clone)]
pub struct DirGenesetSource {
    root: PathBuf,
}

impl DirGenesetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, category: GenesetCategory) -> PathBuf {
        let stem = category.code().to_ascii_lowercase().replace(':', ".");
        self.root.join(format!("{}.gmt", stem))
    }
}

impl GenesetSource for DirGenesetSource {
    fn fetch(&self, category: GenesetCategory) -> Result<Vec<GeneSet>, CoexnetError> {
        let path = self.path_for(category);
        let content =
            std::fs::read_to_string(&path).map_err(|e| CoexnetError::ExternalLookup {
                category: category.code().to_string(),
                reason: format!("{}: {}", path.display(), e),
            })?;
        parse_gmt(&content, &path.display().to_string(), category)
    }
}

/// GMT: one set per line, `name<TAB>description<TAB>gene...`.
pub fn parse_gmt(
    content: &str,
    source: &str,
    category: GenesetCategory,
) -> Result<Vec<GeneSet>, CoexnetError> {
    let mut sets = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut parts = trimmed.split('\t');
        let name = parts.next().unwrap_or_default().trim();
        let description = parts.next();
        if name.is_empty() || description.is_none() {
            return Err(CoexnetError::ExternalLookup {
                category: category.code().to_string(),
                reason: format!(
                    "{}:{} malformed GMT line (expected name, description, genes)",
                    source, line_no
                ),
            });
        }
        let genes: Vec<String> = parts
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .collect();
        if genes.is_empty() {
            return Err(CoexnetError::ExternalLookup {
                category: category.code().to_string(),
                reason: format!("{}:{} gene set '{}' has no members", source, line_no, name),
            });
        }
        sets.push(GeneSet {
            name: name.to_string(),
            genes,
            category,
        });
    }
    Ok(sets)
}

/// Convenience used by `geneset show`: which categories have a file present.
pub fn available_categories(root: &Path) -> Vec<GenesetCategory> {
    let source = DirGenesetSource::new(root);
    GenesetCategory::ALL
        .into_iter()
        .filter(|category| source.path_for(*category).is_file())
        .collect()
}
