pub mod source;
pub mod symbols;

use crate::error::CoexnetError;

/// Closed set of valid category/subcategory pairs. Unknown combinations are
/// rejected while the configuration is parsed, not deep inside the
/// enrichment loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenesetCategory {
    Hallmark,
    CuratedPerturbations,
    CuratedKegg,
    CuratedReactome,
    GoBiologicalProcess,
    GoCellularComponent,
    GoMolecularFunction,
}

const CATEGORY_TABLE: &[(&str, GenesetCategory)] = &[
    ("H", GenesetCategory::Hallmark),
    ("C2:CGP", GenesetCategory::CuratedPerturbations),
    ("C2:CP:KEGG", GenesetCategory::CuratedKegg),
    ("C2:CP:REACTOME", GenesetCategory::CuratedReactome),
    ("C5:GO:BP", GenesetCategory::GoBiologicalProcess),
    ("C5:GO:CC", GenesetCategory::GoCellularComponent),
    ("C5:GO:MF", GenesetCategory::GoMolecularFunction),
];

impl GenesetCategory {
    pub const ALL: [GenesetCategory; 7] = [
        GenesetCategory::Hallmark,
        GenesetCategory::CuratedPerturbations,
        GenesetCategory::CuratedKegg,
        GenesetCategory::CuratedReactome,
        GenesetCategory::GoBiologicalProcess,
        GenesetCategory::GoCellularComponent,
        GenesetCategory::GoMolecularFunction,
    ];

    pub fn parse(code: &str) -> Result<Self, CoexnetError> {
        let wanted = code.trim().to_ascii_uppercase();
        for (known, category) in CATEGORY_TABLE {
            if *known == wanted {
                return Ok(*category);
            }
        }
        let valid: Vec<&str> = CATEGORY_TABLE.iter().map(|(code, _)| *code).collect();
        Err(CoexnetError::Configuration(format!(
            "unknown gene-set category '{}' (valid: {})",
            code,
            valid.join(", ")
        )))
    }

    pub fn code(&self) -> &'static str {
        match self {
            GenesetCategory::Hallmark => "H",
            GenesetCategory::CuratedPerturbations => "C2:CGP",
            GenesetCategory::CuratedKegg => "C2:CP:KEGG",
            GenesetCategory::CuratedReactome => "C2:CP:REACTOME",
            GenesetCategory::GoBiologicalProcess => "C5:GO:BP",
            GenesetCategory::GoCellularComponent => "C5:GO:CC",
            GenesetCategory::GoMolecularFunction => "C5:GO:MF",
        }
    }
}

/// Named collection of member symbols tagged with its source category.
#[derive(Debug, Clone)]
pub struct GeneSet {
    pub name: String,
    pub genes: Vec<String>,
    pub category: GenesetCategory,
}
