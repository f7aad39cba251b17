use std::fs;

use kira_coexnet::error::CoexnetError;
use kira_coexnet::geneset::source::{
    DirGenesetSource, GenesetSource, available_categories, parse_gmt,
};
use kira_coexnet::geneset::symbols::{NoSymbols, SymbolLookup, TsvSymbolLookup};
use kira_coexnet::geneset::GenesetCategory;
use tempfile::TempDir;

#[test]
fn category_parse_is_case_and_whitespace_tolerant() {
    assert_eq!(
        GenesetCategory::parse("h").unwrap(),
        GenesetCategory::Hallmark
    );
    assert_eq!(
        GenesetCategory::parse("  c2:cp:kegg ").unwrap(),
        GenesetCategory::CuratedKegg
    );
    assert_eq!(
        GenesetCategory::parse("C5:GO:BP").unwrap(),
        GenesetCategory::GoBiologicalProcess
    );
}

#[test]
fn category_parse_rejects_unknown_codes() {
    let err = GenesetCategory::parse("C9:NOPE").unwrap_err();
    assert!(matches!(err, CoexnetError::Configuration(_)));
    assert!(err.to_string().contains("unknown gene-set category"));
    assert!(err.to_string().contains("C2:CP:REACTOME"));
}

#[test]
fn category_codes_round_trip() {
    for category in GenesetCategory::ALL {
        assert_eq!(GenesetCategory::parse(category.code()).unwrap(), category);
    }
}

#[test]
fn gmt_paths_follow_category_codes() {
    let source = DirGenesetSource::new("/data/msigdb");
    assert!(source
        .path_for(GenesetCategory::Hallmark)
        .ends_with("h.gmt"));
    assert!(source
        .path_for(GenesetCategory::CuratedKegg)
        .ends_with("c2.cp.kegg.gmt"));
    assert!(source
        .path_for(GenesetCategory::GoBiologicalProcess)
        .ends_with("c5.go.bp.gmt"));
}

#[test]
fn parse_gmt_reads_sets_and_skips_chaff() {
    let content = "# comment line\n\
                   SET_A\tfirst set\tTP53\tBRCA1\t\tEGFR\n\
                   \n\
                   SET_B\tsecond set\t MYC \n";
    let sets = parse_gmt(content, "test.gmt", GenesetCategory::Hallmark).unwrap();
    assert_eq!(sets.len(), 2);
    assert_eq!(sets[0].name, "SET_A");
    assert_eq!(sets[0].genes, vec!["TP53", "BRCA1", "EGFR"]);
    assert_eq!(sets[1].name, "SET_B");
    assert_eq!(sets[1].genes, vec!["MYC"]);
    assert_eq!(sets[1].category, GenesetCategory::Hallmark);
}

#[test]
fn parse_gmt_rejects_line_without_description() {
    let err = parse_gmt("LONELY_NAME", "bad.gmt", GenesetCategory::Hallmark).unwrap_err();
    assert!(err
        .to_string()
        .contains("bad.gmt:1 malformed GMT line (expected name, description, genes)"));
}

#[test]
fn parse_gmt_rejects_memberless_set() {
    let err = parse_gmt(
        "OK\tdesc\tTP53\nEMPTY\tdesc\t\t\n",
        "bad.gmt",
        GenesetCategory::CuratedKegg,
    )
    .unwrap_err();
    assert!(err.to_string().contains("gene set 'EMPTY' has no members"));
    assert!(err.to_string().contains("bad.gmt:2"));
}

#[test]
fn parse_gmt_of_empty_content_is_empty() {
    let sets = parse_gmt("", "empty.gmt", GenesetCategory::Hallmark).unwrap();
    assert!(sets.is_empty());
}

#[test]
fn fetch_reports_missing_file_as_external_lookup() {
    let dir = TempDir::new().unwrap();
    let source = DirGenesetSource::new(dir.path());
    let err = source.fetch(GenesetCategory::Hallmark).unwrap_err();
    match err {
        CoexnetError::ExternalLookup { category, reason } => {
            assert_eq!(category, "H");
            assert!(reason.contains("h.gmt"));
        }
        other => panic!("expected ExternalLookup, got {other}"),
    }
}

#[test]
fn fetch_reads_gmt_from_directory() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("c5.go.mf.gmt"),
        "BINDING\tdesc\tTP53\tMDM2\n",
    )
    .unwrap();
    let source = DirGenesetSource::new(dir.path());
    let sets = source
        .fetch(GenesetCategory::GoMolecularFunction)
        .unwrap();
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].name, "BINDING");
    assert_eq!(sets[0].category, GenesetCategory::GoMolecularFunction);
}

#[test]
fn available_categories_reflect_files_on_disk() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("h.gmt"), "S\td\tG1\n").unwrap();
    fs::write(dir.path().join("c2.cgp.gmt"), "S\td\tG1\n").unwrap();
    let found = available_categories(dir.path());
    assert_eq!(
        found,
        vec![
            GenesetCategory::Hallmark,
            GenesetCategory::CuratedPerturbations
        ]
    );
}

#[test]
fn tsv_lookup_maps_probes_and_skips_unmapped_rows() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("symbols.tsv");
    fs::write(
        &path,
        "# probe\tsymbol\nAFFX_001\tTP53\nAFFX_002\t\nAFFX_003\tBRCA1\n",
    )
    .unwrap();
    let lookup = TsvSymbolLookup::load(&path).unwrap();
    assert_eq!(lookup.len(), 2);
    assert_eq!(lookup.symbol("AFFX_001"), Some("TP53"));
    assert_eq!(lookup.symbol("AFFX_002"), None);
    assert_eq!(lookup.symbol("AFFX_003"), Some("BRCA1"));
    assert_eq!(lookup.symbol("missing"), None);
}

#[test]
fn tsv_lookup_rejects_wrong_column_count() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.tsv");
    fs::write(&path, "AFFX_001\tTP53\textra\n").unwrap();
    let err = TsvSymbolLookup::load(&path).unwrap_err();
    assert!(err
        .to_string()
        .contains("malformed symbol TSV (expected 2 columns)"));
}

#[test]
fn no_symbols_never_maps() {
    let lookup = NoSymbols;
    assert_eq!(lookup.symbol("AFFX_001"), None);
}
