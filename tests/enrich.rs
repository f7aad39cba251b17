use std::fs;

use kira_coexnet::cancel::CancelToken;
use kira_coexnet::error::CoexnetError;
use kira_coexnet::geneset::source::DirGenesetSource;
use kira_coexnet::geneset::{GeneSet, GenesetCategory};
use kira_coexnet::math::gsea::{
    self, GseaParams, RankedList, enrichment_score, run_categories,
};
use tempfile::TempDir;

#[test]
fn ranked_list_sorts_and_dedups() {
    let ranked = RankedList::new(vec![
        ("b".to_string(), 1.0),
        ("a".to_string(), 3.0),
        ("b".to_string(), 5.0),
    ]);
    assert_eq!(ranked.names, vec!["b", "a"]);
    assert_eq!(ranked.scores, vec![5.0, 3.0]);
    assert_eq!(ranked.len(), 2);

    let tied = RankedList::new(vec![("y".to_string(), 2.0), ("x".to_string(), 2.0)]);
    assert_eq!(tied.names, vec!["x", "y"]);
}

#[test]
fn score_peaks_at_top_concentrated_hits() {
    let scores = [4.0, 3.0, 2.0, 1.0];
    assert!((enrichment_score(&scores, &[0], 1.0) - 1.0).abs() < 1e-12);
    assert!((enrichment_score(&scores, &[0, 1], 1.0) - 1.0).abs() < 1e-12);
}

#[test]
fn score_is_negative_for_bottom_hits() {
    let scores = [4.0, 3.0, 2.0, 1.0];
    assert!((enrichment_score(&scores, &[3], 1.0) + 1.0).abs() < 1e-12);
}

#[test]
fn score_degenerate_hit_sets_are_zero() {
    let scores = [4.0, 3.0, 2.0, 1.0];
    assert_eq!(enrichment_score(&scores, &[], 1.0), 0.0);
    assert_eq!(enrichment_score(&scores, &[0, 1, 2, 3], 1.0), 0.0);
}

#[test]
fn weight_zero_ignores_score_magnitudes() {
    let scores = [100.0, 3.0, 2.0, 1.0];
    let es = enrichment_score(&scores, &[0, 1], 0.0);
    // Each hit contributes 1/2 regardless of its score.
    assert!((es - 1.0).abs() < 1e-12);
}

#[test]
fn prerank_filters_by_set_size() {
    let ranked = ranked_list(50);
    let sets = vec![
        gene_set("TOP3", &["g00", "g01", "g02"]),
        gene_set("TOO_SMALL", &["g10", "g11"]),
        gene_set(
            "TOO_BIG",
            &[
                "g00", "g01", "g02", "g03", "g04", "g05", "g06", "g07", "g08", "g09", "g10",
            ],
        ),
    ];
    let params = params(3, 10, 1.0);
    let results = gsea::prerank(&ranked, &sets, &params, &CancelToken::new()).unwrap();

    let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
    assert!(names.contains(&"TOP3"));
    assert!(!names.contains(&"TOO_SMALL"));
    assert!(!names.contains(&"TOO_BIG"));

    let top = results.iter().find(|r| r.name == "TOP3").unwrap();
    assert_eq!(top.size, 3);
    assert!((top.es - 1.0).abs() < 1e-12);
    assert!(top.nes > 0.0);
    assert!(top.p_value < 1.0);
}

#[test]
fn prerank_counts_unique_matched_members() {
    let ranked = ranked_list(50);
    let sets = vec![gene_set(
        "DUPED",
        &["g05", "g05", "g06", "g07", "not_in_list"],
    )];
    let params = params(3, 10, 1.0);
    let results = gsea::prerank(&ranked, &sets, &params, &CancelToken::new()).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].size, 3);
}

#[test]
fn prerank_alpha_zero_reports_nothing() {
    let ranked = ranked_list(50);
    let sets = vec![gene_set("TOP3", &["g00", "g01", "g02"])];
    let params = params(3, 10, 0.0);
    let results = gsea::prerank(&ranked, &sets, &params, &CancelToken::new()).unwrap();
    assert!(results.is_empty());
}

#[test]
fn prerank_is_deterministic() {
    let ranked = ranked_list(50);
    let sets = vec![
        gene_set("TOP3", &["g00", "g01", "g02"]),
        gene_set("MID", &["g20", "g25", "g30", "g35"]),
        gene_set("LOW", &["g46", "g47", "g48", "g49"]),
    ];
    let params = params(3, 10, 1.0);
    let a = gsea::prerank(&ranked, &sets, &params, &CancelToken::new()).unwrap();
    let b = gsea::prerank(&ranked, &sets, &params, &CancelToken::new()).unwrap();
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(&b) {
        assert_eq!(x.name, y.name);
        assert_eq!(x.es, y.es);
        assert_eq!(x.nes, y.nes);
        assert_eq!(x.p_value, y.p_value);
        assert_eq!(x.adj_p_value, y.adj_p_value);
    }
    for w in a.windows(2) {
        assert!(w[0].adj_p_value <= w[1].adj_p_value);
    }
}

#[test]
fn prerank_honours_cancellation() {
    let ranked = ranked_list(50);
    let sets = vec![gene_set("TOP3", &["g00", "g01", "g02"])];
    let params = params(3, 10, 1.0);
    let token = CancelToken::new();
    token.cancel();
    let err = gsea::prerank(&ranked, &sets, &params, &token).unwrap_err();
    assert!(matches!(err, CoexnetError::Cancelled(_)));
}

#[test]
fn unavailable_category_is_skipped_not_fatal() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("h.gmt"), "SET_H\tdesc\tg00\tg01\tg02\n").unwrap();
    fs::write(
        dir.path().join("c2.cp.kegg.gmt"),
        "SET_K\tdesc\tg03\tg04\tg05\tg06\tg07\n",
    )
    .unwrap();
    // No c5.go.bp.gmt on disk.
    let source = DirGenesetSource::new(dir.path());
    let categories = [
        GenesetCategory::Hallmark,
        GenesetCategory::CuratedKegg,
        GenesetCategory::GoBiologicalProcess,
    ];
    let ranked = ranked_list(50);
    let run = run_categories(
        &source,
        &categories,
        &ranked,
        &params(3, 10, 1.0),
        &CancelToken::new(),
    )
    .unwrap();

    assert_eq!(run.skipped.len(), 1);
    assert_eq!(run.skipped[0].0, "C5:GO:BP");
    let names: Vec<&str> = run.results.iter().map(|r| r.name.as_str()).collect();
    assert!(names.contains(&"SET_H"));
    assert!(names.contains(&"SET_K"));
    for r in &run.results {
        assert!(matches!(
            r.category,
            GenesetCategory::Hallmark | GenesetCategory::CuratedKegg
        ));
    }
}

#[test]
fn empty_source_is_skipped_with_reason() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("h.gmt"), "").unwrap();
    let source = DirGenesetSource::new(dir.path());
    let ranked = ranked_list(50);
    let run = run_categories(
        &source,
        &[GenesetCategory::Hallmark],
        &ranked,
        &params(3, 10, 1.0),
        &CancelToken::new(),
    )
    .unwrap();

    assert!(run.results.is_empty());
    assert_eq!(run.skipped.len(), 1);
    assert_eq!(run.skipped[0].0, "H");
    assert!(run.skipped[0].1.contains("no gene sets"));
}

#[test]
fn cancelled_token_stops_categories() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("h.gmt"), "SET_H\tdesc\tg00\tg01\tg02\n").unwrap();
    let source = DirGenesetSource::new(dir.path());
    let ranked = ranked_list(50);
    let token = CancelToken::new();
    token.cancel();
    let err = run_categories(
        &source,
        &[GenesetCategory::Hallmark],
        &ranked,
        &params(3, 10, 1.0),
        &token,
    )
    .unwrap_err();
    assert!(matches!(err, CoexnetError::Cancelled(_)));
}

fn ranked_list(n: usize) -> RankedList {
    RankedList::new(
        (0..n)
            .map(|i| (format!("g{i:02}"), (n - i) as f64))
            .collect(),
    )
}

fn gene_set(name: &str, genes: &[&str]) -> GeneSet {
    GeneSet {
        name: name.to_string(),
        genes: genes.iter().map(|g| g.to_string()).collect(),
        category: GenesetCategory::Hallmark,
    }
}

fn params(min_size: usize, max_size: usize, alpha: f64) -> GseaParams {
    GseaParams {
        permutations: 200,
        weight: 1.0,
        min_size,
        max_size,
        alpha,
        seed: 5,
    }
}
