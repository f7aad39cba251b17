use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use assert_cmd::Command;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::Value;
use tempfile::TempDir;

// 60 features over 6 case and 6 control samples. The first ten features are
// shifted up by 5.0 in the case group, the next ten down by 5.0, and the
// rest carry only uniform noise, so at delta 30 the differential test must
// call exactly F001-F010 up and F011-F020 down.
const FEATURES: usize = 60;
const SAMPLES: usize = 12;
const CASES: usize = 6;
const SHIFTED: usize = 10;

#[test]
fn run_writes_every_output_table() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_inputs(input.path());
    run_analysis(input.path(), out.path());

    let de = fs::read_to_string(out.path().join("de_results.tsv")).unwrap();
    assert_eq!(
        de.lines().next().unwrap(),
        "feature_id\tsymbol\tstatistic\texpected\tcall"
    );
    assert_eq!(de.lines().count(), FEATURES + 1);

    let module_trait = fs::read_to_string(out.path().join("module_trait.tsv")).unwrap();
    assert_eq!(
        module_trait.lines().next().unwrap(),
        "module\tsize\tcorrelation\tp_value\tsignificant"
    );
    assert_eq!(module_trait.lines().count(), 3);

    let enrichment = fs::read_to_string(out.path().join("enrichment.tsv")).unwrap();
    assert_eq!(
        enrichment.lines().next().unwrap(),
        "category\tgene_set\tsize\tes\tnes\tp_value\tadj_p_value"
    );
    assert_eq!(enrichment.lines().count(), 3);

    let edges = fs::read_to_string(out.path().join("network_edges.tsv")).unwrap();
    assert_eq!(edges.lines().next().unwrap(), "source\ttarget\tweight");
    // Two tight blocks of ten features each: all 2 * C(10, 2) block-internal
    // pairs pass the threshold, no cross-block pair does.
    assert_eq!(edges.lines().count(), 91);

    let nodes = fs::read_to_string(out.path().join("network_nodes.tsv")).unwrap();
    assert_eq!(nodes.lines().next().unwrap(), "feature_id\tsymbol\tmodule");
    assert_eq!(nodes.lines().count(), 21);
}

#[test]
fn differential_calls_recover_injected_features() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_inputs(input.path());
    run_analysis(input.path(), out.path());

    let de = fs::read_to_string(out.path().join("de_results.tsv")).unwrap();
    let mut up = Vec::new();
    let mut down = Vec::new();
    let mut none = 0usize;
    for line in de.lines().skip(1) {
        let cols: Vec<&str> = line.split('\t').collect();
        assert_eq!(cols.len(), 5);
        match cols[4] {
            "up" => up.push(cols[0].to_string()),
            "down" => down.push(cols[0].to_string()),
            "none" => none += 1,
            other => panic!("unexpected call '{other}'"),
        }
    }
    let expected_up: Vec<String> = (1..=SHIFTED).map(|i| format!("F{i:03}")).collect();
    let expected_down: Vec<String> = (SHIFTED + 1..=2 * SHIFTED).map(|i| format!("F{i:03}")).collect();
    assert_eq!(up, expected_up);
    assert_eq!(down, expected_down);
    assert_eq!(none, FEATURES - 2 * SHIFTED);
}

#[test]
fn modules_split_by_shift_direction_and_track_the_trait() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_inputs(input.path());
    run_analysis(input.path(), out.path());

    let module_trait = fs::read_to_string(out.path().join("module_trait.tsv")).unwrap();
    let rows: Vec<&str> = module_trait.lines().skip(1).collect();
    assert_eq!(rows.len(), 2);
    for row in rows {
        let cols: Vec<&str> = row.split('\t').collect();
        assert!(cols[0] == "M1" || cols[0] == "M2");
        assert_eq!(cols[1], "10");
        let correlation: f64 = cols[2].parse().unwrap();
        assert!(correlation.abs() > 0.95, "weak correlation {correlation}");
        assert_eq!(cols[4], "true");
    }

    let nodes = fs::read_to_string(out.path().join("network_nodes.tsv")).unwrap();
    assert!(!nodes.contains("unassigned"));

    let edges = fs::read_to_string(out.path().join("network_edges.tsv")).unwrap();
    for line in edges.lines().skip(1) {
        let cols: Vec<&str> = line.split('\t').collect();
        let weight: f64 = cols[2].parse().unwrap();
        assert!((0.05..=1.0).contains(&weight), "weight {weight} out of range");
    }

    let enrichment = fs::read_to_string(out.path().join("enrichment.tsv")).unwrap();
    assert!(enrichment.contains("SET_UP"));
    assert!(enrichment.contains("SET_DOWN"));
    for line in enrichment.lines().skip(1) {
        let cols: Vec<&str> = line.split('\t').collect();
        assert_eq!(cols.len(), 7);
        assert_eq!(cols[0], "H");
    }
}

#[test]
fn summary_json_schema_fields_exist() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_inputs(input.path());
    run_analysis(input.path(), out.path());

    let v: Value =
        serde_json::from_slice(&fs::read(out.path().join("coexnet.json")).unwrap()).unwrap();
    assert_eq!(v["tool"], "kira-coexnet");
    assert!(v["version"].is_string());
    assert_eq!(v["schema_version"], "v1");
    assert_eq!(v["input_meta"]["features"], 60);
    assert_eq!(v["input_meta"]["samples"], 12);
    assert_eq!(v["input_meta"]["cases"], 6);
    assert_eq!(v["input_meta"]["controls"], 6);
    assert_eq!(v["differential"]["permutations"], 200);
    assert_eq!(v["differential"]["up"], 10);
    assert_eq!(v["differential"]["down"], 10);
    assert_eq!(v["differential"]["estimated_fdr"], 0.0);
    assert_eq!(v["refinement"]["trees"], 100);
    assert_eq!(v["refinement"]["candidates_up"], 10);
    assert_eq!(v["refinement"]["candidates_down"], 10);
    assert!(v["refinement"]["oob_accuracy"].is_number());
    assert_eq!(v["network"]["features"], 20);
    assert_eq!(v["network"]["unassigned"], 0);
    assert_eq!(v["network"]["edges_exported"], 90);
    let modules = v["network"]["modules"].as_array().unwrap();
    assert_eq!(modules.len(), 2);
    for module in modules {
        assert_eq!(module["size"], 10);
    }
    assert_eq!(v["module_traits"].as_array().unwrap().len(), 2);
    assert_eq!(v["enrichment"]["results"].as_array().unwrap().len(), 2);
    assert!(v["enrichment"]["skipped"].as_array().unwrap().is_empty());
    assert!(v["warnings"].as_array().unwrap().is_empty());
}

#[test]
fn stdout_summary_reports_stage_counts() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_inputs(input.path());
    let stdout = run_analysis(input.path(), out.path());

    assert!(stdout.contains("kira-coexnet v"));
    assert!(stdout.contains("Input: 60 features, 12 samples (6 case / 6 control)"));
    assert!(stdout.contains("Differential: 10 up, 10 down"));
    assert!(stdout.contains("20 candidates (10 up / 10 down)"));
    assert!(stdout.contains("Network: 20 features, 2 modules, 0 unassigned, 90 edges exported"));
    assert!(stdout.contains("Enrichment: 2 significant sets, 0 categories skipped"));
    assert!(stdout.contains("M1 (r="));
    assert!(stdout.contains("M2 (r="));
}

#[test]
fn outputs_are_deterministic() {
    let input = TempDir::new().unwrap();
    write_inputs(input.path());
    let out1 = TempDir::new().unwrap();
    let out2 = TempDir::new().unwrap();

    run_analysis(input.path(), out1.path());
    run_analysis(input.path(), out2.path());

    for name in [
        "de_results.tsv",
        "module_trait.tsv",
        "enrichment.tsv",
        "network_edges.tsv",
        "network_nodes.tsv",
        "coexnet.json",
    ] {
        let a = fs::read(out1.path().join(name)).unwrap();
        let b = fs::read(out2.path().join(name)).unwrap();
        assert_eq!(a, b, "mismatch in {}", name);
    }
}

#[test]
fn run_rejects_undersized_group() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_inputs(input.path());
    let mut pheno = String::new();
    for s in 0..SAMPLES {
        let group = if s == 0 { "case" } else { "control" };
        writeln!(pheno, "S{:02}\t{}", s + 1, group).unwrap();
    }
    fs::write(input.path().join("pheno.tsv"), pheno).unwrap();

    let stderr = run_expecting_failure(input.path(), out.path(), &[]);
    assert!(stderr.contains("each group needs at least 2 samples (case: 1, control: 11)"));
}

#[test]
fn run_rejects_unknown_category() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_inputs(input.path());

    let mut cmd = Command::cargo_bin("kira-coexnet").unwrap();
    cmd.args([
        "run",
        "--matrix",
        input.path().join("matrix.tsv").to_str().unwrap(),
        "--annotation",
        input.path().join("pheno.tsv").to_str().unwrap(),
        "--out",
        out.path().to_str().unwrap(),
        "--category",
        "NOPE",
    ]);
    let assert = cmd.assert().failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.contains("unknown gene-set category 'NOPE'"));
}

#[test]
fn dense_ceiling_aborts_the_run() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_inputs(input.path());

    let stderr = run_expecting_failure(input.path(), out.path(), &["--max-dense-features", "2"]);
    assert!(stderr.contains("exceed the dense network ceiling of 2"));
}

#[test]
fn validate_reports_input_dimensions() {
    let input = TempDir::new().unwrap();
    write_inputs(input.path());

    let mut cmd = Command::cargo_bin("kira-coexnet").unwrap();
    cmd.args([
        "validate",
        "--matrix",
        input.path().join("matrix.tsv").to_str().unwrap(),
        "--annotation",
        input.path().join("pheno.tsv").to_str().unwrap(),
    ]);
    let assert = cmd.assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(stdout.contains("kira-coexnet validate ok"));
    assert!(stdout.contains("features: 60"));
    assert!(stdout.contains("samples: 12"));
    assert!(stdout.contains("case: 6"));
    assert!(stdout.contains("control: 6"));
}

#[test]
fn geneset_show_lists_availability_and_members() {
    let genesets = TempDir::new().unwrap();
    write_genesets(genesets.path());

    let mut cmd = Command::cargo_bin("kira-coexnet").unwrap();
    cmd.args([
        "geneset",
        "show",
        "--genesets",
        genesets.path().to_str().unwrap(),
    ]);
    let assert = cmd.assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(stdout.contains("H\t2 sets"));
    assert!(stdout.contains("C2:CGP\tunavailable"));
    assert!(stdout.contains("C5:GO:BP\tunavailable"));

    let mut cmd = Command::cargo_bin("kira-coexnet").unwrap();
    cmd.args([
        "geneset",
        "show",
        "--genesets",
        genesets.path().to_str().unwrap(),
        "--category",
        "H",
    ]);
    let assert = cmd.assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(stdout.contains("H (2 sets):"));
    assert!(stdout.contains("SET_UP\t10"));
    assert!(stdout.contains("SET_DOWN\t10"));
}

fn run_analysis(input: &Path, out: &Path) -> String {
    let genesets = input.join("genesets");
    let mut cmd = Command::cargo_bin("kira-coexnet").unwrap();
    cmd.args([
        "run",
        "--matrix",
        input.join("matrix.tsv").to_str().unwrap(),
        "--annotation",
        input.join("pheno.tsv").to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
        "--genesets",
        genesets.to_str().unwrap(),
        "--category",
        "H",
        "--json",
        "--permutations",
        "200",
        "--delta",
        "30",
        "--trees",
        "100",
        "--enrich-permutations",
        "200",
    ]);
    let assert = cmd.assert().success();
    String::from_utf8_lossy(&assert.get_output().stdout).to_string()
}

fn run_expecting_failure(input: &Path, out: &Path, extra: &[&str]) -> String {
    let mut cmd = Command::cargo_bin("kira-coexnet").unwrap();
    cmd.args([
        "run",
        "--matrix",
        input.join("matrix.tsv").to_str().unwrap(),
        "--annotation",
        input.join("pheno.tsv").to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
        "--permutations",
        "200",
        "--delta",
        "30",
        "--trees",
        "100",
    ]);
    cmd.args(extra);
    let assert = cmd.assert().failure();
    String::from_utf8_lossy(&assert.get_output().stderr).to_string()
}

fn write_inputs(dir: &Path) {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let mut matrix = String::from("feature_id");
    for s in 0..SAMPLES {
        write!(matrix, "\tS{:02}", s + 1).unwrap();
    }
    matrix.push('\n');
    for f in 0..FEATURES {
        write!(matrix, "F{:03}", f + 1).unwrap();
        for s in 0..SAMPLES {
            let mut value = 5.0 + rng.gen_range(-0.1..0.1);
            if s < CASES && f < SHIFTED {
                value += 5.0;
            } else if s < CASES && f < 2 * SHIFTED {
                value -= 5.0;
            }
            write!(matrix, "\t{value:.4}").unwrap();
        }
        matrix.push('\n');
    }
    fs::write(dir.join("matrix.tsv"), matrix).unwrap();

    let mut pheno = String::from("sample_id\tgroup\ttissue\n");
    for s in 0..SAMPLES {
        let group = if s < CASES { "case" } else { "control" };
        writeln!(pheno, "S{:02}\t{}\tblood", s + 1, group).unwrap();
    }
    fs::write(dir.join("pheno.tsv"), pheno).unwrap();

    write_genesets(&dir.join("genesets"));
}

fn write_genesets(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    let mut gmt = String::from("SET_UP\tup-shifted block");
    for f in 0..SHIFTED {
        write!(gmt, "\tF{:03}", f + 1).unwrap();
    }
    gmt.push_str("\nSET_DOWN\tdown-shifted block");
    for f in SHIFTED..2 * SHIFTED {
        write!(gmt, "\tF{:03}", f + 1).unwrap();
    }
    gmt.push('\n');
    fs::write(dir.join("h.gmt"), gmt).unwrap();
}
