use assert_cmd::Command;

#[test]
fn cli_help_smoke() {
    let mut cmd = Command::cargo_bin("kira-coexnet").unwrap();
    cmd.arg("--help");
    cmd.assert().success();
}

#[test]
fn subcommand_help_smoke() {
    for args in [
        &["run", "--help"][..],
        &["geneset", "show", "--help"][..],
        &["validate", "--help"][..],
    ] {
        let mut cmd = Command::cargo_bin("kira-coexnet").unwrap();
        cmd.args(args);
        cmd.assert().success();
    }
}

#[test]
fn unknown_subcommand_fails() {
    let mut cmd = Command::cargo_bin("kira-coexnet").unwrap();
    cmd.arg("frobnicate");
    cmd.assert().failure();
}

#[test]
fn run_requires_matrix_and_annotation() {
    let mut cmd = Command::cargo_bin("kira-coexnet").unwrap();
    cmd.arg("run");
    cmd.assert().failure();
}
