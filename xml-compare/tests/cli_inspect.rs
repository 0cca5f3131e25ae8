use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("fixtures")
        .join(path)
}

#[test]
fn inspect_prints_tree_with_positions() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("xml-compare"));
    cmd.arg("inspect")
        .arg(fixture("catalog_control.xml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("/ document version=1.0 encoding=UTF-8"))
        .stdout(predicate::str::contains("/catalog[1]/comment()[1]"))
        .stdout(predicate::str::contains("/catalog[1]/book[2] <book id=\"bk102\" lang=\"en\">"));
}

#[test]
fn inspect_depth_limits_output() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("xml-compare"));
    cmd.arg("inspect")
        .arg(fixture("catalog_control.xml"))
        .arg("--depth")
        .arg("1")
        .assert()
        .success()
        .stdout(predicate::str::contains("/catalog[1]"))
        .stdout(predicate::str::contains("book").not());
}
