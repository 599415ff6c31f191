//! `sb format` integration tests.

use predicates::prelude::*;

use super::common::{APP_WORKSPACE, TestEnv};

#[test]
fn format_lists_closure_in_dependency_order() {
  let env = TestEnv::with_files(APP_WORKSPACE);

  let output = env.sb_cmd().arg("format").output().unwrap();
  assert!(output.status.success());
  let stdout = String::from_utf8(output.stdout).unwrap();

  let core = stdout.find("//lib:core").unwrap();
  let app = stdout.find("//app:app").unwrap();
  let all = stdout.find("//:all").unwrap();
  assert!(core < app && app < all, "{}", stdout);
  assert!(stdout.contains("module: Core"));
}

#[test]
fn format_json_serializes_targets() {
  let env = TestEnv::with_files(APP_WORKSPACE);

  let output = env
    .sb_cmd()
    .args(["format", "--target", "//app:app", "--output", "json"])
    .output()
    .unwrap();
  assert!(output.status.success());

  let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(value["root"], "//app:app");
  let targets = value["targets"].as_array().unwrap();
  assert_eq!(targets.len(), 2);
  assert_eq!(targets[0]["kind"], "static_library");
  assert_eq!(targets[1]["label"]["name"], "app");
  assert_eq!(targets[1]["module"]["output_extension"], "");
}

#[test]
fn format_rejects_bad_label() {
  let env = TestEnv::with_files(APP_WORKSPACE);

  env
    .sb_cmd()
    .args(["format", "--target", "//lib:"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Invalid target label"));
}
