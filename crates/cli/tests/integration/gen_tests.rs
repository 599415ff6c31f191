//! `sb gen` integration tests.

use predicates::prelude::*;

use super::common::{APP_WORKSPACE, TestEnv};

#[test]
fn gen_writes_build_ninja() {
  let env = TestEnv::with_files(APP_WORKSPACE);

  env
    .sb_cmd()
    .args(["gen", "out"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Generated"))
    .stdout(predicate::str::contains("Targets: 3"));

  let ninja = env.read_build_file("out/build.ninja");
  assert!(ninja.contains("rule swift_compile"));
  assert!(ninja.contains(": swift_link app/app.dir/app.o | lib/core."));
  assert!(ninja.contains("build all: phony app/app\n"));
  assert!(ninja.contains("lib/core.dir/swift/Core.swiftmodule"));
  assert!(ninja.ends_with("default all\n"));
  assert!(!env.exists("out/build.ninja.tmp"));
}

#[test]
fn gen_discovers_root_from_subdirectory() {
  let env = TestEnv::with_files(APP_WORKSPACE);

  env
    .sb_cmd_in("app")
    .args(["gen", "../out", "--target", "//app:app"])
    .assert()
    .success();

  let ninja = env.read_build_file("out/build.ninja");
  assert!(ninja.ends_with("default app/app\n"));
}

#[test]
fn gen_with_explicit_root() {
  let env = TestEnv::with_files(APP_WORKSPACE);
  let out = env.path("elsewhere");

  let mut cmd = env.sb_cmd();
  cmd
    .arg("gen")
    .arg(&out)
    .arg("--root")
    .arg(env.root())
    .args(["--target", "//lib:core"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Targets: 1"));

  assert!(env.exists("elsewhere/build.ninja"));
}

#[test]
fn gen_passes_link_flags() {
  let env = TestEnv::with_files(APP_WORKSPACE);

  env
    .sb_cmd()
    .args(["gen", "out", "--link-flag", "-Xlinker", "--link-flag", "-dead_strip"])
    .assert()
    .success();

  let ninja = env.read_build_file("out/build.ninja");
  assert!(ninja.contains("-Xlinker -dead_strip"));
}

#[test]
fn gen_reports_failed_assert() {
  let env = TestEnv::with_files(&[("BUILD.gn", "assert(1 == 2, \"nope\")\ngroup(\"all\") { }\n")]);

  env
    .sb_cmd()
    .args(["gen", "out"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("nope"))
    .stderr(predicate::str::contains("BUILD.gn:1:1"));

  assert!(!env.exists("out/build.ninja"));
}

#[test]
fn gen_reports_missing_dependency() {
  let env = TestEnv::with_files(&[("BUILD.gn", "group(\"all\") { deps = [\":ghost\"] }\n")]);

  env
    .sb_cmd()
    .args(["gen", "out"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("ghost"));
}

#[test]
fn gen_reports_parse_errors() {
  let env = TestEnv::with_files(&[("BUILD.gn", "group(\"all\") { deps = }\n")]);

  env
    .sb_cmd()
    .args(["gen", "out"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("error:"));
}

#[test]
fn gen_rejects_cycles() {
  let env = TestEnv::with_files(&[(
    "BUILD.gn",
    "group(\"all\") { deps = [\":loop\"] }\ngroup(\"loop\") { deps = [\":all\"] }\n",
  )]);

  env
    .sb_cmd()
    .args(["gen", "out"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("cycle"));
}
