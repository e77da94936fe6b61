//! Integration tests for the nagger CLI surface.
//!
//! These exercise argument parsing, the token precondition and the
//! offline-safe commands through the real binary. Nothing here talks to
//! a forge: every scenario either fails before the first request or runs
//! a command that never issues one.

use assert_cmd::Command;
use predicates::prelude::*;

fn nagger() -> Command {
    let mut cmd = Command::cargo_bin("nagger").unwrap();
    // never inherit a real token or CI identity from the environment
    cmd.env_remove("NAGGUS_KEY")
        .env_remove("CI_API_V4_URL")
        .env_remove("CI_PROJECT_ID")
        .env_remove("CI_MERGE_REQUEST_IID");
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    nagger()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("nag"))
        .stdout(predicate::str::contains("tag-to-release"))
        .stdout(predicate::str::contains("changelog-homepage"))
        .stdout(predicate::str::contains("changelog-wiki"))
        .stdout(predicate::str::contains("milestone-wiki"))
        .stdout(predicate::str::contains("fixup"))
        .stdout(predicate::str::contains("tag-release"))
        .stdout(predicate::str::contains("move-milestone-items"))
        .stdout(predicate::str::contains("debug-variables"));
}

#[test]
fn test_version_flag() {
    nagger()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_no_subcommand_fails() {
    nagger().assert().failure();
}

#[test]
fn test_unknown_subcommand_fails() {
    nagger().arg("frobnicate").assert().failure();
}

#[test]
fn test_missing_token_is_fatal() {
    nagger()
        .args(["changelog", "v1.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NAGGUS_KEY"));
}

#[test]
fn test_debug_variables_needs_no_token() {
    nagger()
        .arg("debug-variables")
        .env("CI_TEST_VARIABLE", "hello-from-ci")
        .assert()
        .success()
        .stdout(predicate::str::contains("CI_TEST_VARIABLE=hello-from-ci"));
}

#[test]
fn test_debug_variables_sorts_output() {
    let output = nagger()
        .arg("debug-variables")
        .env("CI_ZZZ", "last")
        .env("CI_AAA", "first")
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let aaa = stdout.find("CI_AAA=first").unwrap();
    let zzz = stdout.find("CI_ZZZ=last").unwrap();
    assert!(aaa < zzz);
}

#[test]
fn test_tag_release_rejects_short_tag_before_any_request() {
    nagger()
        .args(["tag-release", "v3.14"])
        .env("NAGGUS_KEY", "dummy-token")
        .assert()
        .failure()
        .stderr(predicate::str::contains("full version"));
}

#[test]
fn test_dry_run_flag_parses_on_sink_commands() {
    // parse failure would exit 2; these die later (no token) with exit 1
    for args in [
        ["changelog-wiki", "v1.0", "--dry-run"],
        ["changelog-homepage", "v1.0", "--dry-run"],
        ["milestone-wiki", "v1.0", "-n"],
        ["fixup", "v1.0", "-n"],
    ] {
        nagger()
            .args(args)
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("NAGGUS_KEY"));
    }
}
