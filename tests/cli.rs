use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_help_lists_flags() {
    let mut cmd = Command::new(cargo_bin!("minibank"));
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--bind"))
        .stdout(predicate::str::contains("--seed"));
}

#[test]
fn test_malformed_seed_is_rejected() {
    let mut cmd = Command::new(cargo_bin!("minibank"));
    cmd.arg("--seed").arg("not-a-seed");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("expected `id=balance`"));
}

#[test]
fn test_negative_opening_balance_is_rejected() {
    let mut cmd = Command::new(cargo_bin!("minibank"));
    cmd.arg("--seed").arg("1=-100");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("must not be negative"));
}
