//! Behavioural smoke tests for the CLI entrypoint.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn help_lists_flags_and_environment() {
    let mut cmd = cargo_bin_cmd!("vsphere-bridge");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--fqdn"))
        .stdout(predicate::str::contains("VSPHERE_USERNAME"));
}

#[test]
fn missing_fqdn_fails_with_actionable_error() {
    let mut cmd = cargo_bin_cmd!("vsphere-bridge");
    cmd.env_remove("VSPHERE_FQDN")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("VSPHERE_FQDN"));
}

#[test]
fn unusable_fqdn_flag_is_rejected() {
    let mut cmd = cargo_bin_cmd!("vsphere-bridge");
    cmd.args(["--fqdn", "ftp://vsphere.local"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--fqdn"));
}
