// subprobe/tests/cli_integration.rs

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::{NamedTempFile, TempDir};

/// Helper to create a test wordlist file
fn create_wordlist(labels: &[&str]) -> NamedTempFile {
    let file = NamedTempFile::new().expect("Failed to create temp file");
    let content = labels.join("\n");
    fs::write(file.path(), content).expect("Failed to write to temp file");
    file
}

/// Command isolated from the user's config files and SP_* environment.
fn subprobe(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("subprobe").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env_remove("RUST_LOG");
    for var in [
        "SP_RATE",
        "SP_NAMESERVERS",
        "SP_TIMEOUT",
        "SP_ATTEMPTS",
        "SP_WORDLIST",
        "SP_JSON",
        "SP_CSV",
        "SP_PRETTY",
        "SP_CONFIG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_help_shows_flags() {
    let home = TempDir::new().unwrap();
    subprobe(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--wordlist"))
        .stdout(predicate::str::contains("--rate"))
        .stdout(predicate::str::contains("--nameserver"))
        .stdout(predicate::str::contains("--test-resolver"));
}

#[test]
fn test_version_flag() {
    let home = TempDir::new().unwrap();
    subprobe(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_domain_is_an_error() {
    let home = TempDir::new().unwrap();
    subprobe(&home)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("target domain"));
}

#[test]
fn test_zero_rate_is_rejected() {
    let home = TempDir::new().unwrap();
    subprobe(&home)
        .args(["example.com", "--rate", "0"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Rate must be a positive integer"));
}

#[test]
fn test_conflicting_output_formats() {
    let home = TempDir::new().unwrap();
    subprobe(&home)
        .args(["example.com", "--json", "--csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("multiple output formats"));
}

#[test]
fn test_streaming_with_json_is_rejected() {
    let home = TempDir::new().unwrap();
    subprobe(&home)
        .args(["example.com", "--streaming", "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--batch"));
}

#[test]
fn test_missing_wordlist_exits_with_code_2() {
    let home = TempDir::new().unwrap();
    let missing = home.path().join("nope.txt");

    subprobe(&home)
        .args(["example.com", "--wordlist"])
        .arg(&missing)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Failed to load wordlist"));
}

#[test]
fn test_default_wordlist_is_read_from_working_dir() {
    let home = TempDir::new().unwrap();

    // No subnames.txt in the isolated working directory
    subprobe(&home)
        .arg("example.com")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("subnames.txt"));
}

#[test]
fn test_empty_wordlist_reports_zero_found() {
    let home = TempDir::new().unwrap();
    let wordlist = create_wordlist(&["", "   ", ""]);

    subprobe(&home)
        .args(["example.com", "--wordlist"])
        .arg(wordlist.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("0 found out of 0"));
}

#[test]
fn test_empty_wordlist_json_output() {
    let home = TempDir::new().unwrap();
    let wordlist = create_wordlist(&[]);

    let output = subprobe(&home)
        .args(["example.com", "--json", "--wordlist"])
        .arg(wordlist.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["records"].as_array().unwrap().len(), 0);
    assert_eq!(value["summary"]["attempted"], 0);
    assert_eq!(value["summary"]["found"], 0);
    assert_eq!(value["summary"]["domain"], "example.com");
}

#[test]
fn test_empty_wordlist_csv_output_has_header() {
    let home = TempDir::new().unwrap();
    let wordlist = create_wordlist(&[]);

    subprobe(&home)
        .args(["example.com", "--csv", "--wordlist"])
        .arg(wordlist.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("domain,addresses"));
}

#[test]
fn test_wordlist_from_env() {
    let home = TempDir::new().unwrap();
    let wordlist = create_wordlist(&[]);

    subprobe(&home)
        .arg("example.com")
        .env("SP_WORDLIST", wordlist.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("0 found out of 0"));
}

#[test]
fn test_local_config_file_is_discovered() {
    let home = TempDir::new().unwrap();
    fs::write(home.path().join("words.txt"), "").unwrap();
    fs::write(
        home.path().join("subprobe.toml"),
        "[defaults]\nwordlist = \"words.txt\"\n\n[output]\ndefault_format = \"json\"\n",
    )
    .unwrap();

    subprobe(&home)
        .arg("example.com")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"found\":0"));
}

#[test]
fn test_explicit_config_file_errors_are_reported() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("broken.toml");
    fs::write(&config, "[defaults]\nrate = 0\n").unwrap();

    subprobe(&home)
        .args(["example.com", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to load config file"));
}

#[test]
fn test_invalid_nameserver_is_rejected() {
    let home = TempDir::new().unwrap();
    let wordlist = create_wordlist(&["www"]);

    subprobe(&home)
        .args(["example.com", "-n", "not-an-ip", "--wordlist"])
        .arg(wordlist.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid nameserver address"));
}

#[test]
fn test_invalid_query_type_for_resolver_test() {
    let home = TempDir::new().unwrap();
    subprobe(&home)
        .args(["--test-resolver", "--query-type", "BOGUS"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("BOGUS"));
}

#[test]
#[ignore] // Requires network access
fn test_real_scan_finds_www() {
    let home = TempDir::new().unwrap();
    let wordlist = create_wordlist(&["www", "doesnotexist-subprobe-0000"]);

    subprobe(&home)
        .args(["google.com", "-n", "8.8.8.8", "--rate", "2", "--wordlist"])
        .arg(wordlist.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("www.google.com"))
        .stdout(predicate::str::contains("1 found out of 2"));
}

#[test]
#[ignore] // Requires network access
fn test_real_resolver_check() {
    let home = TempDir::new().unwrap();
    subprobe(&home)
        .args(["--test-resolver", "-n", "8.8.8.8"])
        .assert()
        .success()
        .stdout(predicate::str::contains("www.google.com"));
}
