//! CLI parsing tests for the jobmatch command
//!
//! Tests that verify CLI argument parsing and the offline config commands.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the jobmatch binary with a clean environment
#[allow(deprecated)]
fn jobmatch(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("jobmatch").expect("Failed to find jobmatch binary");
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env_remove("RUST_LOG")
        .env_remove("HF_API_KEY")
        .env_remove("JOBMATCH_CONFIG")
        .env_remove("JOBMATCH_STORE")
        .env_remove("JOBMATCH_QDRANT_URL")
        .env_remove("JOBMATCH_EMBEDDING_PROVIDER")
        .env_remove("JOBMATCH_CORPUS")
        .env_remove("JOBMATCH_FILTER_MODE");
    cmd
}

fn sandbox() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_shows_all_commands() {
    let home = sandbox();
    jobmatch(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("search"))
        .stdout(predicate::str::contains("index"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_flag() {
    let home = sandbox();
    jobmatch(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("jobmatch"));
}

#[test]
fn test_global_options_in_help() {
    let home = sandbox();
    jobmatch(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--verbose"))
        .stdout(predicate::str::contains("--quiet"))
        .stdout(predicate::str::contains("--store"))
        .stdout(predicate::str::contains("--qdrant-url"))
        .stdout(predicate::str::contains("--embedding-provider"))
        .stdout(predicate::str::contains("--corpus"));
}

#[test]
fn test_verbose_and_quiet_conflict() {
    let home = sandbox();
    jobmatch(&home)
        .args(["--verbose", "--quiet", "config", "path"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

// ============================================================================
// Search Command Tests
// ============================================================================

#[test]
fn test_search_help() {
    let home = sandbox();
    jobmatch(&home)
        .args(["search", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[QUERY]"))
        .stdout(predicate::str::contains("--output"))
        .stdout(predicate::str::contains("--filter-mode"));
}

#[test]
fn test_search_invalid_filter_mode() {
    let home = sandbox();
    jobmatch(&home)
        .args(["search", "Developer", "--filter-mode", "strict"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_search_invalid_output_format() {
    let home = sandbox();
    jobmatch(&home)
        .args(["search", "Developer", "--output", "xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_search_without_credentials_fails() {
    let home = sandbox();
    std::fs::write(
        home.path().join("jobs.json"),
        r#"[{"jobId": 1, "jobTitle": "Developer", "location": "Boston"}]"#,
    )
    .unwrap();

    jobmatch(&home)
        .args(["--corpus", "jobs.json", "search", "Developer|Boston"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("HF_API_KEY"));
}

#[test]
fn test_search_missing_corpus_fails() {
    let home = sandbox();
    jobmatch(&home)
        .args(["--corpus", "nope.json", "search", "Developer"])
        .env("HF_API_KEY", "hf_test")
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.json"));
}

// ============================================================================
// Global Option Parsing
// ============================================================================

#[test]
fn test_invalid_store_backend() {
    let home = sandbox();
    jobmatch(&home)
        .args(["--store", "redis", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("redis"));
}

#[test]
fn test_invalid_embedding_provider() {
    let home = sandbox();
    jobmatch(&home)
        .args(["--embedding-provider", "candle", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("candle"));
}

#[test]
fn test_index_help() {
    let home = sandbox();
    jobmatch(&home)
        .args(["index", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--recreate"))
        .stdout(predicate::str::contains("--batch-size"));
}

// ============================================================================
// Config Command Tests
// ============================================================================

#[test]
fn test_config_path_json() {
    let home = sandbox();
    jobmatch(&home)
        .args(["config", "path", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"local_exists\": false"))
        .stdout(predicate::str::contains(".jobmatch"));
}

#[test]
fn test_config_init_writes_local_file() {
    let home = sandbox();
    jobmatch(&home)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));

    let written = home.path().join(".jobmatch").join("config.toml");
    let content = std::fs::read_to_string(written).unwrap();
    assert!(content.contains("default_query"));
}

#[test]
fn test_config_get_reads_local_file() {
    let home = sandbox();
    let dir = home.path().join(".jobmatch");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("config.toml"),
        "[search]\ndefault_query = \"Nurse|Denver\"\n",
    )
    .unwrap();

    jobmatch(&home)
        .args(["config", "get", "search.default_query"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nurse|Denver"));
}

#[test]
fn test_config_get_applies_cli_overrides() {
    let home = sandbox();
    jobmatch(&home)
        .args(["--store", "qdrant", "config", "get", "store.backend"])
        .assert()
        .success()
        .stdout(predicate::str::contains("qdrant"));
}

#[test]
fn test_filter_mode_flag_reaches_config() {
    let home = sandbox();
    jobmatch(&home)
        .args(["--filter-mode", "post-filter", "config", "get", "search.filter_mode"])
        .assert()
        .success()
        .stdout(predicate::str::contains("post-filter"));
}

#[test]
fn test_filter_mode_flag_overrides_local_file() {
    let home = sandbox();
    let dir = home.path().join(".jobmatch");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("config.toml"),
        "[search]\nfilter_mode = \"post-filter\"\n",
    )
    .unwrap();

    jobmatch(&home)
        .args(["config", "get", "search.filter_mode", "--filter-mode", "diagnostic"])
        .assert()
        .success()
        .stdout(predicate::str::contains("diagnostic"));
}

#[test]
fn test_verbosity_flags_set_log_level() {
    let home = sandbox();
    jobmatch(&home)
        .args(["--verbose", "config", "get", "logging.level"])
        .assert()
        .success()
        .stdout(predicate::str::contains("debug"));

    jobmatch(&home)
        .args(["--quiet", "config", "get", "logging.level"])
        .assert()
        .success()
        .stdout(predicate::str::contains("error"));

    jobmatch(&home)
        .args(["config", "get", "logging.level"])
        .assert()
        .success()
        .stdout(predicate::str::contains("warn"));
}

#[test]
fn test_config_get_unknown_key() {
    let home = sandbox();
    jobmatch(&home)
        .args(["config", "get", "store.nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown configuration key"));
}

#[test]
fn test_explicit_config_file_must_exist() {
    let home = sandbox();
    jobmatch(&home)
        .args(["--config", "missing.toml", "config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"));
}
