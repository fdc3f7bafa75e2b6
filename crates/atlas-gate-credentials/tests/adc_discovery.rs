// crates/atlas-gate-credentials/tests/adc_discovery.rs
// ============================================================================
// Module: ADC Discovery Tests
// Description: Key-file discovery order and not-configured behavior.
// Purpose: Verify environment path beats the well-known file and misses stack.
// ============================================================================

//! ## Overview
//! Application-default-credential discovery tests: the environment-specified
//! key file wins over the well-known file, misses fall through in order, and
//! an empty chain surfaces a not-configured error with remediation text.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::fs;
use std::path::PathBuf;

use atlas_gate_credentials::AdcProfile;
use atlas_gate_credentials::SourceTier;
use atlas_gate_credentials::resolve_adc;
use tempfile::TempDir;

/// Writes an empty key file and returns its path.
fn key_file(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, "{}").unwrap();
    path
}

#[test]
fn environment_path_wins_over_the_well_known_file() {
    let dir = TempDir::new().unwrap();
    let profile = AdcProfile {
        env_key_file: Some(key_file(&dir, "explicit.json")),
        well_known_file: Some(key_file(&dir, "adc.json")),
    };

    let creds = resolve_adc(&profile).unwrap();
    assert_eq!(creds.source, SourceTier::Environment);
    assert!(creds.key_file.ends_with("explicit.json"));
}

#[test]
fn missing_environment_path_falls_back_to_the_well_known_file() {
    let dir = TempDir::new().unwrap();
    let profile = AdcProfile {
        env_key_file: Some(dir.path().join("does-not-exist.json")),
        well_known_file: Some(key_file(&dir, "adc.json")),
    };

    let creds = resolve_adc(&profile).unwrap();
    assert_eq!(creds.source, SourceTier::File);
}

#[test]
fn no_discoverable_key_file_is_not_configured() {
    let dir = TempDir::new().unwrap();
    let profile = AdcProfile {
        env_key_file: None,
        well_known_file: Some(dir.path().join("missing.json")),
    };

    let err = resolve_adc(&profile).unwrap_err();
    assert_eq!(err.kind(), "not-configured");
    assert!(err.to_string().contains("GOOGLE_APPLICATION_CREDENTIALS"));
}
