// crates/atlas-gate-core/tests/tier_rules.rs
// ============================================================================
// Module: Access-Tier Inference Tests
// Description: Unit tests for the ordered tier decision table.
// Purpose: Verify rule precedence, the conservative default, and level parsing.
// ============================================================================

//! ## Overview
//! Exercises each rule of the decision table, the precedence of named
//! exceptions over the sequencing rule, the unrestricted fallback, and the
//! typed failure for unknown processing levels.

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

use atlas_gate_core::AccessTier;
use atlas_gate_core::ProcessingLevel;
use atlas_gate_core::RecordDescriptor;
use atlas_gate_core::infer_tier;
use atlas_gate_core::tier_rules;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Baseline descriptor with no exception flag and no restricted coordinate.
fn descriptor(level: ProcessingLevel, assay: &str) -> RecordDescriptor {
    RecordDescriptor {
        level,
        assay: assay.to_string(),
        is_named_exception: false,
        has_restricted_coordinate: false,
    }
}

// ============================================================================
// SECTION: Sequencing Rule
// ============================================================================

#[test]
fn early_level_sequencing_with_coordinate_is_restricted() {
    let mut record = descriptor(ProcessingLevel::Level1, "Bulk RNA-seq");
    record.has_restricted_coordinate = true;
    assert_eq!(infer_tier(&record), AccessTier::Restricted);
}

#[test]
fn late_level_sequencing_is_unrestricted() {
    let mut record = descriptor(ProcessingLevel::Level3, "Bulk RNA-seq");
    record.has_restricted_coordinate = true;
    assert_eq!(infer_tier(&record), AccessTier::Unrestricted);
}

#[test]
fn early_level_sequencing_without_coordinate_is_unrestricted() {
    let record = descriptor(ProcessingLevel::Level1, "Bulk RNA-seq");
    assert_eq!(infer_tier(&record), AccessTier::Unrestricted);
}

#[test]
fn sequencing_fragments_match_case_insensitively() {
    for assay in ["scRNA-seq", "Bulk WGS", "snRNA-seq", "scATAC-seq"] {
        let mut record = descriptor(ProcessingLevel::Level2, assay);
        record.has_restricted_coordinate = true;
        assert_eq!(infer_tier(&record), AccessTier::Restricted, "assay {assay}");
    }
}

// ============================================================================
// SECTION: Exception Precedence
// ============================================================================

#[test]
fn named_exception_assay_beats_the_sequencing_rule() {
    // Slide-seq matches both the exception list and the "-seq" fragment; the
    // exception rule runs first.
    let mut record = descriptor(ProcessingLevel::Level1, "Slide-seq");
    record.has_restricted_coordinate = true;
    assert_eq!(infer_tier(&record), AccessTier::Unrestricted);
}

#[test]
fn explicit_exception_flag_wins_regardless_of_assay() {
    let mut record = descriptor(ProcessingLevel::Level1, "Bulk RNA-seq");
    record.has_restricted_coordinate = true;
    record.is_named_exception = true;
    assert_eq!(infer_tier(&record), AccessTier::Unrestricted);
}

#[test]
fn codex_is_an_exception_only_at_level_one() {
    let mut record = descriptor(ProcessingLevel::Level1, "CODEX");
    record.has_restricted_coordinate = true;
    assert_eq!(infer_tier(&record), AccessTier::Unrestricted);
}

#[test]
fn open_assay_exceptions_apply_at_every_level() {
    for assay in ["Electron Microscopy", "RPPA", "Mass Spec", "10X Visium"] {
        let mut record = descriptor(ProcessingLevel::Level1, assay);
        record.has_restricted_coordinate = true;
        assert_eq!(infer_tier(&record), AccessTier::Unrestricted, "assay {assay}");
    }
}

// ============================================================================
// SECTION: Defaults and Totality
// ============================================================================

#[test]
fn unmatched_records_default_to_unrestricted() {
    let record = descriptor(ProcessingLevel::Level2, "Imaging");
    assert_eq!(infer_tier(&record), AccessTier::Unrestricted);
}

#[test]
fn late_levels_and_auxiliary_are_open() {
    for level in [
        ProcessingLevel::Level3,
        ProcessingLevel::Level4,
        ProcessingLevel::Auxiliary,
        ProcessingLevel::Other,
    ] {
        let record = descriptor(level, "anything");
        assert_eq!(infer_tier(&record), AccessTier::Unrestricted);
    }
}

#[test]
fn rule_table_order_is_stable() {
    let names: Vec<&str> = tier_rules().iter().map(|rule| rule.name).collect();
    assert_eq!(names, vec!["named-exception", "late-level-open", "early-level-sequencing"]);
}

// ============================================================================
// SECTION: Level Parsing
// ============================================================================

#[test]
fn level_strings_parse_with_spacing_and_case_variants() {
    assert_eq!("Level 1".parse::<ProcessingLevel>().unwrap(), ProcessingLevel::Level1);
    assert_eq!("level3".parse::<ProcessingLevel>().unwrap(), ProcessingLevel::Level3);
    assert_eq!("4".parse::<ProcessingLevel>().unwrap(), ProcessingLevel::Level4);
    assert_eq!("Auxiliary".parse::<ProcessingLevel>().unwrap(), ProcessingLevel::Auxiliary);
}

#[test]
fn unknown_level_is_a_typed_error_not_a_default() {
    let err = "Level 9".parse::<ProcessingLevel>().unwrap_err();
    assert_eq!(err.level, "Level 9");
    assert_eq!(err.kind(), "unknown-level");
}
