// crates/atlas-gate-gateways/tests/query_builder.rs
// ============================================================================
// Module: Query Builder Tests
// Description: SQL shape, escaping, and identifier validation tests.
// Purpose: Verify builder output is safe, well-formed, and injection-resistant.
// ============================================================================

//! ## Overview
//! SQL shape, escaping, and identifier validation tests for the query
//! builder: projection and WHERE-clause construction, safety-validator
//! acceptance, quote escaping, and table-name rejection.

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

use atlas_gate_core::check_safety;
use atlas_gate_gateways::FileFilters;
use atlas_gate_gateways::QueryBuilder;
use atlas_gate_gateways::escape_sql_string;
use atlas_gate_gateways::validate_table_name;

// ============================================================================
// SECTION: SQL Shape
// ============================================================================

#[test]
fn no_filters_selects_everything_without_a_where_clause() {
    let sql = FileFilters::default().build_sql();
    assert!(sql.starts_with("SELECT file_id, filename, file_format"));
    assert!(sql.ends_with("FROM files"));
    assert!(!sql.contains("WHERE"));
}

#[test]
fn scalar_filters_use_case_insensitive_substring_match() {
    let filters = FileFilters {
        assay: Some("RNA-seq".to_string()),
        ..FileFilters::default()
    };
    assert!(filters.build_sql().contains("assay ILIKE '%RNA-seq%'"));
}

#[test]
fn array_columns_are_matched_with_array_exists() {
    let filters = FileFilters {
        organ: Some("lung".to_string()),
        ..FileFilters::default()
    };
    let sql = filters.build_sql();
    assert!(sql.contains("arrayExists(x -> x ILIKE '%lung%', organ)"));
    assert!(!sql.contains("organ ILIKE"));
}

#[test]
fn multiple_filters_are_joined_with_and() {
    let filters = FileFilters {
        organ: Some("lung".to_string()),
        level: Some("Level 3".to_string()),
        ..FileFilters::default()
    };
    let sql = filters.build_sql();
    assert!(sql.contains(" AND "));
    assert!(sql.contains("level ILIKE '%Level 3%'"));
}

#[test]
fn record_ids_become_an_exact_in_clause() {
    let filters = FileFilters {
        record_ids: vec!["f_001".to_string(), "f_002".to_string()],
        ..FileFilters::default()
    };
    assert!(filters.build_sql().contains("file_id IN ('f_001', 'f_002')"));
}

#[test]
fn both_download_coordinates_are_always_selected() {
    let sql = FileFilters::default().build_sql();
    assert!(sql.contains("open_ref"));
    assert!(sql.contains("restricted_ref"));
}

// ============================================================================
// SECTION: Safety
// ============================================================================

#[test]
fn built_sql_always_passes_the_safety_validator() {
    let filters = FileFilters {
        organ: Some("lung".to_string()),
        assay: Some("Bulk RNA-seq".to_string()),
        filename: Some("sample_01".to_string()),
        record_ids: vec!["f_001".to_string()],
        ..FileFilters::default()
    };
    assert!(check_safety(&filters.build_sql()).is_ok());
}

#[test]
fn quote_injection_through_a_filter_value_stays_inside_the_literal() {
    let filters = FileFilters {
        filename: Some("x'; DROP TABLE files; --".to_string()),
        ..FileFilters::default()
    };
    let sql = filters.build_sql();
    // The hostile quote is escaped, so the whole value remains one literal
    // and the validator still accepts the statement.
    assert!(sql.contains("\\'"));
    assert!(check_safety(&sql).is_ok());
}

// ============================================================================
// SECTION: Escaping and Identifiers
// ============================================================================

#[test]
fn escaping_handles_backslashes_before_quotes() {
    assert_eq!(escape_sql_string("o'hara"), "o\\'hara");
    assert_eq!(escape_sql_string("a\\b"), "a\\\\b");
    assert_eq!(escape_sql_string("\\'"), "\\\\\\'");
}

#[test]
fn bare_table_names_are_accepted() {
    assert!(validate_table_name("files").is_ok());
    assert!(validate_table_name("files_v2").is_ok());
}

#[test]
fn anything_beyond_a_bare_identifier_is_rejected() {
    for name in ["", "files; DROP", "files.records", "files`", "files name"] {
        let err = validate_table_name(name).unwrap_err();
        assert_eq!(err.kind(), "invalid-identifier", "name {name:?}");
    }
}
