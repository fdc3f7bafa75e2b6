// crates/atlas-gate-core/tests/row_limit.rs
// ============================================================================
// Module: Row Cap Injection Tests
// Description: Unit tests for LIMIT detection and cap injection.
// Purpose: Verify cap injection is idempotent and literal-safe.
// ============================================================================

//! ## Overview
//! The cap injector must leave statements with an existing `LIMIT` untouched,
//! strip trailing semicolons before appending, and never be fooled by the
//! word "limit" inside a string literal.

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

use atlas_gate_core::SQL_ROW_CAP;
use atlas_gate_core::ensure_row_limit;
use atlas_gate_core::has_limit_clause;

// ============================================================================
// SECTION: Injection
// ============================================================================

#[test]
fn cap_is_appended_after_stripping_the_semicolon() {
    assert_eq!(
        ensure_row_limit("SELECT atlas_name FROM files;", SQL_ROW_CAP),
        "SELECT atlas_name FROM files LIMIT 1000"
    );
}

#[test]
fn trailing_whitespace_and_semicolons_are_both_stripped() {
    assert_eq!(ensure_row_limit("SELECT 1 ;  \n", 50), "SELECT 1 LIMIT 50");
}

#[test]
fn existing_limit_is_respected() {
    let statement = "SELECT * FROM files LIMIT 5";
    assert_eq!(ensure_row_limit(statement, SQL_ROW_CAP), statement);
}

#[test]
fn existing_limit_is_detected_case_insensitively() {
    let statement = "select * from files limit 5";
    assert_eq!(ensure_row_limit(statement, SQL_ROW_CAP), statement);
}

#[test]
fn limit_inside_a_subquery_counts() {
    let statement = "SELECT * FROM (SELECT * FROM files LIMIT 10) sub";
    assert!(has_limit_clause(statement));
    assert_eq!(ensure_row_limit(statement, SQL_ROW_CAP), statement);
}

#[test]
fn limit_inside_a_string_literal_does_not_count() {
    let statement = "SELECT * FROM files WHERE note = 'no limit'";
    assert!(!has_limit_clause(statement));
    assert_eq!(
        ensure_row_limit(statement, 100),
        "SELECT * FROM files WHERE note = 'no limit' LIMIT 100"
    );
}

// ============================================================================
// SECTION: Trailing Comments
// ============================================================================

#[test]
fn cap_is_placed_on_its_own_line_after_a_trailing_line_comment() {
    // A space-separated clause would land inside the comment and the backend
    // would run the statement uncapped.
    let capped = ensure_row_limit("SELECT * FROM files -- all of them", 1000);
    assert_eq!(capped, "SELECT * FROM files -- all of them\nLIMIT 1000");
    assert!(has_limit_clause(&capped));
}

#[test]
fn cap_after_a_trailing_comment_is_idempotent() {
    let once = ensure_row_limit("SELECT * FROM files -- all of them", 1000);
    assert_eq!(ensure_row_limit(&once, 1000), once);
}

#[test]
fn closed_block_comment_still_gets_the_space_separator() {
    assert_eq!(
        ensure_row_limit("SELECT * FROM files /* all */", 50),
        "SELECT * FROM files /* all */ LIMIT 50"
    );
}

// ============================================================================
// SECTION: Idempotence
// ============================================================================

#[test]
fn applying_the_cap_twice_is_a_no_op() {
    let once = ensure_row_limit("SELECT atlas FROM files", SQL_ROW_CAP);
    let twice = ensure_row_limit(&once, SQL_ROW_CAP);
    assert_eq!(once, twice);
}

#[test]
fn reapplying_with_a_different_cap_does_not_stack() {
    let once = ensure_row_limit("SELECT atlas FROM files", 1000);
    let twice = ensure_row_limit(&once, 100);
    assert_eq!(once, twice);
}
