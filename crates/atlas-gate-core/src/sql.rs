// crates/atlas-gate-core/src/sql.rs
// ============================================================================
// Module: SQL Safety Validator
// Description: Lexical read-only validation and row-cap injection for SQL text.
// Purpose: Guarantee that only bounded, read-only statements reach a backend.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! The safety validator performs a lexical check, not a parse: it strips
//! leading comments, requires a `SELECT` or `WITH` head, and scans standalone
//! tokens against a fixed blocklist of write/DDL verbs. Quoted literals and
//! quoted identifiers are skipped so that a keyword embedded in a string or a
//! longer identifier is never a false positive.
//!
//! Residual risk: a lexical check cannot catch every dialect-specific
//! obfuscation (for example a verb assembled by string concatenation server
//! side). The gateways this crate serves are read-only analytics conveniences;
//! the blocklist covers the common write verbs and the scope deliberately
//! stops there rather than growing into a SQL parser.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default row cap for ad-hoc SQL issued through a gateway.
pub const SQL_ROW_CAP: u64 = 1000;

/// Default row cap for structured (builder-generated) queries.
pub const STRUCTURED_ROW_CAP: u64 = 100;

/// Keywords that indicate write or destructive operations.
///
/// A statement containing any of these as a standalone token is rejected.
pub const BLOCKED_KEYWORDS: [&str; 13] = [
    "DELETE", "DROP", "UPDATE", "INSERT", "CREATE", "ALTER", "TRUNCATE", "GRANT", "REVOKE",
    "MERGE", "EXEC", "CALL", "REPLACE",
];

/// Keywords a read-only statement may begin with.
const ALLOWED_LEADING_KEYWORDS: [&str; 2] = ["SELECT", "WITH"];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Rejection reasons produced by [`check_safety`].
///
/// # Invariants
/// - `Empty` and `NotAQuery` are distinct: an all-whitespace statement is
///   `Empty`, while a non-empty statement with no query head (a bare
///   expression, or comments only) is `NotAQuery`.
/// - Rejections are never downgraded; callers rely on "no error means the
///   statement is read-only".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SafetyError {
    /// The statement is empty or whitespace-only.
    #[error("statement is empty")]
    Empty,
    /// The statement does not begin with SELECT or WITH.
    #[error("statement must begin with SELECT or WITH")]
    NotAQuery,
    /// The statement contains a blocked keyword as a standalone token.
    #[error("blocked SQL keyword: {0}")]
    BlockedKeyword(String),
}

impl SafetyError {
    /// Returns the stable machine-readable kind for this rejection.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Empty => "unsafe-query:empty",
            Self::NotAQuery => "unsafe-query:not-a-query",
            Self::BlockedKeyword(_) => "unsafe-query:blocked-keyword",
        }
    }
}

// ============================================================================
// SECTION: Safety Check
// ============================================================================

/// Validates that a SQL statement is read-only.
///
/// The check is purely a function of the input string; calling it twice
/// returns the same result.
///
/// # Errors
///
/// Returns [`SafetyError`] when the statement is empty, does not begin with
/// `SELECT` or `WITH`, or contains a blocked keyword as a standalone token.
pub fn check_safety(sql: &str) -> Result<(), SafetyError> {
    if sql.trim().is_empty() {
        return Err(SafetyError::Empty);
    }

    let tokens = scan_tokens(sql);
    for token in &tokens {
        let upper = token.to_ascii_uppercase();
        if BLOCKED_KEYWORDS.contains(&upper.as_str()) {
            return Err(SafetyError::BlockedKeyword(upper));
        }
    }

    let leading = tokens.first().map(|token| token.to_ascii_uppercase());
    match leading {
        Some(keyword) if ALLOWED_LEADING_KEYWORDS.contains(&keyword.as_str()) => Ok(()),
        _ => Err(SafetyError::NotAQuery),
    }
}

/// Returns true when the statement contains a `LIMIT` token outside literals.
///
/// The check is lexical: a `LIMIT` inside a subquery counts, matching the
/// behavior of [`ensure_row_limit`].
#[must_use]
pub fn has_limit_clause(sql: &str) -> bool {
    scan_tokens(sql).iter().any(|token| token.eq_ignore_ascii_case("LIMIT"))
}

/// Appends `LIMIT <max_rows>` unless the statement already carries one.
///
/// Trailing whitespace and semicolons are stripped before the clause is
/// appended so the result stays a single executable statement. When the
/// statement ends inside a `--` line comment the clause is placed on its own
/// line; a space would land it inside the comment and the backend would run
/// the query uncapped. Applying the cap twice is a no-op. This function
/// assumes [`check_safety`] already passed; it does not re-validate.
#[must_use]
pub fn ensure_row_limit(sql: &str, max_rows: u64) -> String {
    if has_limit_clause(sql) {
        return sql.to_string();
    }
    let trimmed = sql.trim_end().trim_end_matches(';').trim_end();
    let separator = if ends_in_line_comment(trimmed) { '\n' } else { ' ' };
    format!("{trimmed}{separator}LIMIT {max_rows}")
}

// ============================================================================
// SECTION: Tokenizer
// ============================================================================

/// Lexer state while scanning a statement.
enum ScanState {
    /// Outside any literal or comment.
    Plain,
    /// Inside a quoted region terminated by the given quote character.
    Quoted(char),
    /// Inside a `--` line comment.
    LineComment,
    /// Inside a `/* */` block comment.
    BlockComment,
}

/// Splits a statement into standalone word tokens.
fn scan_tokens(sql: &str) -> Vec<String> {
    scan(sql).0
}

/// Returns true when the statement's final character sits inside a `--`
/// line comment.
fn ends_in_line_comment(sql: &str) -> bool {
    matches!(scan(sql).1, ScanState::LineComment)
}

/// Scans a statement into standalone word tokens plus the final lexer state.
///
/// Tokens are maximal runs of `[A-Za-z0-9_]`. Single-quoted and double-quoted
/// literals, backtick-quoted identifiers, line comments, and block comments
/// contribute no tokens, so keywords inside them are never matched.
fn scan(sql: &str) -> (Vec<String>, ScanState) {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut state = ScanState::Plain;
    let mut chars = sql.chars().peekable();

    while let Some(ch) = chars.next() {
        match state {
            ScanState::Plain => {
                if ch.is_ascii_alphanumeric() || ch == '_' {
                    current.push(ch);
                    continue;
                }
                flush_token(&mut current, &mut tokens);
                match ch {
                    '\'' | '"' | '`' => state = ScanState::Quoted(ch),
                    '-' if chars.peek() == Some(&'-') => {
                        chars.next();
                        state = ScanState::LineComment;
                    }
                    '/' if chars.peek() == Some(&'*') => {
                        chars.next();
                        state = ScanState::BlockComment;
                    }
                    _ => {}
                }
            }
            ScanState::Quoted(quote) => {
                if ch == '\\' {
                    chars.next();
                } else if ch == quote {
                    state = ScanState::Plain;
                }
            }
            ScanState::LineComment => {
                if ch == '\n' {
                    state = ScanState::Plain;
                }
            }
            ScanState::BlockComment => {
                if ch == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = ScanState::Plain;
                }
            }
        }
    }
    flush_token(&mut current, &mut tokens);
    (tokens, state)
}

/// Moves a pending token into the output list, dropping empty runs.
fn flush_token(current: &mut String, tokens: &mut Vec<String>) {
    if !current.is_empty() {
        tokens.push(std::mem::take(current));
    }
}
