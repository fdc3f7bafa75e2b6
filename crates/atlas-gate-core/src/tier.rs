// crates/atlas-gate-core/src/tier.rs
// ============================================================================
// Module: Access-Tier Inference Engine
// Description: Declarative rule table classifying records into storage tiers.
// Purpose: Decide which of two mutually exclusive download backends serves a record.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Tier inference is a pure decision table. Rules are evaluated in a fixed
//! order and the first match wins; a record matching no rule falls back to
//! the unrestricted tier. The conservative cases (early-processing-level
//! sequencing data) are expressed as explicit rules ahead of the catch-all,
//! never left to the default, because misclassifying restricted data as open
//! is the worse failure mode.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Tier and Level Types
// ============================================================================

/// Storage/authorization class a record belongs to.
///
/// Exactly one tier is assigned per record; the tiers are mutually exclusive
/// and each maps to a distinct download backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessTier {
    /// Open-access storage; the least-privileged default classification.
    Unrestricted,
    /// Controlled-access storage requiring authorization.
    Restricted,
}

impl AccessTier {
    /// Returns the stable label for this tier.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unrestricted => "unrestricted",
            Self::Restricted => "restricted",
        }
    }
}

/// Processing level of a data record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingLevel {
    /// Raw data as generated by the instrument.
    Level1,
    /// Aligned or minimally processed data.
    Level2,
    /// Derived, de-identified data.
    Level3,
    /// Summary or feature-level data.
    Level4,
    /// Auxiliary files accompanying an assay.
    Auxiliary,
    /// Anything outside the leveled model.
    Other,
}

/// A level string that matches no known [`ProcessingLevel`].
///
/// Raised instead of defaulting: silently mapping an unknown level to a tier
/// risks misclassifying restricted data as open.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown processing level: {level}")]
pub struct UnknownLevelError {
    /// The level string that failed to parse.
    pub level: String,
}

impl UnknownLevelError {
    /// Returns the stable machine-readable kind for this error.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        "unknown-level"
    }
}

impl FromStr for ProcessingLevel {
    type Err = UnknownLevelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let folded: String =
            value.chars().filter(|ch| !ch.is_whitespace()).collect::<String>().to_ascii_lowercase();
        match folded.as_str() {
            "level1" | "1" => Ok(Self::Level1),
            "level2" | "2" => Ok(Self::Level2),
            "level3" | "3" => Ok(Self::Level3),
            "level4" | "4" => Ok(Self::Level4),
            "auxiliary" => Ok(Self::Auxiliary),
            "other" => Ok(Self::Other),
            _ => Err(UnknownLevelError {
                level: value.to_string(),
            }),
        }
    }
}

// ============================================================================
// SECTION: Record Descriptor
// ============================================================================

/// Minimal attributes of a data record needed to classify its access tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDescriptor {
    /// Processing level of the record.
    pub level: ProcessingLevel,
    /// Assay name as recorded in the metadata backend.
    pub assay: String,
    /// True when the record is declared an open-access exception upstream.
    pub is_named_exception: bool,
    /// True when a restricted-tier download coordinate resolves for the record.
    pub has_restricted_coordinate: bool,
}

// ============================================================================
// SECTION: Rule Table
// ============================================================================

/// One ordered entry of the tier decision table.
#[derive(Clone, Copy)]
pub struct TierRule {
    /// Short rule name used in diagnostics and tests.
    pub name: &'static str,
    /// Pure predicate over the descriptor.
    pub applies: fn(&RecordDescriptor) -> bool,
    /// Tier assigned when the predicate matches.
    pub tier: AccessTier,
}

/// Assay fragments that are always open regardless of level.
const EXCEPTION_ASSAYS: [&str; 7] = [
    "electron microscopy",
    "rppa",
    "slide-seq",
    "mass spec",
    "label free",
    "isobaric",
    "10x visium",
];

/// Assay fragments that indicate sequencing data.
const SEQUENCING_ASSAYS: [&str; 7] =
    ["-seq", "bulk rna", "bulk wgs", "bulk wes", "scrna", "scatac", "snrna"];

/// The ordered decision table; highest precedence first.
const RULES: [TierRule; 3] = [
    TierRule {
        name: "named-exception",
        applies: is_named_exception,
        tier: AccessTier::Unrestricted,
    },
    TierRule {
        name: "late-level-open",
        applies: is_late_level,
        tier: AccessTier::Unrestricted,
    },
    TierRule {
        name: "early-level-sequencing",
        applies: is_early_level_sequencing,
        tier: AccessTier::Restricted,
    },
];

/// Returns the ordered rule table used by [`infer_tier`].
#[must_use]
pub const fn tier_rules() -> &'static [TierRule] {
    &RULES
}

/// Classifies a record into exactly one access tier.
///
/// Total and deterministic: every well-formed descriptor yields a tier, and
/// a descriptor matching no rule falls back to [`AccessTier::Unrestricted`].
#[must_use]
pub fn infer_tier(descriptor: &RecordDescriptor) -> AccessTier {
    for rule in &RULES {
        if (rule.applies)(descriptor) {
            return rule.tier;
        }
    }
    AccessTier::Unrestricted
}

// ============================================================================
// SECTION: Predicates
// ============================================================================

/// Named exception: declared upstream, a known open assay, or CODEX at level 1.
fn is_named_exception(descriptor: &RecordDescriptor) -> bool {
    if descriptor.is_named_exception {
        return true;
    }
    let assay = descriptor.assay.to_ascii_lowercase();
    if EXCEPTION_ASSAYS.iter().any(|fragment| assay.contains(fragment)) {
        return true;
    }
    assay.contains("codex") && descriptor.level == ProcessingLevel::Level1
}

/// Levels 3 and 4, auxiliary, and unleveled records are open.
fn is_late_level(descriptor: &RecordDescriptor) -> bool {
    matches!(
        descriptor.level,
        ProcessingLevel::Level3
            | ProcessingLevel::Level4
            | ProcessingLevel::Auxiliary
            | ProcessingLevel::Other
    )
}

/// Early-level sequencing data with a resolvable restricted coordinate.
fn is_early_level_sequencing(descriptor: &RecordDescriptor) -> bool {
    if !matches!(descriptor.level, ProcessingLevel::Level1 | ProcessingLevel::Level2) {
        return false;
    }
    if !descriptor.has_restricted_coordinate {
        return false;
    }
    let assay = descriptor.assay.to_ascii_lowercase();
    SEQUENCING_ASSAYS.iter().any(|fragment| assay.contains(fragment))
}
