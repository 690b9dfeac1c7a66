//! # Assessment Stages
//!
//! The four data-entry stages of the assessment pipeline, in pipeline
//! order: Revenue, Human Capital, Target Acquisition, BD Baseline.
//!
//! Each stage module defines the same contract shape:
//! - a `Record` of source fields (plain value record, whole-record
//!   replace),
//! - a `Patch` mirroring it with optional fields (unknown fields are
//!   rejected, not silently accepted),
//! - a `Calculations` struct of derived fields recomputed from source
//!   fields on every merge (stale derived values are never displayed),
//! - draft/confirmed document types matching the persisted JSON
//!   schema byte-for-byte (camelCase keys).
//!
//! Stages never talk to the store directly; the pipeline orchestrator
//! loads and saves their documents through the key-value boundary.

pub mod bd_baseline;
pub mod human_capital;
pub mod revenue;
pub mod target_acquisition;

use std::time::{SystemTime, UNIX_EPOCH};

// =============================================================================
// DOCUMENT KEYS
// =============================================================================

/// Persisted document keys, one per stage plus confirmed snapshots.
///
/// The key set is fixed: note that target acquisition has a single
/// document (its confirmation flag lives inside the document) while
/// the other stages keep separate draft and confirmed keys.
pub mod keys {
    /// Revenue stage draft.
    pub const REVENUE_DATA: &str = "revenueData";
    /// Revenue stage confirmed snapshot.
    pub const REVENUE_CONFIRMED: &str = "revenueConfirmed";
    /// Human capital stage draft.
    pub const HUMAN_CAPITAL_DATA: &str = "humanCapitalData";
    /// Human capital stage confirmed snapshot.
    pub const HUMAN_CAPITAL_CONFIRMED: &str = "humanCapitalConfirmed";
    /// Target acquisition stage document (draft and confirmed).
    pub const TARGET_ACQUISITION_DATA: &str = "targetAcquisitionData";
    /// BD baseline stage draft.
    pub const BD_BASELINE_DATA: &str = "bdBaselineData";
    /// BD baseline stage confirmed snapshot.
    pub const BD_BASELINE_CONFIRMED: &str = "bdBaselineConfirmed";
}

// =============================================================================
// TIMESTAMPS
// =============================================================================

/// Current wall-clock time in Unix milliseconds.
///
/// Clock reads happen only at the save/confirm boundary so that all
/// derived-field computation stays deterministic.
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
