//! # Core Type Definitions
//!
//! This module contains the shared types for the Kompas assessment engine:
//! - Growth coefficient input (`GrowthCoefficientInput`)
//! - Performance banding (`PerformanceCategory`)
//! - Error types (`KompasError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module are plain value records: inputs fully
//! determine outputs, mutation is whole-record replace, and nothing
//! here holds an identity beyond "the current value for this session".

use crate::pipeline::StageId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// GROWTH COEFFICIENT INPUT
// =============================================================================

/// Input to the growth coefficient formula.
///
/// Each field is a percentage and is expected to lie in `[0, 100]`.
/// The formula itself does NOT clamp: callers at the application
/// boundary clamp via [`GrowthCoefficientInput::clamped`] before
/// invoking it. Out-of-range input produces nonsensical (but not
/// rejected) output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthCoefficientInput {
    /// Business development maturity, 0-100.
    pub business_development: f64,
    /// Manpower / human-capital cost efficiency, 0-100.
    pub manpower_costs: f64,
    /// Founder engagement level, 0-100.
    pub founder_engagement: f64,
    /// Expected customer growth, 0-100.
    pub customer_growth: f64,
}

impl GrowthCoefficientInput {
    /// Create a new input record.
    #[must_use]
    pub const fn new(
        business_development: f64,
        manpower_costs: f64,
        founder_engagement: f64,
        customer_growth: f64,
    ) -> Self {
        Self {
            business_development,
            manpower_costs,
            founder_engagement,
            customer_growth,
        }
    }

    /// Return a copy with every field clamped to `[0, 100]`.
    ///
    /// Clamping is the caller's responsibility; the formula library
    /// never clamps on its own.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            business_development: self.business_development.clamp(0.0, 100.0),
            manpower_costs: self.manpower_costs.clamp(0.0, 100.0),
            founder_engagement: self.founder_engagement.clamp(0.0, 100.0),
            customer_growth: self.customer_growth.clamp(0.0, 100.0),
        }
    }
}

// =============================================================================
// PERFORMANCE CATEGORY
// =============================================================================

/// Performance band for a coefficient score.
///
/// Banding is deterministic with inclusive lower bounds:
/// `score >= 80` Excellent, `>= 60` Good, `>= 40` Fair, else
/// Needs Improvement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PerformanceCategory {
    NeedsImprovement,
    Fair,
    Good,
    Excellent,
}

impl PerformanceCategory {
    /// Band a score. Boundaries are inclusive on the lower bound.
    #[must_use]
    pub fn for_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::Excellent
        } else if score >= 60.0 {
            Self::Good
        } else if score >= 40.0 {
            Self::Fair
        } else {
            Self::NeedsImprovement
        }
    }

    /// Get the display label for this band.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::NeedsImprovement => "Needs Improvement",
        }
    }

    /// Get the description for this band.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Excellent => "Your growth engine is firing on all cylinders",
            Self::Good => "Solid fundamentals with room to optimize",
            Self::Fair => "Growth is possible but key areas need attention",
            Self::NeedsImprovement => "Focus on fundamentals before scaling",
        }
    }
}

impl std::fmt::Display for PerformanceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Kompas system.
///
/// - No silent failures
/// - Use `Result<T, KompasError>` for fallible operations
/// - The CORE should never panic; all errors must be recoverable
#[derive(Debug, Error)]
pub enum KompasError {
    /// A channel name was not found in the reference table.
    /// This indicates a programming error, not bad user input, and
    /// fails loudly instead of silently defaulting.
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    /// A required upstream stage has never been confirmed.
    /// Recovered by prompting the user to complete the previous step.
    #[error("Upstream stage not confirmed: {0}")]
    MissingUpstreamData(StageId),

    /// A stage name could not be parsed at the application boundary.
    #[error("Invalid stage name: {0}")]
    InvalidStage(String),

    /// The storage backend failed.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O operation failed (file access, socket bind).
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
