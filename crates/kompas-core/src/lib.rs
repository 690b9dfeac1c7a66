//! # kompas-core
//!
//! The deterministic assessment engine for Kompas - THE LOGIC.
//!
//! This crate implements the guided business-growth assessment: a
//! four-stage derived-metrics pipeline (Revenue → Human Capital →
//! Target Acquisition → BD Baseline) over a key-value document store,
//! plus the Growth Coefficient and BD-ROI formula library.
//!
//! ## Architectural Constraints
//!
//! The core:
//! - Is the ONLY place where assessment state exists (stateful)
//! - Is synchronous and single-threaded; every update recomputes
//!   derived fields before returning
//! - Reads cross-stage data only through confirmed snapshots, never
//!   through live working copies
//! - Has NO async, NO network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod channels;
pub mod formulas;
pub mod pipeline;
pub mod stages;
pub mod store;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{GrowthCoefficientInput, KompasError, PerformanceCategory};

// =============================================================================
// RE-EXPORTS: Formula Library
// =============================================================================

pub use channels::{ALL_CHANNELS, Channel, ChannelMetric, LEAD_CONVERSION_RATE};
pub use formulas::{
    BdAllocation, BdRoi, BdRoiInput, BottleneckAnalysis, ChannelAllocation, ComponentScore,
    GrowthCoefficient, GrowthComponent, GrowthScenario, analyze_growth_bottlenecks,
    calculate_bd_roi, calculate_growth_coefficient, calculate_optimal_bd_allocation,
    generate_growth_scenarios, safe_div,
};

// =============================================================================
// RE-EXPORTS: Pipeline
// =============================================================================

pub use pipeline::{
    ALL_STAGES, BdBaselineView, HumanCapitalView, Pipeline, PipelineOverview, RevenueView,
    StageId, StageOverview, StageStatus, TargetAcquisitionView,
};

// =============================================================================
// RE-EXPORTS: Storage
// =============================================================================

pub use store::{KeyValueStore, MemoryStore, RedbStore, StoreBackend};
