//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.
//!
//! Stage views are heterogeneous (each stage has its own record and
//! calculation shapes), so [`StageResponse`] carries the view as a
//! pre-serialized JSON value rather than a tagged union: clients key
//! off the stage slug they requested.

use kompas_core::{
    BdAllocation, BdRoi, BottleneckAnalysis, GrowthCoefficient, GrowthCoefficientInput,
    GrowthScenario, PerformanceCategory, PipelineOverview, StageStatus,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Pipeline status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub success: bool,
    pub overview: Option<PipelineOverview>,
    pub error: Option<String>,
}

impl StatusResponse {
    pub fn success(overview: PipelineOverview) -> Self {
        Self {
            success: true,
            overview: Some(overview),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            overview: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// STAGE RESPONSE
// =============================================================================

/// Response for stage show / update / confirm.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageResponse {
    pub success: bool,
    pub stage: Option<String>,
    pub status: Option<StageStatus>,
    /// The full stage view (record + calculations), shaped per stage.
    pub view: Option<serde_json::Value>,
    pub error: Option<String>,
}

impl StageResponse {
    pub fn success(stage: &str, status: StageStatus, view: serde_json::Value) -> Self {
        Self {
            success: true,
            stage: Some(stage.to_string()),
            status: Some(status),
            view: Some(view),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            stage: None,
            status: None,
            view: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// COEFFICIENT REQUEST/RESPONSE
// =============================================================================

/// Coefficient request: the four component scores.
///
/// Scores are clamped to `[0, 100]` by the handler before the formula
/// runs.
pub type CoefficientRequest = GrowthCoefficientInput;

/// Coefficient response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoefficientResponse {
    pub success: bool,
    pub input: Option<GrowthCoefficientInput>,
    pub coefficient: Option<GrowthCoefficient>,
    pub category: Option<String>,
    pub error: Option<String>,
}

impl CoefficientResponse {
    pub fn success(input: GrowthCoefficientInput, coefficient: GrowthCoefficient) -> Self {
        let category = PerformanceCategory::for_score(coefficient.total_score);
        Self {
            success: true,
            input: Some(input),
            coefficient: Some(coefficient),
            category: Some(category.label().to_string()),
            error: None,
        }
    }
}

// =============================================================================
// ROI RESPONSE
// =============================================================================

/// ROI response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoiResponse {
    pub success: bool,
    pub roi: Option<BdRoi>,
    pub error: Option<String>,
}

impl RoiResponse {
    pub fn success(roi: BdRoi) -> Self {
        Self {
            success: true,
            roi: Some(roi),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            roi: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// ALLOCATION REQUEST/RESPONSE
// =============================================================================

/// Allocation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationRequest {
    pub total_budget: f64,
    #[serde(default)]
    pub target_customers: u64,
}

/// Allocation response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResponse {
    pub success: bool,
    pub allocation: Option<BdAllocation>,
    pub error: Option<String>,
}

impl AllocationResponse {
    pub fn success(allocation: BdAllocation) -> Self {
        Self {
            success: true,
            allocation: Some(allocation),
            error: None,
        }
    }
}

// =============================================================================
// SCENARIOS RESPONSE
// =============================================================================

/// Scenarios response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenariosResponse {
    pub success: bool,
    pub scenarios: Vec<GrowthScenario>,
}

impl ScenariosResponse {
    pub fn success(scenarios: Vec<GrowthScenario>) -> Self {
        Self {
            success: true,
            scenarios,
        }
    }
}

// =============================================================================
// BOTTLENECKS RESPONSE
// =============================================================================

/// Bottlenecks response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BottlenecksResponse {
    pub success: bool,
    pub analysis: Option<BottleneckAnalysis>,
    pub error: Option<String>,
}

impl BottlenecksResponse {
    pub fn success(analysis: BottleneckAnalysis) -> Self {
        Self {
            success: true,
            analysis: Some(analysis),
            error: None,
        }
    }
}
