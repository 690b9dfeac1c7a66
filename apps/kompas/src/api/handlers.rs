//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Error mapping: bad input (unknown stage, unknown channel, malformed
//! patch) is `400`; confirming out of pipeline order is `409`; storage
//! failures are `500`.

use super::{
    AppState,
    types::{
        AllocationRequest, AllocationResponse, BottlenecksResponse, CoefficientRequest,
        CoefficientResponse, HealthResponse, RoiResponse, ScenariosResponse, StageResponse,
        StatusResponse,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use kompas_core::{
    BdRoiInput, KompasError, Pipeline, StageId, StageStatus,
    formulas::{
        analyze_growth_bottlenecks, calculate_bd_roi, calculate_growth_coefficient,
        calculate_optimal_bd_allocation, generate_growth_scenarios,
    },
};
use serde::Serialize;
use serde::de::DeserializeOwned;

// =============================================================================
// ERROR MAPPING
// =============================================================================

/// HTTP status for a core error.
fn error_status(error: &KompasError) -> StatusCode {
    match error {
        KompasError::UnknownChannel(_)
        | KompasError::InvalidStage(_)
        | KompasError::DeserializationError(_) => StatusCode::BAD_REQUEST,
        KompasError::MissingUpstreamData(_) => StatusCode::CONFLICT,
        KompasError::StorageError(_)
        | KompasError::SerializationError(_)
        | KompasError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS HANDLER
// =============================================================================

/// Get pipeline status.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let pipeline = state.pipeline.read().await;
    match pipeline.overview() {
        Ok(overview) => (StatusCode::OK, Json(StatusResponse::success(overview))),
        Err(e) => (
            error_status(&e),
            Json(StatusResponse::error(e.to_string())),
        ),
    }
}

// =============================================================================
// STAGE HANDLERS
// =============================================================================

/// Serialize a stage view into a [`StageResponse`].
fn stage_view_response<T: Serialize>(
    stage: StageId,
    status: StageStatus,
    view: &T,
) -> (StatusCode, Json<StageResponse>) {
    match serde_json::to_value(view) {
        Ok(value) => (
            StatusCode::OK,
            Json(StageResponse::success(stage.slug(), status, value)),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(StageResponse::error(format!("Serialize view: {}", e))),
        ),
    }
}

fn stage_error_response(error: &KompasError) -> (StatusCode, Json<StageResponse>) {
    (error_status(error), Json(StageResponse::error(error.to_string())))
}

/// Open a stage and return its view.
fn open_stage(pipeline: &mut Pipeline, stage: StageId) -> (StatusCode, Json<StageResponse>) {
    match stage {
        StageId::Revenue => match pipeline.open_revenue() {
            Ok(view) => stage_view_response(stage, view.status, &view),
            Err(e) => stage_error_response(&e),
        },
        StageId::HumanCapital => match pipeline.open_human_capital() {
            Ok(view) => stage_view_response(stage, view.status, &view),
            Err(e) => stage_error_response(&e),
        },
        StageId::TargetAcquisition => match pipeline.open_target_acquisition() {
            Ok(view) => stage_view_response(stage, view.status, &view),
            Err(e) => stage_error_response(&e),
        },
        StageId::BdBaseline => match pipeline.open_bd_baseline() {
            Ok(view) => stage_view_response(stage, view.status, &view),
            Err(e) => stage_error_response(&e),
        },
    }
}

/// Show a stage with its current calculations.
pub async fn stage_show_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> impl IntoResponse {
    let stage = match StageId::parse(&slug) {
        Ok(stage) => stage,
        Err(e) => return stage_error_response(&e),
    };

    // Opening may capture baselines, so it needs the write lock.
    let mut pipeline = state.pipeline.write().await;
    open_stage(&mut pipeline, stage)
}

/// Deserialize a stage patch from the request body.
fn parse_patch<T: DeserializeOwned>(body: serde_json::Value) -> Result<T, KompasError> {
    serde_json::from_value(body).map_err(|e| KompasError::DeserializationError(e.to_string()))
}

/// Merge a patch into a stage draft and persist it.
pub async fn stage_update_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    let stage = match StageId::parse(&slug) {
        Ok(stage) => stage,
        Err(e) => return stage_error_response(&e),
    };

    let mut pipeline = state.pipeline.write().await;
    let result = match stage {
        StageId::Revenue => parse_patch(body).and_then(|patch| {
            let view = pipeline.update_revenue(&patch)?;
            pipeline.save_revenue_draft()?;
            Ok(stage_view_response(stage, view.status, &view))
        }),
        StageId::HumanCapital => parse_patch(body).and_then(|patch| {
            let view = pipeline.update_human_capital(&patch)?;
            pipeline.save_human_capital_draft()?;
            Ok(stage_view_response(stage, view.status, &view))
        }),
        StageId::TargetAcquisition => parse_patch(body).and_then(|patch| {
            let view = pipeline.update_target_acquisition(&patch)?;
            pipeline.save_target_acquisition_draft()?;
            Ok(stage_view_response(stage, view.status, &view))
        }),
        StageId::BdBaseline => parse_patch(body).and_then(|patch| {
            let view = pipeline.update_bd_baseline(&patch)?;
            pipeline.save_bd_baseline_draft()?;
            Ok(stage_view_response(stage, view.status, &view))
        }),
    };

    match result {
        Ok(response) => response,
        Err(e) => stage_error_response(&e),
    }
}

/// Confirm a stage, publishing its baseline downstream.
pub async fn stage_confirm_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> impl IntoResponse {
    let stage = match StageId::parse(&slug) {
        Ok(stage) => stage,
        Err(e) => return stage_error_response(&e),
    };

    let mut pipeline = state.pipeline.write().await;
    let result = match stage {
        StageId::Revenue => pipeline
            .confirm_revenue()
            .map(|view| stage_view_response(stage, view.status, &view)),
        StageId::HumanCapital => pipeline
            .confirm_human_capital()
            .map(|view| stage_view_response(stage, view.status, &view)),
        StageId::TargetAcquisition => pipeline
            .confirm_target_acquisition()
            .map(|view| stage_view_response(stage, view.status, &view)),
        StageId::BdBaseline => pipeline
            .confirm_bd_baseline()
            .map(|view| stage_view_response(stage, view.status, &view)),
    };

    match result {
        Ok(response) => response,
        Err(e) => stage_error_response(&e),
    }
}

// =============================================================================
// FORMULA HANDLERS
// =============================================================================

/// Compute the growth coefficient from four component scores.
///
/// Scores are clamped to `[0, 100]` here, at the API boundary.
pub async fn coefficient_handler(Json(request): Json<CoefficientRequest>) -> impl IntoResponse {
    let input = request.clamped();
    let coefficient = calculate_growth_coefficient(&input);
    (
        StatusCode::OK,
        Json(CoefficientResponse::success(input, coefficient)),
    )
}

/// Compute BD ROI for a monthly channel spend.
pub async fn roi_handler(Json(request): Json<BdRoiInput>) -> impl IntoResponse {
    match calculate_bd_roi(&request) {
        Ok(roi) => (StatusCode::OK, Json(RoiResponse::success(roi))),
        Err(e) => (error_status(&e), Json(RoiResponse::error(e.to_string()))),
    }
}

/// Split a BD budget across the most efficient channels.
pub async fn allocation_handler(Json(request): Json<AllocationRequest>) -> impl IntoResponse {
    let allocation =
        calculate_optimal_bd_allocation(request.total_budget, request.target_customers);
    (StatusCode::OK, Json(AllocationResponse::success(allocation)))
}

/// Generate what-if growth scenarios.
pub async fn scenarios_handler(Json(request): Json<CoefficientRequest>) -> impl IntoResponse {
    let scenarios = generate_growth_scenarios(&request.clamped());
    (StatusCode::OK, Json(ScenariosResponse::success(scenarios)))
}

/// Rank growth components weakest-first.
pub async fn bottlenecks_handler(Json(request): Json<CoefficientRequest>) -> impl IntoResponse {
    let analysis = analyze_growth_bottlenecks(&request.clamped());
    (StatusCode::OK, Json(BottlenecksResponse::success(analysis)))
}
