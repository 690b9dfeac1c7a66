//! # Target Acquisition Stage
//!
//! Third pipeline stage: collects prior and target revenue and turns
//! the gap into required new units and customers, priced with the
//! unit economics of the confirmed revenue stage.

use serde::{Deserialize, Serialize};

use crate::formulas::safe_div;
use crate::stages::revenue::RevenueRecord;

// =============================================================================
// RECORD
// =============================================================================

/// Source fields of the target acquisition stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetAcquisitionRecord {
    /// Revenue over the previous period.
    pub previous_revenue: f64,
    /// Revenue target for the coming period.
    pub target_revenue: f64,
    /// Months available to close the gap.
    pub time_horizon_months: u64,
}

impl Default for TargetAcquisitionRecord {
    fn default() -> Self {
        Self {
            previous_revenue: 0.0,
            target_revenue: 0.0,
            time_horizon_months: 12,
        }
    }
}

/// Partial edit of a [`TargetAcquisitionRecord`]. Unknown fields are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TargetAcquisitionPatch {
    pub previous_revenue: Option<f64>,
    pub target_revenue: Option<f64>,
    pub time_horizon_months: Option<u64>,
}

impl TargetAcquisitionRecord {
    /// Merge a patch into this record, returning the new record.
    #[must_use]
    pub fn merged(&self, patch: &TargetAcquisitionPatch) -> Self {
        Self {
            previous_revenue: patch.previous_revenue.unwrap_or(self.previous_revenue),
            target_revenue: patch.target_revenue.unwrap_or(self.target_revenue),
            time_horizon_months: patch
                .time_horizon_months
                .unwrap_or(self.time_horizon_months),
        }
    }
}

// =============================================================================
// REVENUE BASELINE
// =============================================================================

/// Unit economics copied read-only from the confirmed revenue stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueBaseline {
    /// Average gross value of one unit.
    pub avg_unit_value: f64,
    /// Average units per customer per month.
    pub avg_units_per_customer: f64,
}

impl RevenueBaseline {
    /// Capture the baseline from a confirmed revenue record.
    #[must_use]
    pub fn from_revenue(record: &RevenueRecord) -> Self {
        Self {
            avg_unit_value: record.avg_gross_per_unit,
            avg_units_per_customer: record.avg_orders_per_month_per_customer,
        }
    }
}

// =============================================================================
// CALCULATIONS
// =============================================================================

/// Derived fields of the target acquisition stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetAcquisitionCalculations {
    /// Revenue gap between target and previous.
    pub increase_needed: f64,
    /// Gap as a percentage of previous revenue; `0` when previous is zero.
    pub growth_percent: f64,
    /// Units required to close the gap; `0` when unit value is zero.
    pub new_units_needed: f64,
    /// Customers required to sell those units.
    pub new_customers_needed: f64,
}

/// Recompute the derived fields from a record and the revenue baseline.
///
/// Callers pass `None` while revenue is unconfirmed and get no
/// calculations back.
#[must_use]
pub fn compute(
    record: &TargetAcquisitionRecord,
    baseline: Option<&RevenueBaseline>,
) -> Option<TargetAcquisitionCalculations> {
    let baseline = baseline?;

    let increase_needed = record.target_revenue - record.previous_revenue;
    let new_units_needed = safe_div(increase_needed, baseline.avg_unit_value);

    Some(TargetAcquisitionCalculations {
        increase_needed,
        growth_percent: safe_div(increase_needed, record.previous_revenue) * 100.0,
        new_units_needed,
        new_customers_needed: safe_div(new_units_needed, baseline.avg_units_per_customer),
    })
}

// =============================================================================
// PERSISTED DOCUMENT
// =============================================================================

/// Document stored under `targetAcquisitionData`.
///
/// This stage keeps a single document for both draft and confirmed
/// state; `confirmed` distinguishes the two.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetAcquisitionDocument {
    pub target_data: TargetAcquisitionRecord,
    pub revenue_baseline: Option<RevenueBaseline>,
    pub calculations: Option<TargetAcquisitionCalculations>,
    #[serde(default)]
    pub confirmed: bool,
    pub timestamp: u64,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline() -> RevenueBaseline {
        RevenueBaseline {
            avg_unit_value: 2500.0,
            avg_units_per_customer: 2.0,
        }
    }

    #[test]
    fn derived_fields_from_sample() {
        let record = TargetAcquisitionRecord {
            previous_revenue: 900_000.0,
            target_revenue: 1_350_000.0,
            time_horizon_months: 12,
        };
        let calcs = compute(&record, Some(&baseline())).expect("baseline present");

        assert_eq!(calcs.increase_needed, 450_000.0);
        assert_eq!(calcs.growth_percent, 50.0);
        assert_eq!(calcs.new_units_needed, 180.0);
        assert_eq!(calcs.new_customers_needed, 90.0);
    }

    #[test]
    fn zero_previous_revenue_growth_percent_is_zero() {
        let record = TargetAcquisitionRecord {
            previous_revenue: 0.0,
            target_revenue: 100_000.0,
            time_horizon_months: 12,
        };
        let calcs = compute(&record, Some(&baseline())).expect("baseline present");
        assert_eq!(calcs.growth_percent, 0.0);
        assert_eq!(calcs.increase_needed, 100_000.0);
    }

    #[test]
    fn shrinking_target_yields_negative_gap() {
        let record = TargetAcquisitionRecord {
            previous_revenue: 200_000.0,
            target_revenue: 150_000.0,
            time_horizon_months: 6,
        };
        let calcs = compute(&record, Some(&baseline())).expect("baseline present");
        assert_eq!(calcs.increase_needed, -50_000.0);
        assert_eq!(calcs.growth_percent, -25.0);
        assert_eq!(calcs.new_units_needed, -20.0);
    }

    #[test]
    fn missing_baseline_yields_no_calculations() {
        let record = TargetAcquisitionRecord::default();
        assert_eq!(compute(&record, None), None);
    }

    #[test]
    fn baseline_capture_from_revenue_record() {
        let revenue = RevenueRecord {
            product_name: "Widget".to_string(),
            avg_gross_per_unit: 99.0,
            avg_orders_per_month_per_customer: 4.0,
            total_customers: 10,
        };
        let captured = RevenueBaseline::from_revenue(&revenue);
        assert_eq!(captured.avg_unit_value, 99.0);
        assert_eq!(captured.avg_units_per_customer, 4.0);
    }

    #[test]
    fn empty_patch_is_identity() {
        let record = TargetAcquisitionRecord {
            previous_revenue: 1.0,
            target_revenue: 2.0,
            time_horizon_months: 3,
        };
        assert_eq!(record.merged(&TargetAcquisitionPatch::default()), record);
    }

    #[test]
    fn patch_rejects_unknown_fields() {
        let result: Result<TargetAcquisitionPatch, _> =
            serde_json::from_str(r#"{"targetRevenue": 5, "stretchGoal": 10}"#);
        assert!(result.is_err());
    }

    #[test]
    fn document_defaults_to_unconfirmed() {
        let json = r#"{
            "targetData": {"previousRevenue": 0.0, "targetRevenue": 0.0, "timeHorizonMonths": 12},
            "revenueBaseline": null,
            "calculations": null,
            "timestamp": 7
        }"#;
        let doc: TargetAcquisitionDocument = serde_json::from_str(json).expect("parse");
        assert!(!doc.confirmed);
    }
}
