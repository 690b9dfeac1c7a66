//! # Human Capital Stage
//!
//! Second pipeline stage: collects team capacity inputs and compares
//! the hours the confirmed unit volume demands against the hours the
//! team can supply.
//!
//! The unit volume (`totalUnitsPerMonth`) is a read-only baseline
//! copied from the confirmed revenue stage. When revenue has never
//! been confirmed the baseline is absent and no calculations are
//! produced: a "complete the previous step" state, never a computed
//! zero that looks like a real value.

use serde::{Deserialize, Serialize};

use crate::formulas::safe_div;

/// Weeks per month used by the capacity formula.
const WEEKS_PER_MONTH: f64 = 4.0;

// =============================================================================
// RECORD
// =============================================================================

/// Source fields of the human capital stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanCapitalRecord {
    /// Team members excluding the founder.
    pub total_team_members: u64,
    /// Average weekly hours per team member.
    pub avg_hours_per_week: f64,
    /// Founder's own weekly hours.
    pub founder_hours_per_week: f64,
    /// Hours of work one unit of product requires.
    pub hours_per_unit: f64,
    /// Monthly contractor hours available.
    pub contractor_hours: f64,
}

impl Default for HumanCapitalRecord {
    fn default() -> Self {
        Self {
            total_team_members: 0,
            avg_hours_per_week: 0.0,
            founder_hours_per_week: 0.0,
            hours_per_unit: 0.0,
            contractor_hours: 0.0,
        }
    }
}

/// Partial edit of a [`HumanCapitalRecord`]. Unknown fields are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HumanCapitalPatch {
    pub total_team_members: Option<u64>,
    pub avg_hours_per_week: Option<f64>,
    pub founder_hours_per_week: Option<f64>,
    pub hours_per_unit: Option<f64>,
    pub contractor_hours: Option<f64>,
}

impl HumanCapitalRecord {
    /// Merge a patch into this record, returning the new record.
    #[must_use]
    pub fn merged(&self, patch: &HumanCapitalPatch) -> Self {
        Self {
            total_team_members: patch.total_team_members.unwrap_or(self.total_team_members),
            avg_hours_per_week: patch.avg_hours_per_week.unwrap_or(self.avg_hours_per_week),
            founder_hours_per_week: patch
                .founder_hours_per_week
                .unwrap_or(self.founder_hours_per_week),
            hours_per_unit: patch.hours_per_unit.unwrap_or(self.hours_per_unit),
            contractor_hours: patch.contractor_hours.unwrap_or(self.contractor_hours),
        }
    }
}

// =============================================================================
// CALCULATIONS
// =============================================================================

/// Derived fields of the human capital stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanCapitalCalculations {
    /// Monthly hours the confirmed unit volume demands.
    pub total_needed_hours: f64,
    /// Monthly hours the team can supply.
    pub total_capacity: f64,
    /// Needed over capacity; `0` when capacity is zero.
    pub utilization: f64,
    /// Spare (positive) or missing (negative) monthly hours.
    pub capacity_delta: f64,
}

/// Recompute the derived fields from a record and the revenue baseline.
///
/// `total_units_per_month` comes from the confirmed revenue stage;
/// callers pass `None` while revenue is unconfirmed and get no
/// calculations back.
#[must_use]
pub fn compute(
    record: &HumanCapitalRecord,
    total_units_per_month: Option<f64>,
) -> Option<HumanCapitalCalculations> {
    let units = total_units_per_month?;

    let total_needed_hours = record.hours_per_unit * units;
    let total_capacity = record.total_team_members as f64
        * record.avg_hours_per_week
        * WEEKS_PER_MONTH
        + record.founder_hours_per_week * WEEKS_PER_MONTH
        + record.contractor_hours;

    Some(HumanCapitalCalculations {
        total_needed_hours,
        total_capacity,
        utilization: safe_div(total_needed_hours, total_capacity),
        capacity_delta: total_capacity - total_needed_hours,
    })
}

// =============================================================================
// PERSISTED DOCUMENTS
// =============================================================================

/// Draft document stored under `humanCapitalData`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanCapitalDraft {
    pub human_capital_data: HumanCapitalRecord,
    /// Baseline captured from the confirmed revenue stage, if any.
    pub total_units_per_month: Option<f64>,
    pub calculations: Option<HumanCapitalCalculations>,
    pub timestamp: u64,
}

/// Confirmed snapshot stored under `humanCapitalConfirmed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanCapitalConfirmed {
    pub human_capital_data: HumanCapitalRecord,
    pub total_units_per_month: f64,
    pub calculations: HumanCapitalCalculations,
    pub confirmed: bool,
    pub timestamp: u64,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> HumanCapitalRecord {
        HumanCapitalRecord {
            total_team_members: 3,
            avg_hours_per_week: 40.0,
            founder_hours_per_week: 50.0,
            hours_per_unit: 8.0,
            contractor_hours: 60.0,
        }
    }

    #[test]
    fn derived_fields_with_baseline() {
        // Capacity: 3*40*4 + 50*4 + 60 = 740; needed: 8*30 = 240.
        let calcs = compute(&sample(), Some(30.0)).expect("baseline present");
        assert_eq!(calcs.total_needed_hours, 240.0);
        assert_eq!(calcs.total_capacity, 740.0);
        assert_eq!(calcs.capacity_delta, 500.0);
        assert_eq!(calcs.utilization, 240.0 / 740.0);
    }

    #[test]
    fn missing_baseline_yields_no_calculations() {
        assert_eq!(compute(&sample(), None), None);
    }

    #[test]
    fn zero_capacity_utilization_is_zero_not_infinity() {
        let record = HumanCapitalRecord {
            hours_per_unit: 8.0,
            ..HumanCapitalRecord::default()
        };
        let calcs = compute(&record, Some(30.0)).expect("baseline present");
        assert_eq!(calcs.total_capacity, 0.0);
        assert_eq!(calcs.utilization, 0.0);
        assert_eq!(calcs.capacity_delta, -240.0);
    }

    #[test]
    fn empty_patch_is_identity() {
        let record = sample();
        assert_eq!(record.merged(&HumanCapitalPatch::default()), record);
    }

    #[test]
    fn patch_merges_named_fields() {
        let merged = sample().merged(&HumanCapitalPatch {
            contractor_hours: Some(0.0),
            total_team_members: Some(4),
            ..HumanCapitalPatch::default()
        });
        assert_eq!(merged.contractor_hours, 0.0);
        assert_eq!(merged.total_team_members, 4);
        assert_eq!(merged.avg_hours_per_week, 40.0);
    }

    #[test]
    fn patch_rejects_unknown_fields() {
        let result: Result<HumanCapitalPatch, _> =
            serde_json::from_str(r#"{"hoursPerUnit": 2, "unitsPerHour": 3}"#);
        assert!(result.is_err());
    }

    #[test]
    fn draft_document_schema() {
        let record = sample();
        let draft = HumanCapitalDraft {
            calculations: compute(&record, Some(30.0)),
            total_units_per_month: Some(30.0),
            human_capital_data: record,
            timestamp: 1,
        };
        let json = serde_json::to_value(&draft).expect("serialize");
        assert!(json.get("humanCapitalData").is_some());
        assert_eq!(json["totalUnitsPerMonth"], 30.0);
        assert_eq!(json["calculations"]["totalNeededHours"], 240.0);
    }
}
