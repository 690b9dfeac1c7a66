//! # Revenue Stage
//!
//! First pipeline stage: collects unit economics and derives monthly
//! and annual revenue plus unit volume. Its confirmed output is the
//! baseline every later stage builds on.

use serde::{Deserialize, Serialize};

// =============================================================================
// RECORD
// =============================================================================

/// Source fields of the revenue stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueRecord {
    /// Name of the main product or service.
    pub product_name: String,
    /// Average gross revenue per unit sold.
    pub avg_gross_per_unit: f64,
    /// Average orders per month per customer.
    pub avg_orders_per_month_per_customer: f64,
    /// Current number of customers.
    pub total_customers: u64,
}

impl Default for RevenueRecord {
    fn default() -> Self {
        Self {
            product_name: String::new(),
            avg_gross_per_unit: 0.0,
            avg_orders_per_month_per_customer: 0.0,
            total_customers: 0,
        }
    }
}

/// Partial edit of a [`RevenueRecord`]. Unknown fields are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RevenuePatch {
    pub product_name: Option<String>,
    pub avg_gross_per_unit: Option<f64>,
    pub avg_orders_per_month_per_customer: Option<f64>,
    pub total_customers: Option<u64>,
}

impl RevenueRecord {
    /// Merge a patch into this record, returning the new record.
    #[must_use]
    pub fn merged(&self, patch: &RevenuePatch) -> Self {
        Self {
            product_name: patch
                .product_name
                .clone()
                .unwrap_or_else(|| self.product_name.clone()),
            avg_gross_per_unit: patch.avg_gross_per_unit.unwrap_or(self.avg_gross_per_unit),
            avg_orders_per_month_per_customer: patch
                .avg_orders_per_month_per_customer
                .unwrap_or(self.avg_orders_per_month_per_customer),
            total_customers: patch.total_customers.unwrap_or(self.total_customers),
        }
    }
}

// =============================================================================
// CALCULATIONS
// =============================================================================

/// Derived fields of the revenue stage.
///
/// Always recomputed from source fields, never stored as
/// independently-editable state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueCalculations {
    /// Units sold per month: orders per customer times customers.
    pub total_units_per_month: f64,
    /// Gross revenue per month.
    pub monthly_revenue: f64,
    /// Monthly revenue annualized.
    pub annual_revenue: f64,
}

/// Recompute the derived fields from a record.
#[must_use]
pub fn compute(record: &RevenueRecord) -> RevenueCalculations {
    let total_units_per_month =
        record.avg_orders_per_month_per_customer * record.total_customers as f64;
    let monthly_revenue = record.avg_gross_per_unit * total_units_per_month;
    RevenueCalculations {
        total_units_per_month,
        monthly_revenue,
        annual_revenue: monthly_revenue * 12.0,
    }
}

// =============================================================================
// PERSISTED DOCUMENTS
// =============================================================================

/// Draft document stored under `revenueData`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueDraft {
    pub revenue_data: RevenueRecord,
    pub calculations: RevenueCalculations,
    pub timestamp: u64,
}

/// Confirmed snapshot stored under `revenueConfirmed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueConfirmed {
    pub revenue_data: RevenueRecord,
    pub calculations: RevenueCalculations,
    pub confirmed: bool,
    pub timestamp: u64,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RevenueRecord {
        RevenueRecord {
            product_name: "Consulting retainer".to_string(),
            avg_gross_per_unit: 2500.0,
            avg_orders_per_month_per_customer: 2.0,
            total_customers: 15,
        }
    }

    #[test]
    fn derived_fields_from_sample() {
        let calcs = compute(&sample());
        assert_eq!(calcs.total_units_per_month, 30.0);
        assert_eq!(calcs.monthly_revenue, 75_000.0);
        assert_eq!(calcs.annual_revenue, 900_000.0);
    }

    #[test]
    fn annual_is_exactly_twelve_monthly() {
        let record = RevenueRecord {
            product_name: "Widget".to_string(),
            avg_gross_per_unit: 19.99,
            avg_orders_per_month_per_customer: 3.5,
            total_customers: 123,
        };
        let calcs = compute(&record);
        assert_eq!(calcs.annual_revenue, calcs.monthly_revenue * 12.0);
        assert_eq!(
            calcs.monthly_revenue,
            19.99 * 3.5 * 123.0
        );
    }

    #[test]
    fn recompute_has_no_drift() {
        let record = sample();
        let first = compute(&record);
        for _ in 0..100 {
            assert_eq!(compute(&record), first);
        }
    }

    #[test]
    fn empty_patch_is_identity() {
        let record = sample();
        let merged = record.merged(&RevenuePatch::default());
        assert_eq!(merged, record);
        assert_eq!(compute(&merged), compute(&record));
    }

    #[test]
    fn patch_replaces_only_named_fields() {
        let record = sample();
        let patch = RevenuePatch {
            total_customers: Some(20),
            ..RevenuePatch::default()
        };
        let merged = record.merged(&patch);
        assert_eq!(merged.total_customers, 20);
        assert_eq!(merged.avg_gross_per_unit, 2500.0);
        assert_eq!(compute(&merged).total_units_per_month, 40.0);
    }

    #[test]
    fn patch_rejects_unknown_fields() {
        let result: Result<RevenuePatch, _> =
            serde_json::from_str(r#"{"totalCustomers": 5, "favoriteColor": "red"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn default_record_is_placeholder_zeros() {
        let calcs = compute(&RevenueRecord::default());
        assert_eq!(calcs.total_units_per_month, 0.0);
        assert_eq!(calcs.monthly_revenue, 0.0);
        assert_eq!(calcs.annual_revenue, 0.0);
    }

    #[test]
    fn draft_document_schema() {
        let record = sample();
        let draft = RevenueDraft {
            calculations: compute(&record),
            revenue_data: record,
            timestamp: 1_700_000_000_000,
        };
        let json = serde_json::to_value(&draft).expect("serialize");
        assert!(json.get("revenueData").is_some());
        assert!(json.get("calculations").is_some());
        assert_eq!(json["calculations"]["totalUnitsPerMonth"], 30.0);
        assert_eq!(json["revenueData"]["avgGrossPerUnit"], 2500.0);
    }
}
