//! # BD Baseline Stage
//!
//! Fourth pipeline stage: collects the current audience and spend
//! picture and derives the lead/customer funnel the marketing effort
//! is producing today. It reads no upstream baseline; its role is to
//! anchor the ROI and allocation formulas in observed numbers.

use serde::{Deserialize, Serialize};

use crate::channels::{Channel, LEAD_CONVERSION_RATE};
use crate::formulas::safe_div;

// =============================================================================
// RECORD
// =============================================================================

/// Source fields of the BD baseline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BdBaselineRecord {
    /// Followers across social accounts.
    pub social_followers: u64,
    /// Email list subscribers.
    pub email_list_size: u64,
    /// Monthly unique website visitors.
    pub website_traffic: u64,
    /// Leads currently in the pipeline.
    pub active_leads: u64,
    /// Current monthly marketing spend.
    pub monthly_spend: f64,
    /// Wire name of the primary channel (e.g. `"GOOGLE_ADS"`).
    pub primary_channel: String,
}

impl Default for BdBaselineRecord {
    fn default() -> Self {
        Self {
            social_followers: 0,
            email_list_size: 0,
            website_traffic: 0,
            active_leads: 0,
            monthly_spend: 0.0,
            primary_channel: Channel::GoogleAds.as_str().to_string(),
        }
    }
}

/// Partial edit of a [`BdBaselineRecord`]. Unknown fields are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BdBaselinePatch {
    pub social_followers: Option<u64>,
    pub email_list_size: Option<u64>,
    pub website_traffic: Option<u64>,
    pub active_leads: Option<u64>,
    pub monthly_spend: Option<f64>,
    pub primary_channel: Option<String>,
}

impl BdBaselineRecord {
    /// Merge a patch into this record, returning the new record.
    #[must_use]
    pub fn merged(&self, patch: &BdBaselinePatch) -> Self {
        Self {
            social_followers: patch.social_followers.unwrap_or(self.social_followers),
            email_list_size: patch.email_list_size.unwrap_or(self.email_list_size),
            website_traffic: patch.website_traffic.unwrap_or(self.website_traffic),
            active_leads: patch.active_leads.unwrap_or(self.active_leads),
            monthly_spend: patch.monthly_spend.unwrap_or(self.monthly_spend),
            primary_channel: patch
                .primary_channel
                .clone()
                .unwrap_or_else(|| self.primary_channel.clone()),
        }
    }
}

// =============================================================================
// CALCULATIONS
// =============================================================================

/// Derived fields of the BD baseline stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BdBaselineCalculations {
    /// Sum of the three reach fields.
    pub total_reach: u64,
    /// Estimated monthly leads from reach.
    pub monthly_leads: f64,
    /// Active leads over monthly leads; `0` when no leads.
    pub conversion_rate: f64,
    /// Estimated monthly customers.
    pub monthly_customers: f64,
    /// Spend per monthly lead; `0` when no leads.
    pub cost_per_lead: f64,
    /// Spend per monthly customer; `0` when no customers.
    pub cost_per_customer: f64,
}

/// Recompute the derived fields from a record.
#[must_use]
pub fn compute(record: &BdBaselineRecord) -> BdBaselineCalculations {
    let total_reach =
        record.social_followers + record.email_list_size + record.website_traffic;
    let monthly_leads = total_reach as f64 * LEAD_CONVERSION_RATE;

    // NOTE: this is a leads-to-leads ratio, not a true lead-to-customer
    // conversion rate in the economic sense used by the channel table.
    // The literal formula is preserved because changing it would change
    // user-visible output.
    let conversion_rate = safe_div(record.active_leads as f64, monthly_leads);
    let monthly_customers = monthly_leads * conversion_rate;

    BdBaselineCalculations {
        total_reach,
        monthly_leads,
        conversion_rate,
        monthly_customers,
        cost_per_lead: safe_div(record.monthly_spend, monthly_leads),
        cost_per_customer: safe_div(record.monthly_spend, monthly_customers),
    }
}

// =============================================================================
// PERSISTED DOCUMENTS
// =============================================================================

/// Draft document stored under `bdBaselineData`.
///
/// Unlike the other stages the draft carries no calculations; they
/// are recomputed on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BdBaselineDraft {
    pub baseline: BdBaselineRecord,
    pub timestamp: u64,
}

/// Confirmed snapshot stored under `bdBaselineConfirmed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BdBaselineConfirmed {
    pub baseline_data: BdBaselineRecord,
    pub calculations: BdBaselineCalculations,
    pub confirmed: bool,
    pub timestamp: u64,
}

// =============================================================================
// TESTS
// =============================================================================
