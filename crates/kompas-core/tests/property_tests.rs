//! # Property-Based Tests
//!
//! Verification tests using proptest for the formula library and the
//! stage recompute path.
//!
//! These tests ensure determinism and the scoring invariants that the
//! fixed-point unit tests cannot cover exhaustively.

use kompas_core::formulas::{
    calculate_bd_roi, calculate_growth_coefficient, calculate_optimal_bd_allocation,
    generate_growth_scenarios, safe_div,
};
use kompas_core::stages::revenue::{self, RevenuePatch, RevenueRecord};
use kompas_core::types::{GrowthCoefficientInput, PerformanceCategory};
use kompas_core::{BdRoiInput, Channel};
use proptest::prelude::*;

// =============================================================================
// STRATEGIES
// =============================================================================

fn score_input() -> impl Strategy<Value = GrowthCoefficientInput> {
    (0.0f64..=100.0, 0.0f64..=100.0, 0.0f64..=100.0, 0.0f64..=100.0).prop_map(
        |(bd, manpower, founder, growth)| GrowthCoefficientInput::new(bd, manpower, founder, growth),
    )
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// The same input always produces the same coefficient.
    #[test]
    fn coefficient_deterministic(input in score_input()) {
        let first = calculate_growth_coefficient(&input);
        let second = calculate_growth_coefficient(&input);
        prop_assert_eq!(first, second);
    }

    /// Total score stays within the weighted range.
    #[test]
    fn total_score_bounded(input in score_input()) {
        let coefficient = calculate_growth_coefficient(&input);
        prop_assert!(coefficient.total_score >= 0.0);
        prop_assert!(coefficient.total_score <= 100.0 + 1e-9);
    }

    /// The final coefficient never exceeds the total score and never
    /// goes negative.
    #[test]
    fn final_coefficient_within_total(input in score_input()) {
        let coefficient = calculate_growth_coefficient(&input);
        prop_assert!(coefficient.final_coefficient >= 0.0);
        prop_assert!(coefficient.final_coefficient <= coefficient.total_score + 1e-9);
    }

    /// Raising one component score never lowers the total.
    #[test]
    fn total_score_monotone_in_bd(
        input in score_input(),
        bump in 0.0f64..=50.0,
    ) {
        let raised = GrowthCoefficientInput::new(
            (input.business_development + bump).min(100.0),
            input.manpower_costs,
            input.founder_engagement,
            input.customer_growth,
        );
        let base = calculate_growth_coefficient(&input);
        let bumped = calculate_growth_coefficient(&raised);
        prop_assert!(bumped.total_score >= base.total_score - 1e-9);
    }

    /// Every total score lands in exactly one performance band.
    #[test]
    fn category_partition_is_total(score in 0.0f64..=100.0) {
        let category = PerformanceCategory::for_score(score);
        let matches = [
            (PerformanceCategory::Excellent, score >= 80.0),
            (PerformanceCategory::Good, (60.0..80.0).contains(&score)),
            (PerformanceCategory::Fair, (40.0..60.0).contains(&score)),
            (
                PerformanceCategory::NeedsImprovement,
                score < 40.0,
            ),
        ];
        for (band, expected) in matches {
            prop_assert_eq!(category == band, expected);
        }
    }

    /// `safe_div` never produces NaN; a zero denominator yields zero
    /// instead of the 0/0 NaN.
    #[test]
    fn safe_div_never_nan(
        numerator in -1.0e12f64..=1.0e12,
        denominator in -1.0e12f64..=1.0e12,
    ) {
        let quotient = safe_div(numerator, denominator);
        prop_assert!(!quotient.is_nan());
        if denominator == 0.0 {
            prop_assert_eq!(quotient, 0.0);
        }
    }

    /// ROI outputs are internally consistent for any spend and deal size.
    #[test]
    fn roi_internally_consistent(
        monthly_spend in 0.0f64..=1_000_000.0,
        average_deal_size in 0.0f64..=1_000_000.0,
        channel_index in 0usize..kompas_core::ALL_CHANNELS.len(),
    ) {
        let channel = kompas_core::ALL_CHANNELS[channel_index];
        let roi = calculate_bd_roi(&BdRoiInput {
            monthly_spend,
            primary_channel: channel.as_str().to_string(),
            average_deal_size,
        }).expect("known channel");

        // Funnel narrows with floor rounding at each step.
        let leads_upper = safe_div(monthly_spend, channel.metrics().cost_per_lead);
        prop_assert!((roi.leads_generated as f64) <= leads_upper + 1e-9);
        prop_assert!(roi.customers_acquired <= roi.leads_generated);

        let revenue = roi.customers_acquired as f64 * average_deal_size;
        prop_assert_eq!(roi.revenue_generated, revenue);
        prop_assert_eq!(roi.profit, revenue - monthly_spend);
    }

    /// Allocation shares always sum back to the input budget.
    #[test]
    fn allocation_conserves_budget(
        total_budget in 0.0f64..=10_000_000.0,
        target_customers in 0u64..100_000,
    ) {
        let allocation = calculate_optimal_bd_allocation(total_budget, target_customers);
        let allocated: f64 = allocation
            .allocations
            .iter()
            .map(|entry| entry.allocated_budget)
            .sum();
        prop_assert!((allocated - total_budget).abs() <= total_budget.abs() * 1e-9 + 1e-6);
    }

    /// Scenario generation always yields three fixed projections plus
    /// the caller's trajectory, in a fixed order.
    #[test]
    fn scenarios_fixed_shape(input in score_input()) {
        let scenarios = generate_growth_scenarios(&input);
        prop_assert_eq!(scenarios.len(), 4);
        prop_assert_eq!(&scenarios[0].name, "High Investment");
        prop_assert_eq!(&scenarios[1].name, "Balanced Approach");
        prop_assert_eq!(&scenarios[2].name, "Lean Growth");
        prop_assert_eq!(&scenarios[3].name, "Current Trajectory");
        prop_assert_eq!(scenarios[3].inputs, input);
    }

    /// An empty patch is the identity for the revenue stage.
    #[test]
    fn empty_patch_is_identity(
        gross in 0.0f64..=1.0e9,
        orders in 0.0f64..=10_000.0,
        customers in 0u64..1_000_000,
    ) {
        let record = RevenueRecord {
            product_name: "Widget".to_string(),
            avg_gross_per_unit: gross,
            avg_orders_per_month_per_customer: orders,
            total_customers: customers,
        };
        let merged = record.merged(&RevenuePatch::default());
        prop_assert_eq!(&merged, &record);
        prop_assert_eq!(revenue::compute(&merged), revenue::compute(&record));
    }

    /// Channel slugs round-trip through parse.
    #[test]
    fn channel_parse_round_trip(index in 0usize..kompas_core::ALL_CHANNELS.len()) {
        let channel = kompas_core::ALL_CHANNELS[index];
        prop_assert_eq!(Channel::parse(channel.as_str()).expect("parse"), channel);
    }
}
