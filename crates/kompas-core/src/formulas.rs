//! # Formula Library
//!
//! Pure, stateless growth formulas: the growth coefficient, BD ROI,
//! optimal budget allocation, scenario generation, and bottleneck
//! analysis. No state; inputs fully determine outputs.
//!
//! ## Division policy
//!
//! Several formulas divide by user-controlled quantities that can be
//! zero. The uniform policy, implemented by [`safe_div`], is to return
//! `0` rather than `NaN` or infinity: a renderable number over
//! mathematical honesty. This mirrors the observed behavior of the
//! assessments users already have and must not be "fixed" without
//! changing user-visible output.

use crate::channels::{ALL_CHANNELS, Channel};
use crate::types::{GrowthCoefficientInput, KompasError, PerformanceCategory};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

// =============================================================================
// COMPONENT WEIGHTS
// =============================================================================

/// Weight of the business-development component. Weights sum to 1.0.
pub const BD_WEIGHT: f64 = 0.4;

/// Weight of the human-capital (manpower) component.
pub const MANPOWER_WEIGHT: f64 = 0.3;

/// Weight of the founder-engagement component.
pub const FOUNDER_WEIGHT: f64 = 0.3;

// =============================================================================
// SAFE DIVISION
// =============================================================================

/// Divide, returning `0.0` when the denominator is zero.
///
/// This is the system-wide divide-by-zero policy (utilization, growth
/// percent, ROI, cost per lead/customer all route through here).
#[must_use]
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

// =============================================================================
// GROWTH COEFFICIENT
// =============================================================================

/// Weighted growth components in fixed declaration order.
///
/// The order (BD, HumanCapital, Founder) breaks ties in bottleneck
/// analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GrowthComponent {
    BusinessDevelopment,
    HumanCapital,
    FounderEngagement,
}

impl GrowthComponent {
    /// Display label for this component.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::BusinessDevelopment => "Business Development",
            Self::HumanCapital => "Human Capital",
            Self::FounderEngagement => "Founder Engagement",
        }
    }

    /// Fixed weight of this component.
    #[must_use]
    pub fn weight(&self) -> f64 {
        match self {
            Self::BusinessDevelopment => BD_WEIGHT,
            Self::HumanCapital => MANPOWER_WEIGHT,
            Self::FounderEngagement => FOUNDER_WEIGHT,
        }
    }

    /// Fixed improvement recommendation for this component.
    #[must_use]
    pub fn recommendation(&self) -> &'static str {
        match self {
            Self::BusinessDevelopment => {
                "Invest in repeatable lead generation: pick one channel and build a weekly cadence"
            }
            Self::HumanCapital => {
                "Reduce delivery cost per unit: document processes and delegate before hiring"
            }
            Self::FounderEngagement => {
                "Protect founder hours for growth work; delegate operations that others can run"
            }
        }
    }
}

/// One component's contribution to the growth coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentScore {
    /// Which component this is.
    pub component: GrowthComponent,
    /// The raw 0-100 input for this component.
    pub raw: f64,
    /// The fixed weight applied.
    pub weight: f64,
    /// Weighted contribution to the total score (`raw × weight`).
    pub weighted: f64,
}

/// Result of the growth coefficient calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthCoefficient {
    /// Weighted composite score on the 0-100 scale.
    pub total_score: f64,
    /// Total score scaled by expected customer growth.
    pub final_coefficient: f64,
    /// Weighted BD contribution.
    pub bd_score: f64,
    /// Weighted human-capital contribution.
    pub manpower_score: f64,
    /// Weighted founder-engagement contribution.
    pub founder_score: f64,
    /// Per-component breakdown in declaration order.
    pub breakdown: Vec<ComponentScore>,
}

/// Compute the weighted growth coefficient.
///
/// `total_score = 100 × (bd/100×0.4 + manpower/100×0.3 + founder/100×0.3)`
/// and `final_coefficient = total_score × customer_growth/100`.
///
/// Inputs are expected in `[0, 100]` and are NOT clamped here; the
/// caller clamps (see [`GrowthCoefficientInput::clamped`]). For inputs
/// in range, `final_coefficient ∈ [0, total_score]`, and it is zero
/// exactly when `customer_growth` is zero.
#[must_use]
pub fn calculate_growth_coefficient(input: &GrowthCoefficientInput) -> GrowthCoefficient {
    let components = [
        (GrowthComponent::BusinessDevelopment, input.business_development),
        (GrowthComponent::HumanCapital, input.manpower_costs),
        (GrowthComponent::FounderEngagement, input.founder_engagement),
    ];

    let breakdown: Vec<ComponentScore> = components
        .iter()
        .map(|&(component, raw)| ComponentScore {
            component,
            raw,
            weight: component.weight(),
            weighted: raw / 100.0 * component.weight() * 100.0,
        })
        .collect();

    let total_score: f64 = breakdown.iter().map(|c| c.weighted).sum();
    let final_coefficient = total_score * (input.customer_growth / 100.0);

    GrowthCoefficient {
        total_score,
        final_coefficient,
        bd_score: breakdown[0].weighted,
        manpower_score: breakdown[1].weighted,
        founder_score: breakdown[2].weighted,
        breakdown,
    }
}

// =============================================================================
// BD ROI
// =============================================================================

/// Input to the BD ROI calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BdRoiInput {
    /// Monthly spend on the primary channel.
    pub monthly_spend: f64,
    /// Wire name of the primary channel (e.g. `"GOOGLE_ADS"`).
    pub primary_channel: String,
    /// Average revenue from one closed deal.
    pub average_deal_size: f64,
}

/// Result of the BD ROI calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BdRoi {
    /// Leads the spend buys per month (floor of spend / cost per lead).
    pub leads_generated: u64,
    /// Customers those leads convert into (floored).
    pub customers_acquired: u64,
    /// Revenue from acquired customers.
    pub revenue_generated: f64,
    /// Revenue minus spend.
    pub profit: f64,
    /// Revenue over spend; `0` when spend is zero.
    pub roi: f64,
    /// Spend per acquired customer; `0` when no customers.
    pub cost_per_customer: f64,
    /// Ordered recommendation text: ROI band first, channel advice last.
    pub recommendations: Vec<String>,
}

/// Compute ROI for a monthly spend on a single channel.
///
/// Fails with [`KompasError::UnknownChannel`] when the channel name is
/// not in the reference table.
pub fn calculate_bd_roi(input: &BdRoiInput) -> Result<BdRoi, KompasError> {
    let channel = Channel::parse(&input.primary_channel)?;
    let metrics = channel.metrics();

    let leads_generated = (input.monthly_spend / metrics.cost_per_lead).floor() as u64;
    let customers_acquired = (leads_generated as f64 * metrics.conversion_rate).floor() as u64;
    let revenue_generated = customers_acquired as f64 * input.average_deal_size;
    let profit = revenue_generated - input.monthly_spend;
    let roi = safe_div(revenue_generated, input.monthly_spend);
    let cost_per_customer = safe_div(input.monthly_spend, customers_acquired as f64);

    let mut recommendations = roi_band_recommendations(roi);
    recommendations.push(channel.advice().to_string());

    Ok(BdRoi {
        leads_generated,
        customers_acquired,
        revenue_generated,
        profit,
        roi,
        cost_per_customer,
        recommendations,
    })
}

/// Fixed recommendation text per ROI band (`<2`, `2-4`, `>=4`).
///
/// Presentation text, not a scored ranking: the list is finite,
/// ordered, and reproduced verbatim.
fn roi_band_recommendations(roi: f64) -> Vec<String> {
    let lines: [&str; 2] = if roi >= 4.0 {
        [
            "ROI above 4x: strong unit economics; increase budget while the economics hold",
            "Document what works in this channel before diversifying into a second one",
        ]
    } else if roi >= 2.0 {
        [
            "ROI between 2x and 4x: solid baseline; scale spend gradually and watch cost per customer",
            "Test one adjacent channel with 10-15% of budget to find a second engine",
        ]
    } else {
        [
            "ROI below 2x: revisit channel targeting before adding spend",
            "Audit lead qualification; a low ROI usually means lead quality, not volume, is the problem",
        ]
    };
    lines.iter().map(|s| (*s).to_string()).collect()
}

// =============================================================================
// OPTIMAL BD ALLOCATION
// =============================================================================

/// Budget shares across the top-3 ranked channels, in rank order.
const ALLOCATION_SHARES: [f64; 3] = [0.5, 0.3, 0.2];

/// One channel's slice of the allocated budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelAllocation {
    /// The channel receiving this slice.
    pub channel: Channel,
    /// Efficiency score used for ranking.
    pub efficiency: f64,
    /// Budget allocated to this channel.
    pub allocated_budget: f64,
    /// Customers this slice buys (floor of budget / cost per customer).
    pub expected_customers: u64,
}

/// Ranked allocation of a BD budget across the reference channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BdAllocation {
    /// Top-3 channels by efficiency, descending.
    pub allocations: Vec<ChannelAllocation>,
    /// Sum of floor-rounded per-channel expected customers.
    pub total_expected_customers: u64,
    /// Whether the expected total meets the requested target.
    pub meets_target: bool,
}

/// Rank channels by `conversion_rate / (cost_per_customer / 1000)` and
/// split the budget 50/30/20 across the top three.
///
/// The descending sort is stable: channels with equal efficiency keep
/// their reference-table declaration order.
#[must_use]
pub fn calculate_optimal_bd_allocation(total_budget: f64, target_customers: u64) -> BdAllocation {
    let mut ranked: Vec<(Channel, f64)> = ALL_CHANNELS
        .iter()
        .map(|&channel| {
            let m = channel.metrics();
            (channel, safe_div(m.conversion_rate, m.cost_per_customer / 1000.0))
        })
        .collect();

    // Vec::sort_by is stable; equal keys keep declaration order.
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let allocations: Vec<ChannelAllocation> = ranked
        .iter()
        .take(ALLOCATION_SHARES.len())
        .zip(ALLOCATION_SHARES.iter())
        .map(|(&(channel, efficiency), &share)| {
            let allocated_budget = total_budget * share;
            let expected_customers =
                safe_div(allocated_budget, channel.metrics().cost_per_customer).floor() as u64;
            ChannelAllocation {
                channel,
                efficiency,
                allocated_budget,
                expected_customers,
            }
        })
        .collect();

    let total_expected_customers = allocations.iter().map(|a| a.expected_customers).sum();

    BdAllocation {
        allocations,
        total_expected_customers,
        meets_target: total_expected_customers >= target_customers,
    }
}

// =============================================================================
// GROWTH SCENARIOS
// =============================================================================

/// A named what-if scenario with its computed coefficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthScenario {
    /// Scenario name.
    pub name: String,
    /// The inputs this scenario assumes.
    pub inputs: GrowthCoefficientInput,
    /// The computed coefficient for those inputs.
    pub coefficient: GrowthCoefficient,
    /// Performance band of the final coefficient.
    pub category: PerformanceCategory,
}

/// Generate the four reference scenarios in fixed order.
///
/// Three fixed reference scenarios plus one built from the caller's
/// current inputs. The order is part of the contract and is never
/// re-sorted by score.
#[must_use]
pub fn generate_growth_scenarios(current: &GrowthCoefficientInput) -> Vec<GrowthScenario> {
    let fixed: [(&str, GrowthCoefficientInput); 3] = [
        (
            "High Investment",
            GrowthCoefficientInput::new(90.0, 80.0, 85.0, 75.0),
        ),
        (
            "Balanced Approach",
            GrowthCoefficientInput::new(70.0, 70.0, 70.0, 50.0),
        ),
        (
            "Lean Growth",
            GrowthCoefficientInput::new(50.0, 60.0, 80.0, 30.0),
        ),
    ];

    fixed
        .iter()
        .map(|(name, inputs)| build_scenario(name, *inputs))
        .chain(std::iter::once(build_scenario("Current Trajectory", *current)))
        .collect()
}

fn build_scenario(name: &str, inputs: GrowthCoefficientInput) -> GrowthScenario {
    let coefficient = calculate_growth_coefficient(&inputs);
    let category = PerformanceCategory::for_score(coefficient.final_coefficient);
    GrowthScenario {
        name: name.to_string(),
        inputs,
        coefficient,
        category,
    }
}

// =============================================================================
// BOTTLENECK ANALYSIS
// =============================================================================

/// Result of bottleneck analysis over the weighted components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BottleneckAnalysis {
    /// The component with the lowest weighted score.
    pub primary_bottleneck: ComponentScore,
    /// The remaining two components, ascending by weighted score.
    pub improvement_opportunities: Vec<ComponentScore>,
    /// Fixed recommendations: bottleneck first, then opportunities in
    /// ascending order.
    pub recommendations: Vec<String>,
}

/// Find the weakest weighted component.
///
/// Sorts the three weighted component scores ascending (stable sort:
/// ties keep the declaration order BD, HumanCapital, Founder). The
/// lowest is the bottleneck; the other two, still ascending, are
/// improvement opportunities.
#[must_use]
pub fn analyze_growth_bottlenecks(input: &GrowthCoefficientInput) -> BottleneckAnalysis {
    let mut scores = calculate_growth_coefficient(input).breakdown;
    scores.sort_by(|a, b| a.weighted.partial_cmp(&b.weighted).unwrap_or(Ordering::Equal));

    let recommendations = scores
        .iter()
        .map(|s| s.component.recommendation().to_string())
        .collect();

    let primary_bottleneck = scores[0];
    let improvement_opportunities = scores[1..].to_vec();

    BottleneckAnalysis {
        primary_bottleneck,
        improvement_opportunities,
        recommendations,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_div_zero_denominator_is_zero() {
        assert_eq!(safe_div(10.0, 0.0), 0.0);
        assert_eq!(safe_div(0.0, 0.0), 0.0);
        assert_eq!(safe_div(10.0, 4.0), 2.5);
    }

    #[test]
    fn weights_sum_to_one() {
        assert_eq!(BD_WEIGHT + MANPOWER_WEIGHT + FOUNDER_WEIGHT, 1.0);
    }

    #[test]
    fn coefficient_weighted_sum() {
        let input = GrowthCoefficientInput::new(80.0, 60.0, 70.0, 50.0);
        let result = calculate_growth_coefficient(&input);

        assert_eq!(result.bd_score, 32.0);
        assert_eq!(result.manpower_score, 18.0);
        assert_eq!(result.founder_score, 21.0);
        assert_eq!(result.total_score, 71.0);
        assert_eq!(result.final_coefficient, 35.5);
        assert_eq!(result.breakdown.len(), 3);
    }

    #[test]
    fn coefficient_zero_growth_zeroes_final() {
        let input = GrowthCoefficientInput::new(100.0, 100.0, 100.0, 0.0);
        let result = calculate_growth_coefficient(&input);
        assert_eq!(result.total_score, 100.0);
        assert_eq!(result.final_coefficient, 0.0);
    }

    #[test]
    fn coefficient_full_growth_equals_total() {
        let input = GrowthCoefficientInput::new(50.0, 50.0, 50.0, 100.0);
        let result = calculate_growth_coefficient(&input);
        assert_eq!(result.final_coefficient, result.total_score);
    }

    #[test]
    fn coefficient_does_not_clamp() {
        // Out-of-range input flows through unchanged; the caller clamps.
        let input = GrowthCoefficientInput::new(200.0, 0.0, 0.0, 100.0);
        let result = calculate_growth_coefficient(&input);
        assert_eq!(result.total_score, 80.0);
    }

    #[test]
    fn bd_roi_google_ads_fixture() {
        let input = BdRoiInput {
            monthly_spend: 5000.0,
            primary_channel: "GOOGLE_ADS".to_string(),
            average_deal_size: 10000.0,
        };
        let roi = calculate_bd_roi(&input).expect("known channel");

        assert_eq!(roi.leads_generated, 100);
        assert_eq!(roi.customers_acquired, 15);
        assert_eq!(roi.revenue_generated, 150_000.0);
        assert_eq!(roi.profit, 145_000.0);
        assert_eq!(roi.roi, 30.0);
        // Band >= 4 plus channel advice: three lines, band lines first.
        assert_eq!(roi.recommendations.len(), 3);
        assert!(roi.recommendations[0].starts_with("ROI above 4x"));
        assert!(roi.recommendations[2].starts_with("Google Ads"));
    }

    #[test]
    fn bd_roi_zero_spend_is_zero_not_nan() {
        let input = BdRoiInput {
            monthly_spend: 0.0,
            primary_channel: "GOOGLE_ADS".to_string(),
            average_deal_size: 10000.0,
        };
        let roi = calculate_bd_roi(&input).expect("known channel");

        assert_eq!(roi.leads_generated, 0);
        assert_eq!(roi.customers_acquired, 0);
        assert_eq!(roi.roi, 0.0);
        assert_eq!(roi.cost_per_customer, 0.0);
        assert_eq!(roi.profit, 0.0);
    }

    #[test]
    fn bd_roi_unknown_channel_fails() {
        let input = BdRoiInput {
            monthly_spend: 1000.0,
            primary_channel: "SKYWRITING".to_string(),
            average_deal_size: 500.0,
        };
        assert!(matches!(
            calculate_bd_roi(&input),
            Err(KompasError::UnknownChannel(_))
        ));
    }

    #[test]
    fn bd_roi_low_band_recommendations() {
        // Spend 5000 on email, deal size 100: 500 leads, 25 customers,
        // revenue 2500, roi 0.5 -> low band.
        let input = BdRoiInput {
            monthly_spend: 5000.0,
            primary_channel: "EMAIL_MARKETING".to_string(),
            average_deal_size: 100.0,
        };
        let roi = calculate_bd_roi(&input).expect("known channel");
        assert_eq!(roi.roi, 0.5);
        assert!(roi.recommendations[0].starts_with("ROI below 2x"));
    }

    #[test]
    fn bd_roi_middle_band_boundary_inclusive() {
        // Referrals, spend 1000: 200 leads, 60 customers. Deal size
        // chosen so revenue/spend lands exactly on 2.0.
        let input = BdRoiInput {
            monthly_spend: 1000.0,
            primary_channel: "REFERRALS".to_string(),
            average_deal_size: 2000.0 / 60.0,
        };
        let roi = calculate_bd_roi(&input).expect("known channel");
        assert_eq!(roi.roi, 2.0);
        assert!(roi.recommendations[0].starts_with("ROI between 2x and 4x"));
    }

    #[test]
    fn allocation_ranks_by_efficiency() {
        let allocation = calculate_optimal_bd_allocation(20_000.0, 50);

        // Referrals (18.0) > LinkedIn (0.533) > Google (0.45).
        assert_eq!(allocation.allocations.len(), 3);
        assert_eq!(allocation.allocations[0].channel, Channel::Referrals);
        assert_eq!(allocation.allocations[1].channel, Channel::LinkedinAds);
        assert_eq!(allocation.allocations[2].channel, Channel::GoogleAds);

        // 50/30/20 split.
        assert_eq!(allocation.allocations[0].allocated_budget, 10_000.0);
        assert_eq!(allocation.allocations[1].allocated_budget, 6_000.0);
        assert_eq!(allocation.allocations[2].allocated_budget, 4_000.0);

        // Floor-rounded per-channel customers: 599 + 16 + 12.
        assert_eq!(allocation.allocations[0].expected_customers, 599);
        assert_eq!(allocation.allocations[1].expected_customers, 16);
        assert_eq!(allocation.allocations[2].expected_customers, 12);
        assert_eq!(allocation.total_expected_customers, 627);
        assert!(allocation.meets_target);
    }

    #[test]
    fn allocation_target_not_met() {
        let allocation = calculate_optimal_bd_allocation(100.0, 1_000_000);
        assert!(!allocation.meets_target);
    }

    #[test]
    fn allocation_zero_budget() {
        let allocation = calculate_optimal_bd_allocation(0.0, 0);
        assert_eq!(allocation.total_expected_customers, 0);
        assert!(allocation.meets_target); // target of zero is met
    }

    #[test]
    fn scenarios_fixed_order_never_resorted() {
        let current = GrowthCoefficientInput::new(10.0, 10.0, 10.0, 100.0);
        let scenarios = generate_growth_scenarios(&current);

        assert_eq!(scenarios.len(), 4);
        assert_eq!(scenarios[0].name, "High Investment");
        assert_eq!(scenarios[1].name, "Balanced Approach");
        assert_eq!(scenarios[2].name, "Lean Growth");
        assert_eq!(scenarios[3].name, "Current Trajectory");
        assert_eq!(scenarios[3].inputs, current);
    }

    #[test]
    fn scenarios_annotated_with_category() {
        let scenarios =
            generate_growth_scenarios(&GrowthCoefficientInput::new(70.0, 70.0, 70.0, 50.0));
        for scenario in &scenarios {
            assert_eq!(
                scenario.category,
                PerformanceCategory::for_score(scenario.coefficient.final_coefficient)
            );
        }
    }

    #[test]
    fn bottleneck_lowest_weighted_component() {
        // bd 80 -> 32, manpower 60 -> 18, founder 70 -> 21.
        let input = GrowthCoefficientInput::new(80.0, 60.0, 70.0, 50.0);
        let analysis = analyze_growth_bottlenecks(&input);

        assert_eq!(
            analysis.primary_bottleneck.component,
            GrowthComponent::HumanCapital
        );
        assert_eq!(analysis.improvement_opportunities.len(), 2);
        assert_eq!(
            analysis.improvement_opportunities[0].component,
            GrowthComponent::FounderEngagement
        );
        assert_eq!(
            analysis.improvement_opportunities[1].component,
            GrowthComponent::BusinessDevelopment
        );
        assert_eq!(analysis.recommendations.len(), 3);
    }

    #[test]
    fn bottleneck_ties_keep_declaration_order() {
        // 75*0.4 = 30, 100*0.3 = 30, 100*0.3 = 30: full three-way tie.
        let input = GrowthCoefficientInput::new(75.0, 100.0, 100.0, 50.0);
        let analysis = analyze_growth_bottlenecks(&input);

        assert_eq!(
            analysis.primary_bottleneck.component,
            GrowthComponent::BusinessDevelopment
        );
        assert_eq!(
            analysis.improvement_opportunities[0].component,
            GrowthComponent::HumanCapital
        );
        assert_eq!(
            analysis.improvement_opportunities[1].component,
            GrowthComponent::FounderEngagement
        );
    }
}
