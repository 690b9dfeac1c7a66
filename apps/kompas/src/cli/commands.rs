//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api;
use kompas_core::{
    ALL_CHANNELS, BdRoiInput, GrowthCoefficientInput, KompasError, PerformanceCategory, Pipeline,
    StageId, StageStatus,
    formulas::{
        analyze_growth_bottlenecks, calculate_bd_roi, calculate_growth_coefficient,
        calculate_optimal_bd_allocation, generate_growth_scenarios,
    },
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::PathBuf;

// =============================================================================
// HELPERS
// =============================================================================

/// Load or create a pipeline from a database path with specified backend.
pub fn load_or_create_pipeline(db_path: &PathBuf, backend: &str) -> Result<Pipeline, KompasError> {
    match backend {
        "redb" => Pipeline::with_redb(db_path),
        "memory" => {
            tracing::warn!("Memory backend selected: edits will not survive this invocation");
            Ok(Pipeline::new())
        }
        other => Err(KompasError::StorageError(format!(
            "Unknown backend: {}. Use: redb, memory",
            other
        ))),
    }
}

/// Print a value as pretty JSON.
fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

/// Build a stage patch from `field=value` pairs.
///
/// Field names are the camelCase document fields. Values are parsed as
/// integers, then floats, then strings; an unknown field is rejected by
/// the patch's `deny_unknown_fields` rather than silently dropped.
fn patch_from_sets<T: DeserializeOwned>(sets: &[String]) -> Result<T, KompasError> {
    let mut fields = serde_json::Map::new();
    for pair in sets {
        let (field, raw) = pair.split_once('=').ok_or_else(|| {
            KompasError::DeserializationError(format!("Expected FIELD=VALUE, got '{}'", pair))
        })?;
        fields.insert(field.trim().to_string(), parse_scalar(raw.trim()));
    }
    serde_json::from_value(serde_json::Value::Object(fields))
        .map_err(|e| KompasError::DeserializationError(e.to_string()))
}

/// Parse a CLI value: integer, then float, then string.
fn parse_scalar(raw: &str) -> serde_json::Value {
    if let Ok(n) = raw.parse::<u64>() {
        return serde_json::Value::from(n);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return serde_json::Value::from(f);
    }
    serde_json::Value::String(raw.to_string())
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    db_path: &PathBuf,
    backend: &str,
    host: &str,
    port: u16,
) -> Result<(), KompasError> {
    let pipeline = load_or_create_pipeline(db_path, backend)?;

    println!("Kompas Growth Assessment Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", host);
    println!("  Port:     {}", port);
    println!("  Backend:  {}", backend);
    println!("  Database: {:?}", db_path);
    println!();
    println!("Endpoints:");
    println!("  GET  /health                - Health check");
    println!("  GET  /status                - Pipeline overview");
    println!("  GET  /stage/{{slug}}          - Show a stage");
    println!("  POST /stage/{{slug}}          - Merge a patch into a stage");
    println!("  POST /stage/{{slug}}/confirm  - Confirm a stage");
    println!("  POST /coefficient           - Growth coefficient");
    println!("  POST /roi                   - BD ROI");
    println!("  POST /allocation            - Optimal BD allocation");
    println!("  POST /scenarios             - Growth scenarios");
    println!("  POST /bottlenecks           - Bottleneck analysis");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, pipeline).await
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show pipeline status.
pub fn cmd_status(db_path: &PathBuf, backend: &str, json_mode: bool) -> Result<(), KompasError> {
    let pipeline = load_or_create_pipeline(db_path, backend)?;
    let overview = pipeline.overview()?;

    if json_mode {
        let output = serde_json::json!({
            "database": db_path.to_string_lossy(),
            "backend": backend,
            "stages": overview.stages,
        });
        print_json(&output);
        return Ok(());
    }

    println!("Kompas Pipeline Status");
    println!("======================");
    println!("Database: {:?}", db_path);
    println!("Backend:  {}", backend);
    println!();
    for stage in &overview.stages {
        println!("  {:<20} {}", stage.name, stage.status);
    }

    let next = overview
        .stages
        .iter()
        .find(|s| s.status != StageStatus::Confirmed);
    println!();
    match next {
        Some(stage) => println!("Next step: confirm the {} stage", stage.name),
        None => println!("Assessment complete: all stages confirmed"),
    }

    Ok(())
}

// =============================================================================
// SHOW COMMAND
// =============================================================================

/// Show one stage with its current calculations.
pub fn cmd_show(
    db_path: &PathBuf,
    backend: &str,
    json_mode: bool,
    stage: &str,
) -> Result<(), KompasError> {
    let stage = StageId::parse(stage)?;
    let mut pipeline = load_or_create_pipeline(db_path, backend)?;

    match stage {
        StageId::Revenue => {
            let view = pipeline.open_revenue()?;
            if json_mode {
                print_json(&view);
            } else {
                print_revenue(&view);
            }
        }
        StageId::HumanCapital => {
            let view = pipeline.open_human_capital()?;
            if json_mode {
                print_json(&view);
            } else {
                print_human_capital(&view);
            }
        }
        StageId::TargetAcquisition => {
            let view = pipeline.open_target_acquisition()?;
            if json_mode {
                print_json(&view);
            } else {
                print_target_acquisition(&view);
            }
        }
        StageId::BdBaseline => {
            let view = pipeline.open_bd_baseline()?;
            if json_mode {
                print_json(&view);
            } else {
                print_bd_baseline(&view);
            }
        }
    }

    Ok(())
}

fn print_revenue(view: &kompas_core::RevenueView) {
    println!("Revenue Stage [{}]", view.status);
    println!("====================");
    println!("  Product:             {}", view.record.product_name);
    println!("  Gross per Unit:      {}", view.record.avg_gross_per_unit);
    println!(
        "  Orders per Customer: {}/month",
        view.record.avg_orders_per_month_per_customer
    );
    println!("  Customers:           {}", view.record.total_customers);
    println!();
    println!("Calculations:");
    println!(
        "  Units per Month:  {}",
        view.calculations.total_units_per_month
    );
    println!("  Monthly Revenue:  {}", view.calculations.monthly_revenue);
    println!("  Annual Revenue:   {}", view.calculations.annual_revenue);
}

fn print_human_capital(view: &kompas_core::HumanCapitalView) {
    println!("Human Capital Stage [{}]", view.status);
    println!("====================");
    println!("  Team Members:      {}", view.record.total_team_members);
    println!(
        "  Hours per Week:    {} (founder: {})",
        view.record.avg_hours_per_week, view.record.founder_hours_per_week
    );
    println!("  Hours per Unit:    {}", view.record.hours_per_unit);
    println!("  Contractor Hours:  {}/month", view.record.contractor_hours);
    println!();
    match &view.calculations {
        Some(calcs) => {
            println!("Calculations:");
            println!("  Needed Hours:    {}/month", calcs.total_needed_hours);
            println!("  Capacity:        {}/month", calcs.total_capacity);
            println!("  Utilization:     {:.1}%", calcs.utilization * 100.0);
            println!("  Capacity Delta:  {}", calcs.capacity_delta);
        }
        None => println!("Confirm the Revenue stage to see capacity calculations."),
    }
}

fn print_target_acquisition(view: &kompas_core::TargetAcquisitionView) {
    println!("Target Acquisition Stage [{}]", view.status);
    println!("====================");
    println!("  Previous Revenue:  {}", view.record.previous_revenue);
    println!("  Target Revenue:    {}", view.record.target_revenue);
    println!(
        "  Time Horizon:      {} months",
        view.record.time_horizon_months
    );
    println!();
    match &view.calculations {
        Some(calcs) => {
            println!("Calculations:");
            println!("  Increase Needed:  {}", calcs.increase_needed);
            println!("  Growth:           {:.1}%", calcs.growth_percent);
            println!("  New Units:        {}", calcs.new_units_needed);
            println!("  New Customers:    {}", calcs.new_customers_needed);
        }
        None => println!("Confirm the Revenue stage to see target calculations."),
    }
}

fn print_bd_baseline(view: &kompas_core::BdBaselineView) {
    println!("BD Baseline Stage [{}]", view.status);
    println!("====================");
    println!("  Social Followers:  {}", view.record.social_followers);
    println!("  Email List:        {}", view.record.email_list_size);
    println!("  Website Traffic:   {}/month", view.record.website_traffic);
    println!("  Active Leads:      {}", view.record.active_leads);
    println!("  Monthly Spend:     {}", view.record.monthly_spend);
    println!("  Primary Channel:   {}", view.record.primary_channel);
    println!();
    println!("Calculations:");
    println!("  Total Reach:       {}", view.calculations.total_reach);
    println!("  Monthly Leads:     {}", view.calculations.monthly_leads);
    println!(
        "  Conversion Rate:   {:.1}%",
        view.calculations.conversion_rate * 100.0
    );
    println!("  Monthly Customers: {}", view.calculations.monthly_customers);
    println!("  Cost per Lead:     {}", view.calculations.cost_per_lead);
    println!("  Cost per Customer: {}", view.calculations.cost_per_customer);
}

// =============================================================================
// EDIT COMMAND
// =============================================================================

/// Merge field updates into a stage draft and persist it.
pub fn cmd_edit(
    db_path: &PathBuf,
    backend: &str,
    json_mode: bool,
    stage: &str,
    sets: &[String],
) -> Result<(), KompasError> {
    let stage = StageId::parse(stage)?;
    let mut pipeline = load_or_create_pipeline(db_path, backend)?;

    match stage {
        StageId::Revenue => {
            let patch = patch_from_sets(sets)?;
            let view = pipeline.update_revenue(&patch)?;
            pipeline.save_revenue_draft()?;
            if json_mode {
                print_json(&view);
            } else {
                print_revenue(&view);
            }
        }
        StageId::HumanCapital => {
            let patch = patch_from_sets(sets)?;
            let view = pipeline.update_human_capital(&patch)?;
            pipeline.save_human_capital_draft()?;
            if json_mode {
                print_json(&view);
            } else {
                print_human_capital(&view);
            }
        }
        StageId::TargetAcquisition => {
            let patch = patch_from_sets(sets)?;
            let view = pipeline.update_target_acquisition(&patch)?;
            pipeline.save_target_acquisition_draft()?;
            if json_mode {
                print_json(&view);
            } else {
                print_target_acquisition(&view);
            }
        }
        StageId::BdBaseline => {
            let patch = patch_from_sets(sets)?;
            let view = pipeline.update_bd_baseline(&patch)?;
            pipeline.save_bd_baseline_draft()?;
            if json_mode {
                print_json(&view);
            } else {
                print_bd_baseline(&view);
            }
        }
    }

    Ok(())
}

// =============================================================================
// CONFIRM COMMAND
// =============================================================================

/// Confirm a stage, publishing its baseline to downstream stages.
pub fn cmd_confirm(
    db_path: &PathBuf,
    backend: &str,
    json_mode: bool,
    stage: &str,
) -> Result<(), KompasError> {
    let stage = StageId::parse(stage)?;
    let mut pipeline = load_or_create_pipeline(db_path, backend)?;

    match stage {
        StageId::Revenue => {
            let view = pipeline.confirm_revenue()?;
            if json_mode {
                print_json(&view);
            } else {
                print_revenue(&view);
            }
        }
        StageId::HumanCapital => {
            let view = pipeline.confirm_human_capital()?;
            if json_mode {
                print_json(&view);
            } else {
                print_human_capital(&view);
            }
        }
        StageId::TargetAcquisition => {
            let view = pipeline.confirm_target_acquisition()?;
            if json_mode {
                print_json(&view);
            } else {
                print_target_acquisition(&view);
            }
        }
        StageId::BdBaseline => {
            let view = pipeline.confirm_bd_baseline()?;
            if json_mode {
                print_json(&view);
            } else {
                print_bd_baseline(&view);
            }
        }
    }

    if !json_mode {
        println!();
        match stage.next() {
            Some(next) => println!("Stage confirmed. Next: {}", next.name()),
            None => println!("Stage confirmed. Assessment complete."),
        }
    }

    Ok(())
}

// =============================================================================
// COEFFICIENT COMMAND
// =============================================================================

/// Compute the growth coefficient from four component scores.
///
/// Scores are clamped to `[0, 100]` here, at the application boundary;
/// the formula library never clamps.
pub fn cmd_coefficient(
    json_mode: bool,
    bd: f64,
    manpower: f64,
    founder: f64,
    growth: f64,
) -> Result<(), KompasError> {
    let input = GrowthCoefficientInput::new(bd, manpower, founder, growth).clamped();
    let coefficient = calculate_growth_coefficient(&input);
    let category = PerformanceCategory::for_score(coefficient.total_score);

    if json_mode {
        let output = serde_json::json!({
            "input": input,
            "coefficient": coefficient,
            "category": category.label(),
        });
        print_json(&output);
        return Ok(());
    }

    println!("Growth Coefficient");
    println!("==================");
    for component in &coefficient.breakdown {
        println!(
            "  {:<22} {:>5.1} x {:.0}% = {:.1}",
            component.component.label(),
            component.raw,
            component.weight * 100.0,
            component.weighted
        );
    }
    println!();
    println!("Total Score:       {:.1}", coefficient.total_score);
    println!("Final Coefficient: {:.1}", coefficient.final_coefficient);
    println!("Category:          {} - {}", category, category.description());

    Ok(())
}

// =============================================================================
// ROI COMMAND
// =============================================================================

/// Compute BD ROI for a monthly channel spend.
pub fn cmd_roi(
    json_mode: bool,
    spend: f64,
    channel: &str,
    deal_size: f64,
) -> Result<(), KompasError> {
    let roi = calculate_bd_roi(&BdRoiInput {
        monthly_spend: spend,
        primary_channel: channel.to_string(),
        average_deal_size: deal_size,
    })?;

    if json_mode {
        print_json(&roi);
        return Ok(());
    }

    println!("BD ROI ({})", channel);
    println!("==================");
    println!("  Leads Generated:    {}", roi.leads_generated);
    println!("  Customers Acquired: {}", roi.customers_acquired);
    println!("  Revenue Generated:  {}", roi.revenue_generated);
    println!("  Profit:             {}", roi.profit);
    println!("  ROI:                {:.2}x", roi.roi);
    println!("  Cost per Customer:  {:.2}", roi.cost_per_customer);
    println!();
    println!("Recommendations:");
    for line in &roi.recommendations {
        println!("  - {}", line);
    }

    Ok(())
}

// =============================================================================
// ALLOCATE COMMAND
// =============================================================================

/// Split a BD budget across the most efficient channels.
pub fn cmd_allocate(json_mode: bool, budget: f64, target: u64) -> Result<(), KompasError> {
    let allocation = calculate_optimal_bd_allocation(budget, target);

    if json_mode {
        print_json(&allocation);
        return Ok(());
    }

    println!("Optimal BD Allocation (budget {})", budget);
    println!("==================");
    for entry in &allocation.allocations {
        println!(
            "  {:<18} {:>12.2}  (~{} customers, efficiency {:.2})",
            entry.channel.display_name(),
            entry.allocated_budget,
            entry.expected_customers,
            entry.efficiency
        );
    }
    println!();
    println!(
        "Expected Customers: {} (target {})",
        allocation.total_expected_customers, target
    );
    println!(
        "Target Met:         {}",
        if allocation.meets_target { "yes" } else { "no" }
    );

    Ok(())
}

// =============================================================================
// SCENARIOS COMMAND
// =============================================================================

/// Generate what-if growth scenarios.
pub fn cmd_scenarios(
    json_mode: bool,
    bd: f64,
    manpower: f64,
    founder: f64,
    growth: f64,
) -> Result<(), KompasError> {
    let input = GrowthCoefficientInput::new(bd, manpower, founder, growth).clamped();
    let scenarios = generate_growth_scenarios(&input);

    if json_mode {
        print_json(&scenarios);
        return Ok(());
    }

    println!("Growth Scenarios");
    println!("==================");
    for scenario in &scenarios {
        println!();
        println!("{} [{}]", scenario.name, scenario.category);
        println!("  Total Score:       {:.1}", scenario.coefficient.total_score);
        println!(
            "  Final Coefficient: {:.1}",
            scenario.coefficient.final_coefficient
        );
    }

    Ok(())
}

// =============================================================================
// BOTTLENECKS COMMAND
// =============================================================================

/// Rank growth components weakest-first.
pub fn cmd_bottlenecks(
    json_mode: bool,
    bd: f64,
    manpower: f64,
    founder: f64,
    growth: f64,
) -> Result<(), KompasError> {
    let input = GrowthCoefficientInput::new(bd, manpower, founder, growth).clamped();
    let analysis = analyze_growth_bottlenecks(&input);

    if json_mode {
        print_json(&analysis);
        return Ok(());
    }

    println!("Growth Bottlenecks (weakest first)");
    println!("==================");
    println!(
        "  {:<22} raw {:>5.1}  weighted {:.1}   <- primary bottleneck",
        analysis.primary_bottleneck.component.label(),
        analysis.primary_bottleneck.raw,
        analysis.primary_bottleneck.weighted
    );
    for component in &analysis.improvement_opportunities {
        println!(
            "  {:<22} raw {:>5.1}  weighted {:.1}",
            component.component.label(),
            component.raw,
            component.weighted
        );
    }
    println!();
    println!("Recommendations:");
    for line in &analysis.recommendations {
        println!("  - {}", line);
    }

    Ok(())
}

// =============================================================================
// CHANNELS COMMAND
// =============================================================================

/// Show the marketing channel reference table.
pub fn cmd_channels(json_mode: bool) -> Result<(), KompasError> {
    if json_mode {
        let output: Vec<serde_json::Value> = ALL_CHANNELS
            .iter()
            .map(|channel| {
                let m = channel.metrics();
                serde_json::json!({
                    "channel": channel.as_str(),
                    "displayName": channel.display_name(),
                    "costPerLead": m.cost_per_lead,
                    "conversionRate": m.conversion_rate,
                    "costPerCustomer": m.cost_per_customer,
                })
            })
            .collect();
        print_json(&output);
        return Ok(());
    }

    println!("Marketing Channel Reference");
    println!("==================");
    println!(
        "  {:<18} {:>12} {:>12} {:>14}",
        "Channel", "Cost/Lead", "Conversion", "Cost/Customer"
    );
    for channel in &ALL_CHANNELS {
        let m = channel.metrics();
        println!(
            "  {:<18} {:>12.2} {:>11.0}% {:>14.2}",
            channel.display_name(),
            m.cost_per_lead,
            m.conversion_rate * 100.0,
            m.cost_per_customer
        );
    }

    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize new assessment database.
pub fn cmd_init(db_path: &PathBuf, backend: &str, force: bool) -> Result<(), KompasError> {
    if db_path.exists() {
        if !force {
            return Err(KompasError::StorageError(
                "Database already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(db_path)
            .map_err(|e| KompasError::IoError(format!("Remove database: {}", e)))?;
    }

    match backend {
        "redb" => {
            let _pipeline = Pipeline::with_redb(db_path)?;
            println!("Initialized new redb database at {:?}", db_path);
        }
        "memory" => {
            println!("Memory backend holds no files; nothing to initialize");
        }
        other => {
            return Err(KompasError::StorageError(format!(
                "Unknown backend: {}. Use: redb, memory",
                other
            )));
        }
    }

    Ok(())
}
