use clap::Args;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;

use rebalance_core::plan::cash_only::{calculate_cash_only_plan, CashOnlyPlanInput};
use rebalance_core::plan::months_to_target;
use rebalance_core::plan::overview::{calculate_rebalance_overview, RebalanceOverviewInput};
use rebalance_core::plan::trade::{calculate_rebalance_plan, RebalancePlanInput};
use rebalance_core::Money;

use crate::input;

/// Arguments for the trade-based rebalancing plan
#[derive(Args)]
pub struct TradePlanArgs {
    /// Path to a JSON/YAML plan input file (reads stdin JSON if omitted)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the cash-injection-only plan
#[derive(Args)]
pub struct CashOnlyArgs {
    /// Path to a JSON/YAML plan input file (reads stdin JSON if omitted)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the side-by-side overview of both strategies
#[derive(Args)]
pub struct OverviewArgs {
    /// Path to a JSON/YAML plan input file (reads stdin JSON if omitted)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the savings-horizon helper
#[derive(Args)]
pub struct MonthsToTargetArgs {
    /// Cash requirement in major currency units (e.g. "1250.00")
    #[arg(long)]
    pub cash_needed: Decimal,

    /// Savings per month in major currency units
    #[arg(long)]
    pub monthly_savings: Decimal,
}

fn load_input<T: DeserializeOwned>(path: &Option<String>) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        input::file::read_input(path)
    } else if let Some(value) = input::stdin::read_stdin()? {
        Ok(serde_json::from_value(value)?)
    } else {
        Err("Provide --input file or pipe JSON via stdin".into())
    }
}

pub fn run_trade_plan(args: TradePlanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let plan_input: RebalancePlanInput = load_input(&args.input)?;
    let output = calculate_rebalance_plan(&plan_input)?;
    Ok(serde_json::to_value(output)?)
}

pub fn run_cash_only(args: CashOnlyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let plan_input: CashOnlyPlanInput = load_input(&args.input)?;
    let output = calculate_cash_only_plan(&plan_input)?;
    Ok(serde_json::to_value(output)?)
}

pub fn run_overview(args: OverviewArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let overview_input: RebalanceOverviewInput = load_input(&args.input)?;
    let output = calculate_rebalance_overview(&overview_input)?;
    Ok(serde_json::to_value(output)?)
}

pub fn run_months_to_target(args: MonthsToTargetArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let cash_needed = Money::from_decimal(args.cash_needed)?;
    let monthly_savings = Money::from_decimal(args.monthly_savings)?;

    let months = months_to_target(cash_needed, monthly_savings);

    Ok(serde_json::json!({
        "result": {
            "months": months,
            "cash_needed": cash_needed,
            "monthly_savings": monthly_savings,
        }
    }))
}
