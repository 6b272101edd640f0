use napi::Result as NapiResult;
use napi_derive::napi;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Rebalancing plans
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_rebalance_plan(input_json: String) -> NapiResult<String> {
    let input: rebalance_core::plan::trade::RebalancePlanInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        rebalance_core::plan::trade::calculate_rebalance_plan(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_cash_only_plan(input_json: String) -> NapiResult<String> {
    let input: rebalance_core::plan::cash_only::CashOnlyPlanInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = rebalance_core::plan::cash_only::calculate_cash_only_plan(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_rebalance_overview(input_json: String) -> NapiResult<String> {
    let input: rebalance_core::plan::overview::RebalanceOverviewInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = rebalance_core::plan::overview::calculate_rebalance_overview(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Savings horizon
// ---------------------------------------------------------------------------

#[derive(serde::Deserialize)]
struct MonthsToTargetBindingInput {
    cash_needed: rebalance_core::Money,
    monthly_savings: rebalance_core::Money,
}

#[napi]
pub fn months_to_target(input_json: String) -> NapiResult<String> {
    let binding_input: MonthsToTargetBindingInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let months = rebalance_core::plan::months_to_target(
        binding_input.cash_needed,
        binding_input.monthly_savings,
    );
    serde_json::to_string(&serde_json::json!({ "months": months })).map_err(to_napi_error)
}
