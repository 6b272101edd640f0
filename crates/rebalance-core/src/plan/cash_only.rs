use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::allocation::normalize_target_weights;
use crate::plan::{validate_assets, AssetInput, ASSET_SOFT_LIMIT};
use crate::types::{with_metadata, ComputationOutput, Money, Percentage, WarningCode};
use crate::RebalanceResult;

/// Fixed-point iteration cap. The loop exits early as soon as the required
/// cash stabilizes exactly (integer equality).
const FIXED_POINT_ITERATIONS: u32 = 100;

/// Input for the cash-injection-only plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashOnlyPlanInput {
    pub assets: Vec<AssetInput>,
}

/// A single buy-up-to-target amount (zero for assets already at or above
/// their target weight).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetBuy {
    pub id: String,
    pub buy_amount: Money,
}

/// Output of the cash-injection-only plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashOnlyPlanOutput {
    /// Minimum external cash injection that lets every asset reach its
    /// target weight without selling anything.
    pub cash_needed: Money,
    pub buys: Vec<AssetBuy>,
}

/// Compute the minimum cash injection that rebalances without sells.
///
/// The required cash enlarges the portfolio total, which moves every
/// target value, so the answer is a fixed point:
/// `cash_{n+1} = Σ max(0, target_value(total_gross + cash_n) − market_value)`.
pub fn calculate_cash_only_plan(
    input: &CashOnlyPlanInput,
) -> RebalanceResult<ComputationOutput<CashOnlyPlanOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<WarningCode> = Vec::new();

    validate_assets(&input.assets)?;

    let assumptions = serde_json::json!({
        "num_assets": input.assets.len(),
        "fixed_point_iterations": FIXED_POINT_ITERATIONS,
    });

    if input.assets.is_empty() {
        let elapsed = start.elapsed().as_micros() as u64;
        return Ok(with_metadata(
            METHODOLOGY,
            &assumptions,
            vec![WarningCode::NoAssets],
            elapsed,
            CashOnlyPlanOutput {
                cash_needed: Money::ZERO,
                buys: Vec::new(),
            },
        ));
    }

    if input.assets.len() > ASSET_SOFT_LIMIT {
        warnings.push(WarningCode::AssetLimitExceeded);
    }

    let total_gross: Money = input
        .assets
        .iter()
        .map(|asset| asset.market_value_gross)
        .sum();
    let target_weights: Vec<Percentage> = {
        let weights: Vec<Percentage> = input.assets.iter().map(|a| a.target_weight).collect();
        normalize_target_weights(&weights, &mut warnings)?
    };

    let mut cash_needed = Money::ZERO;
    for iteration in 0..FIXED_POINT_ITERATIONS {
        let required_cash = required_cash_at(&input.assets, &target_weights, total_gross + cash_needed);

        if required_cash == cash_needed {
            break;
        }
        cash_needed = required_cash;

        if iteration == FIXED_POINT_ITERATIONS - 1 {
            warnings.push(WarningCode::CashOnlyNotConverged);
        }
    }

    let target_total = total_gross + cash_needed;
    let buys = input
        .assets
        .iter()
        .zip(&target_weights)
        .map(|(asset, weight)| {
            let gap = target_total.mul_percentage(*weight) - asset.market_value_gross;
            AssetBuy {
                id: asset.id.clone(),
                buy_amount: if gap.is_negative() { Money::ZERO } else { gap },
            }
        })
        .collect();

    let output = CashOnlyPlanOutput { cash_needed, buys };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        METHODOLOGY,
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

const METHODOLOGY: &str =
    "Fixed-point iteration on the required cash injection with exact integer \
     stabilization";

fn required_cash_at(
    assets: &[AssetInput],
    target_weights: &[Percentage],
    target_total: Money,
) -> Money {
    assets
        .iter()
        .zip(target_weights)
        .map(|(asset, weight)| {
            let gap = target_total.mul_percentage(*weight) - asset.market_value_gross;
            if gap.is_negative() {
                Money::ZERO
            } else {
                gap
            }
        })
        .sum()
}

/// Whole months of saving needed to cover `cash_needed`, rounded up.
/// `None` when there are no monthly savings — no finite answer exists.
pub fn months_to_target(cash_needed: Money, monthly_savings: Money) -> Option<i64> {
    if monthly_savings.is_zero() {
        return None;
    }
    let quotient = cash_needed.cents().div_euclid(monthly_savings.cents());
    let remainder = cash_needed.cents().rem_euclid(monthly_savings.cents());
    Some(if remainder != 0 { quotient + 1 } else { quotient })
}
