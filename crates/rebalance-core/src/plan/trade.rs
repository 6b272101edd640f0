use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::allocation::{allocate_pro_rata, normalize_target_weights};
use crate::plan::{fee_amount, validate_assets, AssetInput, FeeProfile, ASSET_SOFT_LIMIT};
use crate::tax::{tax_amount, TaxProfile};
use crate::types::{with_metadata, ComputationOutput, Money, Percentage, WarningCode};
use crate::RebalanceResult;

/// Fixed bisection depth. Empirically sufficient to narrow a cent-level
/// search space for realistic portfolio sizes; the best-candidate tracking
/// below is the actual correctness guarantee.
const BISECTION_ITERATIONS: u32 = 40;

/// Input for the trade-based rebalancing plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebalancePlanInput {
    pub assets: Vec<AssetInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_profile: Option<TaxProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fees: Option<FeeProfile>,
}

/// Per-asset outcome of a trade plan. At most one of `buy_gross` and
/// `sell_gross` is non-zero: the signed delta against the target value is
/// folded into exactly one side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetTradeResult {
    pub id: String,
    pub target_value: Money,
    pub buy_gross: Money,
    pub sell_gross: Money,
    pub tax_on_sell: Money,
    pub fee_on_trade: Money,
    pub net_proceeds: Money,
}

/// Output of the trade-based rebalancing plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebalancePlanOutput {
    pub assets: Vec<AssetTradeResult>,
    pub total_buys: Money,
    pub total_sells_gross: Money,
    pub total_sell_net: Money,
    pub total_taxes_on_sell: Money,
    /// Cash the caller would still need to inject (residual balance < 0).
    pub cash_shortfall: Money,
    /// Cash left over after all buys are funded (residual balance ≥ 0).
    pub cash_surplus: Money,
}

struct PlanEvaluation {
    results: Vec<AssetTradeResult>,
    total_buys: Money,
    total_sells_gross: Money,
    total_sell_net: Money,
    total_taxes_on_sell: Money,
    cash_balance: Money,
}

/// Compute a self-funding buy/sell plan that moves every asset to its
/// target weight.
///
/// Searches for the target portfolio total whose net cash balance (sell
/// proceeds after tax and fees minus buys and buy-side fees) is zero.
/// The balance is not monotonic in the candidate total — per-asset
/// allocation rounding introduces cent-level jitter — so the bisection
/// narrows its bracket on the balance sign while independently keeping the
/// best candidate seen across all evaluated midpoints. Any residual is
/// surfaced as `cash_shortfall`/`cash_surplus`, never hidden.
pub fn calculate_rebalance_plan(
    input: &RebalancePlanInput,
) -> RebalanceResult<ComputationOutput<RebalancePlanOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<WarningCode> = Vec::new();

    validate_assets(&input.assets)?;

    let assumptions = serde_json::json!({
        "num_assets": input.assets.len(),
        "has_tax_profile": input.tax_profile.is_some(),
        "has_fees": input.fees.is_some(),
        "bisection_iterations": BISECTION_ITERATIONS,
    });

    if input.assets.is_empty() {
        let elapsed = start.elapsed().as_micros() as u64;
        return Ok(with_metadata(
            METHODOLOGY,
            &assumptions,
            vec![WarningCode::NoAssets],
            elapsed,
            RebalancePlanOutput {
                assets: Vec::new(),
                total_buys: Money::ZERO,
                total_sells_gross: Money::ZERO,
                total_sell_net: Money::ZERO,
                total_taxes_on_sell: Money::ZERO,
                cash_shortfall: Money::ZERO,
                cash_surplus: Money::ZERO,
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

    let mut low: i64 = 0;
    let mut high: i64 = total_gross.cents();
    let mut best = evaluate_at_target_total(
        &input.assets,
        &target_weights,
        input.tax_profile.as_ref(),
        input.fees.as_ref(),
        total_gross,
    )?;

    for _ in 0..BISECTION_ITERATIONS {
        // Floor midpoint; the bracket may legitimately probe below zero
        // once high underruns low.
        let mid = (low + high).div_euclid(2);
        let candidate = evaluate_at_target_total(
            &input.assets,
            &target_weights,
            input.tax_profile.as_ref(),
            input.fees.as_ref(),
            Money::from_cents(mid),
        )?;

        let candidate_balance = candidate.cash_balance;
        if candidate_balance.abs() < best.cash_balance.abs() {
            best = candidate;
        }

        // Bracket narrows on the candidate's sign regardless of whether it
        // became the best; the balance is only approximately monotonic.
        if candidate_balance.cents() >= 0 {
            low = mid + 1;
        } else {
            high = mid - 1;
        }
    }

    let cash_shortfall = if best.cash_balance.is_negative() {
        best.cash_balance.abs()
    } else {
        Money::ZERO
    };
    let cash_surplus = if best.cash_balance.is_negative() {
        Money::ZERO
    } else {
        best.cash_balance
    };

    if !cash_shortfall.is_zero() || !cash_surplus.is_zero() {
        warnings.push(WarningCode::TradePlanRoundingResidual);
    }

    let output = RebalancePlanOutput {
        assets: best.results,
        total_buys: best.total_buys,
        total_sells_gross: best.total_sells_gross,
        total_sell_net: best.total_sell_net,
        total_taxes_on_sell: best.total_taxes_on_sell,
        cash_shortfall,
        cash_surplus,
    };

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
    "Integer bisection over the target portfolio total, tracking the candidate \
     with the smallest absolute cash balance";

/// Evaluate the full plan for one candidate target portfolio total.
fn evaluate_at_target_total(
    assets: &[AssetInput],
    target_weights: &[Percentage],
    tax_profile: Option<&TaxProfile>,
    fees: Option<&FeeProfile>,
    target_total: Money,
) -> RebalanceResult<PlanEvaluation> {
    struct Interim {
        target_value: Money,
        buy_gross: Money,
        sell_gross: Money,
        fee_on_trade: Money,
        tax_base_raw: Money,
    }

    let mut interim: Vec<Interim> = Vec::with_capacity(assets.len());
    let mut total_buys = Money::ZERO;
    let mut total_sells_gross = Money::ZERO;
    let mut total_tax_base_raw = Money::ZERO;

    for (asset, weight) in assets.iter().zip(target_weights) {
        let target_value = target_total.mul_percentage(*weight);
        let delta = target_value - asset.market_value_gross;

        let (buy_gross, sell_gross) = if delta.is_negative() {
            (Money::ZERO, delta.abs())
        } else {
            (delta, Money::ZERO)
        };

        let fee_on_trade = fee_amount(if delta.is_negative() { sell_gross } else { buy_gross }, fees);

        let mut tax_base_raw = Money::ZERO;
        if !sell_gross.is_zero() {
            let unrealized_gain = asset.market_value_gross - asset.invested_capital();

            // Proportional gain recognition: the sold fraction realizes the
            // same fraction of the unrealized gain.
            let realized_gain = if asset.market_value_gross.is_zero() {
                Money::ZERO
            } else {
                sell_gross.mul_ratio(unrealized_gain.cents(), asset.market_value_gross.cents())?
            };

            // Losses are never taxed and never offset other assets' gains.
            let taxable_gain = if realized_gain.is_negative() {
                Money::ZERO
            } else {
                realized_gain
            };
            tax_base_raw = taxable_gain.mul_percentage(asset.partial_exemption().taxable_share());
        }

        total_buys += buy_gross;
        if !delta.is_negative() {
            total_buys += fee_on_trade;
        }
        total_sells_gross += sell_gross;
        total_tax_base_raw += tax_base_raw;

        interim.push(Interim {
            target_value,
            buy_gross,
            sell_gross,
            fee_on_trade,
            tax_base_raw,
        });
    }

    // The allowance is consumed once across the whole portfolio, then the
    // remaining taxable base is pushed back onto the assets pro rata. The
    // allocator conserves the total exactly, so no cent of taxable base
    // leaks or is double-counted.
    let allowance = tax_profile
        .map(|profile| profile.remaining_allowance)
        .unwrap_or(Money::ZERO);
    let taxable_after_allowance = (total_tax_base_raw.cents() - allowance.cents()).max(0);

    let raw_bases: Vec<i64> = interim.iter().map(|i| i.tax_base_raw.cents()).collect();
    let allocated_bases = allocate_pro_rata(&raw_bases, taxable_after_allowance);

    let mut results: Vec<AssetTradeResult> = Vec::with_capacity(assets.len());
    let mut total_sell_net = Money::ZERO;
    let mut total_taxes_on_sell = Money::ZERO;

    for ((asset, entry), allocated) in assets.iter().zip(interim).zip(allocated_bases) {
        let tax_on_sell = tax_amount(Money::from_cents(allocated), tax_profile);
        let net_proceeds = entry.sell_gross - tax_on_sell - entry.fee_on_trade;

        total_sell_net += net_proceeds;
        total_taxes_on_sell += tax_on_sell;

        results.push(AssetTradeResult {
            id: asset.id.clone(),
            target_value: entry.target_value,
            buy_gross: entry.buy_gross,
            sell_gross: entry.sell_gross,
            tax_on_sell,
            fee_on_trade: entry.fee_on_trade,
            net_proceeds,
        });
    }

    let cash_balance = total_sell_net - total_buys;

    Ok(PlanEvaluation {
        results,
        total_buys,
        total_sells_gross,
        total_sell_net,
        total_taxes_on_sell,
        cash_balance,
    })
}
