use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::plan::cash_only::{calculate_cash_only_plan, AssetBuy, CashOnlyPlanInput};
use crate::plan::trade::{calculate_rebalance_plan, RebalancePlanInput};
use crate::plan::{AssetInput, FeeProfile};
use crate::tax::TaxProfile;
use crate::types::{with_metadata, ComputationOutput, Money, WarningCode};
use crate::RebalanceResult;

/// Input for the two-strategy rebalance overview
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebalanceOverviewInput {
    pub assets: Vec<AssetInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_profile: Option<TaxProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fees: Option<FeeProfile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

/// One user-facing action: what to do with a single asset and for how much.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebalanceAction {
    pub id: String,
    pub action: TradeAction,
    pub amount: Money,
}

/// Option A: reach the targets purely with new cash, never selling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashOnlyOption {
    pub cash_needed: Money,
    pub buys: Vec<AssetBuy>,
    pub actions: Vec<RebalanceAction>,
    pub warnings: Vec<WarningCode>,
}

/// Option B: trade existing holdings, paying taxes and fees as needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeOption {
    pub cash_shortfall: Money,
    pub cash_surplus: Money,
    pub total_taxes_on_sell: Money,
    pub actions: Vec<RebalanceAction>,
    pub warnings: Vec<WarningCode>,
}

/// Both rebalancing strategies side by side, ready for presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebalanceOverview {
    pub cash_only: CashOnlyOption,
    pub trade: TradeOption,
}

/// Run both optimizers on the same holdings and reduce each plan to
/// BUY/SELL/HOLD actions. Warnings stay attached to the option that raised
/// them; the envelope carries their concatenation.
pub fn calculate_rebalance_overview(
    input: &RebalanceOverviewInput,
) -> RebalanceResult<ComputationOutput<RebalanceOverview>> {
    let start = Instant::now();

    let trade_plan = calculate_rebalance_plan(&RebalancePlanInput {
        assets: input.assets.clone(),
        tax_profile: input.tax_profile.clone(),
        fees: input.fees.clone(),
    })?;

    let cash_only_plan = calculate_cash_only_plan(&CashOnlyPlanInput {
        assets: input.assets.clone(),
    })?;

    let cash_only_actions = cash_only_plan
        .result
        .buys
        .iter()
        .map(|buy| RebalanceAction {
            id: buy.id.clone(),
            action: if buy.buy_amount.is_zero() {
                TradeAction::Hold
            } else {
                TradeAction::Buy
            },
            amount: buy.buy_amount,
        })
        .collect();

    let trade_actions = trade_plan
        .result
        .assets
        .iter()
        .map(|asset| {
            if !asset.buy_gross.is_zero() {
                RebalanceAction {
                    id: asset.id.clone(),
                    action: TradeAction::Buy,
                    amount: asset.buy_gross,
                }
            } else if !asset.sell_gross.is_zero() {
                RebalanceAction {
                    id: asset.id.clone(),
                    action: TradeAction::Sell,
                    amount: asset.sell_gross,
                }
            } else {
                RebalanceAction {
                    id: asset.id.clone(),
                    action: TradeAction::Hold,
                    amount: Money::ZERO,
                }
            }
        })
        .collect();

    let mut warnings = cash_only_plan.warnings.clone();
    warnings.extend(trade_plan.warnings.iter().copied());

    let overview = RebalanceOverview {
        cash_only: CashOnlyOption {
            cash_needed: cash_only_plan.result.cash_needed,
            buys: cash_only_plan.result.buys,
            actions: cash_only_actions,
            warnings: cash_only_plan.warnings,
        },
        trade: TradeOption {
            cash_shortfall: trade_plan.result.cash_shortfall,
            cash_surplus: trade_plan.result.cash_surplus,
            total_taxes_on_sell: trade_plan.result.total_taxes_on_sell,
            actions: trade_actions,
            warnings: trade_plan.warnings,
        },
    };

    let assumptions = serde_json::json!({
        "num_assets": input.assets.len(),
        "has_tax_profile": input.tax_profile.is_some(),
        "has_fees": input.fees.is_some(),
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Side-by-side cash-only and trade rebalancing strategies",
        &assumptions,
        warnings,
        elapsed,
        overview,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tax::PartialExemptionRate;
    use crate::types::Percentage;
    use rust_decimal_macros::dec;

    fn pct(value: rust_decimal::Decimal) -> Percentage {
        Percentage::from_percent(value).unwrap()
    }

    #[test]
    fn test_returns_both_options() {
        let overview = calculate_rebalance_overview(&RebalanceOverviewInput {
            assets: vec![
                AssetInput {
                    id: "A".to_string(),
                    market_value_gross: Money::from_cents(700_000),
                    target_weight: pct(dec!(70)),
                    invested_capital: None,
                    partial_exemption: None,
                },
                AssetInput {
                    id: "B".to_string(),
                    market_value_gross: Money::from_cents(300_000),
                    target_weight: pct(dec!(30)),
                    invested_capital: None,
                    partial_exemption: None,
                },
            ],
            tax_profile: None,
            fees: None,
        })
        .unwrap();

        let result = &overview.result;
        assert_eq!(result.trade.actions.len(), 2);
        assert_eq!(result.cash_only.cash_needed, Money::ZERO);
        assert!(result
            .trade
            .actions
            .iter()
            .all(|a| a.action == TradeAction::Hold));
    }

    #[test]
    fn test_trade_option_oversells_to_cover_taxes() {
        let overview = calculate_rebalance_overview(&RebalanceOverviewInput {
            assets: vec![
                AssetInput {
                    id: "alpha".to_string(),
                    market_value_gross: Money::from_cents(70_000),
                    target_weight: pct(dec!(72)),
                    invested_capital: Some(Money::from_cents(65_000)),
                    partial_exemption: Some(PartialExemptionRate::from_percent(15).unwrap()),
                },
                AssetInput {
                    id: "bravo".to_string(),
                    market_value_gross: Money::from_cents(30_000),
                    target_weight: pct(dec!(28)),
                    invested_capital: Some(Money::from_cents(20_000)),
                    partial_exemption: Some(PartialExemptionRate::from_percent(15).unwrap()),
                },
            ],
            tax_profile: Some(
                crate::tax::TaxProfile::new(pct(dec!(25)))
                    .with_solidarity_surcharge(pct(dec!(5.5))),
            ),
            fees: None,
        })
        .unwrap();

        let trade = &overview.result.trade;
        let alpha = trade.actions.iter().find(|a| a.id == "alpha").unwrap();
        let bravo = trade.actions.iter().find(|a| a.id == "bravo").unwrap();

        assert_eq!(alpha.action, TradeAction::Buy);
        assert_eq!(bravo.action, TradeAction::Sell);
        // bravo's sale funds alpha's purchase plus the tax bill.
        assert!(bravo.amount > alpha.amount);
        assert!(trade.total_taxes_on_sell.cents() > 0);

        let residual = trade.cash_shortfall.cents() + trade.cash_surplus.cents();
        assert!(residual <= 1, "residual was {residual} cents");
    }
}
