pub mod cash_only;
pub mod overview;
pub mod trade;

use serde::{Deserialize, Serialize};

use crate::error::RebalanceError;
use crate::tax::PartialExemptionRate;
use crate::types::{Money, Percentage};
use crate::RebalanceResult;

pub use cash_only::{calculate_cash_only_plan, months_to_target, CashOnlyPlanInput};
pub use overview::{calculate_rebalance_overview, RebalanceOverviewInput};
pub use trade::{calculate_rebalance_plan, RebalancePlanInput};

/// Soft cap on portfolio size. Exceeding it only raises a warning; the
/// computation proceeds unchanged.
pub const ASSET_SOFT_LIMIT: usize = 10;

/// One holding as handed in by the caller. All values are already-validated
/// integer cents and basis points; decimal parsing happens at the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetInput {
    /// Unique, stable key for the asset.
    pub id: String,
    pub market_value_gross: Money,
    pub target_weight: Percentage,
    /// Capital originally paid in. Defaults to the gross market value,
    /// i.e. no unrealized gain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invested_capital: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_exemption: Option<PartialExemptionRate>,
}

impl AssetInput {
    pub fn invested_capital(&self) -> Money {
        self.invested_capital.unwrap_or(self.market_value_gross)
    }

    pub fn partial_exemption(&self) -> PartialExemptionRate {
        self.partial_exemption.unwrap_or_default()
    }
}

/// Trading cost model: optional fixed fee plus optional rate on the gross
/// trade volume.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeeProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_fee: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_rate: Option<Percentage>,
}

/// Fee on a trade; zero when no trade occurs or no profile is supplied.
pub(crate) fn fee_amount(trade_gross: Money, fees: Option<&FeeProfile>) -> Money {
    let Some(fees) = fees else {
        return Money::ZERO;
    };
    if trade_gross.is_zero() {
        return Money::ZERO;
    }

    let fixed = fees.fixed_fee.unwrap_or(Money::ZERO);
    let rate_fee = fees
        .fee_rate
        .map(|rate| trade_gross.mul_percentage(rate))
        .unwrap_or(Money::ZERO);
    fixed + rate_fee
}

/// Construction-time contract checks shared by both optimizers.
pub(crate) fn validate_assets(assets: &[AssetInput]) -> RebalanceResult<()> {
    for asset in assets {
        if asset.market_value_gross.is_negative() {
            return Err(RebalanceError::invalid_input(
                "market_value_gross",
                format!("asset '{}' has a negative market value", asset.id),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pct(basis_points: u32) -> Percentage {
        Percentage::from_basis_points(basis_points).unwrap()
    }

    #[test]
    fn test_fee_is_zero_without_trade_or_profile() {
        let fees = FeeProfile {
            fixed_fee: Some(Money::from_cents(990)),
            fee_rate: Some(pct(25)),
        };
        assert_eq!(fee_amount(Money::ZERO, Some(&fees)), Money::ZERO);
        assert_eq!(fee_amount(Money::from_cents(10_000), None), Money::ZERO);
    }

    #[test]
    fn test_fee_combines_fixed_and_rate() {
        let fees = FeeProfile {
            fixed_fee: Some(Money::from_cents(990)),
            fee_rate: Some(pct(25)), // 0.25%
        };
        // 100.00 gross: 9.90 + 0.25 = 10.15
        assert_eq!(
            fee_amount(Money::from_cents(10_000), Some(&fees)).cents(),
            1_015
        );
    }

    #[test]
    fn test_asset_defaults() {
        let asset = AssetInput {
            id: "a".to_string(),
            market_value_gross: Money::from_cents(5_000),
            target_weight: pct(10_000),
            invested_capital: None,
            partial_exemption: None,
        };
        assert_eq!(asset.invested_capital(), asset.market_value_gross);
        assert!(asset.partial_exemption().rate().is_zero());
    }

    #[test]
    fn test_negative_market_value_rejected() {
        let asset = AssetInput {
            id: "a".to_string(),
            market_value_gross: Money::from_cents(-1),
            target_weight: pct(10_000),
            invested_capital: None,
            partial_exemption: None,
        };
        assert!(validate_assets(&[asset]).is_err());
    }
}
