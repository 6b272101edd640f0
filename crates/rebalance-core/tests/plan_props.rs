use proptest::collection::vec;
use proptest::prelude::*;
use rebalance_core::allocation::{allocate_pro_rata, normalize_target_weights};
use rebalance_core::plan::trade::{calculate_rebalance_plan, RebalancePlanInput};
use rebalance_core::plan::AssetInput;
use rebalance_core::tax::TaxProfile;
use rebalance_core::{Money, Percentage};
use rust_decimal_macros::dec;

fn arb_assets() -> impl Strategy<Value = Vec<AssetInput>> {
    vec(
        (0i64..5_000_000, 0u32..10_000, 0i64..5_000_000),
        1..8usize,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(index, (value, weight_bps, invested))| AssetInput {
                id: format!("asset-{index}"),
                market_value_gross: Money::from_cents(value),
                target_weight: Percentage::from_basis_points(weight_bps).unwrap(),
                invested_capital: Some(Money::from_cents(invested)),
                partial_exemption: None,
            })
            .collect()
    })
}

fn taxed_input(assets: Vec<AssetInput>) -> RebalancePlanInput {
    RebalancePlanInput {
        assets,
        tax_profile: Some(
            TaxProfile::new(Percentage::from_percent(dec!(25)).unwrap())
                .with_solidarity_surcharge(Percentage::from_percent(dec!(5.5)).unwrap()),
        ),
        fees: None,
    }
}

proptest! {
    // Largest-remainder allocation conserves the total exactly, no matter
    // how skewed the raw shares are.
    #[test]
    fn prop_allocation_conserves_total(
        raw in vec(0i64..1_000_000, 1..12usize),
        total in 0i64..1_000_000,
    ) {
        let allocated = allocate_pro_rata(&raw, total);
        prop_assert_eq!(allocated.len(), raw.len());

        let sum_raw: i64 = raw.iter().sum();
        let expected = if total <= 0 || sum_raw <= 0 { 0 } else { total };
        prop_assert_eq!(allocated.iter().sum::<i64>(), expected);
        prop_assert!(allocated.iter().all(|&v| v >= 0));
    }

    // Normalized weights always sum to exactly 10000 bps when the input
    // sum is non-zero.
    #[test]
    fn prop_normalized_weights_sum_to_10000(
        raw_bps in vec(0u32..10_000, 1..12usize),
    ) {
        prop_assume!(raw_bps.iter().sum::<u32>() > 0);
        let weights: Vec<Percentage> = raw_bps
            .iter()
            .map(|&bps| Percentage::from_basis_points(bps).unwrap())
            .collect();

        let mut warnings = Vec::new();
        if let Ok(normalized) = normalize_target_weights(&weights, &mut warnings) {
            let sum: u32 = normalized.iter().map(|w| w.basis_points()).sum();
            prop_assert_eq!(sum, 10_000);
        }
    }

    // An asset holding a loss never pays tax on a sale.
    #[test]
    fn prop_losses_are_never_taxed(assets in arb_assets()) {
        let losers: Vec<String> = assets
            .iter()
            .filter(|a| a.market_value_gross < a.invested_capital.unwrap())
            .map(|a| a.id.clone())
            .collect();

        if let Ok(plan) = calculate_rebalance_plan(&taxed_input(assets)) {
            for entry in &plan.result.assets {
                if losers.contains(&entry.id) {
                    prop_assert_eq!(entry.tax_on_sell, Money::ZERO);
                }
            }
        }
    }

    // A single signed delta backs each asset: buy and sell are mutually
    // exclusive, and the residual lands on exactly one side.
    #[test]
    fn prop_plan_invariants(assets in arb_assets()) {
        if let Ok(plan) = calculate_rebalance_plan(&taxed_input(assets)) {
            for entry in &plan.result.assets {
                prop_assert!(entry.buy_gross.is_zero() || entry.sell_gross.is_zero());
                prop_assert!(!entry.buy_gross.is_negative());
                prop_assert!(!entry.sell_gross.is_negative());
            }
            prop_assert!(
                plan.result.cash_shortfall.is_zero() || plan.result.cash_surplus.is_zero()
            );
            prop_assert!(!plan.result.cash_shortfall.is_negative());
            prop_assert!(!plan.result.cash_surplus.is_negative());
        }
    }
}
