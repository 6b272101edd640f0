use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::RebalanceError;
use crate::rounding::DEFAULT_ROUNDING;
use crate::types::{Money, Percentage};
use crate::RebalanceResult;

/// Granularity of the final tax figure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaxRounding {
    /// Tax is kept at cent precision.
    #[default]
    Cent,
    /// Tax is re-rounded to whole currency units.
    Euro,
}

/// Statutory fraction of a realized gain excluded from taxation.
/// Only 0%, 15% and 30% exist in this regime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartialExemptionRate(Percentage);

impl PartialExemptionRate {
    pub fn from_percent(percent: u32) -> RebalanceResult<PartialExemptionRate> {
        match percent {
            0 | 15 | 30 => Ok(PartialExemptionRate(Percentage::from_basis_points(
                percent * 100,
            )?)),
            other => Err(RebalanceError::invalid_input(
                "partial_exemption",
                format!("{other}% is not a valid partial exemption rate (0, 15 or 30)"),
            )),
        }
    }

    pub const fn none() -> PartialExemptionRate {
        PartialExemptionRate(Percentage::ZERO)
    }

    pub const fn rate(self) -> Percentage {
        self.0
    }

    /// The share of a gain that remains taxable (100% − exemption).
    pub const fn taxable_share(self) -> Percentage {
        self.0.complement()
    }
}

impl Serialize for PartialExemptionRate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(self.0.basis_points() / 100)
    }
}

impl<'de> Deserialize<'de> for PartialExemptionRate {
    fn deserialize<D>(deserializer: D) -> Result<PartialExemptionRate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let percent = u32::deserialize(deserializer)?;
        PartialExemptionRate::from_percent(percent).map_err(serde::de::Error::custom)
    }
}

/// A tax regime: capital-gains tax plus two surcharges levied on the tax
/// itself, with a portfolio-wide tax-free allowance consumed once across
/// all assets combined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxProfile {
    pub capital_gains_tax: Percentage,
    #[serde(default)]
    pub solidarity_surcharge: Percentage,
    #[serde(default)]
    pub church_tax: Percentage,
    #[serde(default)]
    pub rounding: TaxRounding,
    #[serde(default)]
    pub remaining_allowance: Money,
}

impl TaxProfile {
    pub fn new(capital_gains_tax: Percentage) -> TaxProfile {
        TaxProfile {
            capital_gains_tax,
            ..TaxProfile::default()
        }
    }

    pub fn with_solidarity_surcharge(mut self, surcharge: Percentage) -> TaxProfile {
        self.solidarity_surcharge = surcharge;
        self
    }

    pub fn with_church_tax(mut self, church_tax: Percentage) -> TaxProfile {
        self.church_tax = church_tax;
        self
    }

    pub fn with_rounding(mut self, rounding: TaxRounding) -> TaxProfile {
        self.rounding = rounding;
        self
    }

    pub fn with_remaining_allowance(mut self, allowance: Money) -> TaxProfile {
        self.remaining_allowance = allowance;
        self
    }
}

/// Tax on a taxable base: base×capital-gains plus both surcharges on that
/// tax, each term rounded half-up to the cent independently, then the sum
/// optionally re-rounded to whole units. No profile means a no-tax
/// jurisdiction.
pub fn tax_amount(taxable_base: Money, profile: Option<&TaxProfile>) -> Money {
    let Some(profile) = profile else {
        return Money::ZERO;
    };

    let capital_gains = taxable_base.mul_percentage(profile.capital_gains_tax);
    let solidarity = capital_gains.mul_percentage(profile.solidarity_surcharge);
    let church = capital_gains.mul_percentage(profile.church_tax);

    let total = capital_gains + solidarity + church;
    match profile.rounding {
        TaxRounding::Cent => total,
        TaxRounding::Euro => total.round_to_whole(DEFAULT_ROUNDING),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn pct(value: rust_decimal::Decimal) -> Percentage {
        Percentage::from_percent(value).unwrap()
    }

    #[test]
    fn test_three_term_surcharge_stack() {
        // Gain 1000.00: 25% => 250.00, soli 5.5% of tax => 13.75,
        // church 9% of tax => 22.50. Total 286.25.
        let profile = TaxProfile::new(pct(dec!(25)))
            .with_solidarity_surcharge(pct(dec!(5.5)))
            .with_church_tax(pct(dec!(9)));
        let tax = tax_amount(Money::from_cents(100_000), Some(&profile));
        assert_eq!(tax.cents(), 28_625);
    }

    #[test]
    fn test_each_term_rounded_independently() {
        // Base 33.33: cap tax 8.3325 → 8.33, soli 5.5% of 8.33 = 0.458… → 0.46
        let profile = TaxProfile::new(pct(dec!(25))).with_solidarity_surcharge(pct(dec!(5.5)));
        let tax = tax_amount(Money::from_cents(3_333), Some(&profile));
        assert_eq!(tax.cents(), 833 + 46);
    }

    #[test]
    fn test_euro_rounding_produces_whole_units() {
        let profile = TaxProfile::new(pct(dec!(25)))
            .with_solidarity_surcharge(pct(dec!(5.5)))
            .with_rounding(TaxRounding::Euro);
        let tax = tax_amount(Money::from_cents(100_001), Some(&profile));
        assert!(tax.cents() > 0);
        assert_eq!(tax.cents() % 100, 0);
    }

    #[test]
    fn test_no_profile_means_no_tax() {
        assert_eq!(tax_amount(Money::from_cents(100_000), None), Money::ZERO);
    }

    #[test]
    fn test_partial_exemption_rates_are_closed_set() {
        assert_eq!(
            PartialExemptionRate::from_percent(15)
                .unwrap()
                .rate()
                .basis_points(),
            1_500
        );
        assert_eq!(
            PartialExemptionRate::from_percent(30)
                .unwrap()
                .taxable_share()
                .basis_points(),
            7_000
        );
        assert!(PartialExemptionRate::from_percent(20).is_err());
        assert_eq!(
            PartialExemptionRate::none().taxable_share(),
            Percentage::FULL
        );
    }

    #[test]
    fn test_tax_profile_deserializes_with_defaults() {
        let profile: TaxProfile = serde_json::from_str(r#"{"capital_gains_tax": 2500}"#).unwrap();
        assert_eq!(profile.capital_gains_tax.basis_points(), 2_500);
        assert_eq!(profile.solidarity_surcharge, Percentage::ZERO);
        assert_eq!(profile.rounding, TaxRounding::Cent);
        assert_eq!(profile.remaining_allowance, Money::ZERO);

        let euro: TaxProfile =
            serde_json::from_str(r#"{"capital_gains_tax": 2500, "rounding": "EURO"}"#).unwrap();
        assert_eq!(euro.rounding, TaxRounding::Euro);
    }
}
