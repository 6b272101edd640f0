use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::RebalanceError;
use crate::rounding::{div_rounded, RoundingMode, DEFAULT_ROUNDING};
use crate::RebalanceResult;

/// Basis points in one whole (100%).
pub const BASIS_POINTS_SCALE: i64 = 10_000;

/// Minor units in one major currency unit.
pub const CENTS_PER_UNIT: i64 = 100;

/// An exact monetary amount in minor currency units (cents).
///
/// Never a float: every multiplication is reduced back to an integer cent
/// count through [`crate::rounding::round_divide`]. Immutable value with
/// total ordering.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Money {
        Money(cents)
    }

    pub const fn zero() -> Money {
        Money::ZERO
    }

    /// Convert a decimal amount in major units (e.g. euros) into cents.
    /// Fails on sub-cent precision; callers parse user input through this
    /// so that fractional cents never enter the engine.
    pub fn from_decimal(amount: Decimal) -> RebalanceResult<Money> {
        let cents = amount * Decimal::from(CENTS_PER_UNIT);
        if !cents.fract().is_zero() {
            return Err(RebalanceError::invalid_input(
                "amount",
                format!("'{amount}' has sub-cent precision"),
            ));
        }
        let cents = cents.to_i64().ok_or_else(|| {
            RebalanceError::invalid_input("amount", format!("'{amount}' is out of range"))
        })?;
        Ok(Money(cents))
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn abs(self) -> Money {
        Money(self.0.abs())
    }

    /// Multiply by a percentage, reducing through the rounding policy.
    pub fn mul_percentage(self, percentage: Percentage) -> Money {
        self.mul_percentage_with(percentage, DEFAULT_ROUNDING)
    }

    pub fn mul_percentage_with(self, percentage: Percentage, mode: RoundingMode) -> Money {
        let product = self.0 as i128 * percentage.basis_points() as i128;
        Money(clamp_cents(div_rounded(
            product,
            BASIS_POINTS_SCALE as i128,
            mode,
        )))
    }

    /// Multiply by an integer ratio `multiplier / divisor`.
    pub fn mul_ratio(self, multiplier: i64, divisor: i64) -> RebalanceResult<Money> {
        if divisor == 0 {
            return Err(RebalanceError::DivisionByZero {
                context: "Money::mul_ratio".to_string(),
            });
        }
        let product = self.0 as i128 * multiplier as i128;
        Ok(Money(clamp_cents(div_rounded(
            product,
            divisor as i128,
            DEFAULT_ROUNDING,
        ))))
    }

    /// Round to a whole major unit (multiple of 100 cents).
    pub fn round_to_whole(self, mode: RoundingMode) -> Money {
        let units = div_rounded(self.0 as i128, CENTS_PER_UNIT as i128, mode);
        Money(clamp_cents(units * CENTS_PER_UNIT as i128))
    }
}

/// Cent amounts near the i64 boundary are outside the supported domain;
/// saturate rather than wrap if a computation ever reaches them.
fn clamp_cents(value: i128) -> i64 {
    value.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        *self = *self - rhs;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

/// A percentage held as an integer basis-point count in `[0, 10000]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Percentage(u32);

impl Percentage {
    pub const ZERO: Percentage = Percentage(0);
    pub const FULL: Percentage = Percentage(BASIS_POINTS_SCALE as u32);

    pub fn from_basis_points(basis_points: u32) -> RebalanceResult<Percentage> {
        if basis_points > BASIS_POINTS_SCALE as u32 {
            return Err(RebalanceError::invalid_input(
                "basis_points",
                format!("{basis_points} exceeds {BASIS_POINTS_SCALE} (100%)"),
            ));
        }
        Ok(Percentage(basis_points))
    }

    /// Construct from a decimal percent (e.g. `5.5` for 5.5%), rounded to
    /// the nearest basis point.
    pub fn from_percent(percent: Decimal) -> RebalanceResult<Percentage> {
        let bps = (percent * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        let bps = bps.to_i64().ok_or_else(|| {
            RebalanceError::invalid_input("percent", format!("'{percent}' is out of range"))
        })?;
        if !(0..=BASIS_POINTS_SCALE).contains(&bps) {
            return Err(RebalanceError::invalid_input(
                "percent",
                format!("'{percent}' is outside 0%..=100%"),
            ));
        }
        Ok(Percentage(bps as u32))
    }

    pub const fn basis_points(self) -> u32 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// The share left after this percentage is taken out (100% − self).
    pub const fn complement(self) -> Percentage {
        Percentage(BASIS_POINTS_SCALE as u32 - self.0)
    }
}

impl<'de> Deserialize<'de> for Percentage {
    fn deserialize<D>(deserializer: D) -> Result<Percentage, D::Error>
    where
        D: Deserializer<'de>,
    {
        let basis_points = u32::deserialize(deserializer)?;
        Percentage::from_basis_points(basis_points).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", Decimal::new(self.0 as i64, 2))
    }
}

/// Computation-time anomalies. These never abort a calculation; they are
/// accumulated in order and returned alongside a best-effort result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningCode {
    NoAssets,
    AssetLimitExceeded,
    TargetWeightsZero,
    TargetWeightsNormalized,
    TradePlanRoundingResidual,
    CashOnlyNotConverged,
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            WarningCode::NoAssets => "NO_ASSETS",
            WarningCode::AssetLimitExceeded => "ASSET_LIMIT_EXCEEDED",
            WarningCode::TargetWeightsZero => "TARGET_WEIGHTS_ZERO",
            WarningCode::TargetWeightsNormalized => "TARGET_WEIGHTS_NORMALIZED",
            WarningCode::TradePlanRoundingResidual => "TRADE_PLAN_ROUNDING_RESIDUAL",
            WarningCode::CashOnlyNotConverged => "CASH_ONLY_NOT_CONVERGED",
        };
        f.write_str(code)
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<WarningCode>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<WarningCode>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "integer_cents_i64".to_string(),
        },
    }
}
