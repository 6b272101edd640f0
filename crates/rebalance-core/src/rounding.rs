use serde::{Deserialize, Serialize};

use crate::error::RebalanceError;
use crate::RebalanceResult;

/// Rounding applied to every integer division in the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundingMode {
    /// Kaufmännisch (DIN 1333): remainder of at least half the divisor
    /// rounds away from zero.
    HalfUp,
    /// Truncate toward zero.
    Truncate,
    /// Ties round to the even quotient.
    Bankers,
}

pub const DEFAULT_ROUNDING: RoundingMode = RoundingMode::HalfUp;

/// Divide `numerator` by `denominator`, rounding per `mode`.
///
/// The sign is factored out before rounding and reapplied afterwards, so
/// every mode operates on magnitudes. This is the only division primitive
/// used anywhere in the engine; no currency value is ever divided as a
/// float.
pub fn round_divide(
    numerator: i128,
    denominator: i128,
    mode: RoundingMode,
) -> RebalanceResult<i128> {
    if denominator == 0 {
        return Err(RebalanceError::DivisionByZero {
            context: "round_divide".to_string(),
        });
    }
    Ok(div_rounded(numerator, denominator, mode))
}

/// Infallible variant for callers that guarantee a non-zero denominator
/// (e.g. the fixed basis-point and cent scales).
pub(crate) fn div_rounded(numerator: i128, denominator: i128, mode: RoundingMode) -> i128 {
    let sign: i128 = if (numerator < 0) != (denominator < 0) {
        -1
    } else {
        1
    };
    let abs_numerator = numerator.unsigned_abs();
    let abs_denominator = denominator.unsigned_abs();

    let quotient = abs_numerator / abs_denominator;
    let remainder = abs_numerator % abs_denominator;

    let result = match mode {
        RoundingMode::Truncate => quotient,
        RoundingMode::HalfUp => {
            if remainder * 2 >= abs_denominator {
                quotient + 1
            } else {
                quotient
            }
        }
        RoundingMode::Bankers => {
            if remainder * 2 > abs_denominator {
                quotient + 1
            } else if remainder * 2 == abs_denominator {
                if quotient % 2 == 0 {
                    quotient
                } else {
                    quotient + 1
                }
            } else {
                quotient
            }
        }
    };

    result as i128 * sign
}
