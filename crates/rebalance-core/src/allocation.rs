use crate::rounding::{round_divide, DEFAULT_ROUNDING};
use crate::types::{Percentage, WarningCode, BASIS_POINTS_SCALE};
use crate::RebalanceResult;

/// Distribute `total_to_allocate` across raw shares using Hamilton
/// (largest-remainder) apportionment.
///
/// Each share gets the exact floor of `raw × total / sum_raw`; leftover
/// units go one at a time to the entries with the largest fractional
/// remainder, ties broken by ascending index. The output always sums to
/// exactly `total_to_allocate` (all zeros when the total or the raw sum is
/// not positive).
pub fn allocate_pro_rata(raw_shares: &[i64], total_to_allocate: i64) -> Vec<i64> {
    if total_to_allocate <= 0 {
        return vec![0; raw_shares.len()];
    }
    let sum_raw: i128 = raw_shares.iter().map(|&v| v as i128).sum();
    if sum_raw <= 0 {
        return vec![0; raw_shares.len()];
    }

    let total = total_to_allocate as i128;
    let mut floors: Vec<i64> = Vec::with_capacity(raw_shares.len());
    let mut remainders: Vec<(usize, i128)> = Vec::with_capacity(raw_shares.len());
    let mut allocated: i128 = 0;

    for (index, &raw) in raw_shares.iter().enumerate() {
        let product = raw as i128 * total;
        let floor = product.div_euclid(sum_raw);
        // Remainders share the denominator sum_raw, so comparing them
        // directly ranks the fractional parts exactly.
        remainders.push((index, product.rem_euclid(sum_raw)));
        allocated += floor;
        floors.push(floor as i64);
    }

    remainders.sort_by(|left, right| right.1.cmp(&left.1).then(left.0.cmp(&right.0)));

    let mut leftover = total - allocated;
    for &(index, _) in &remainders {
        if leftover <= 0 {
            break;
        }
        floors[index] += 1;
        leftover -= 1;
    }

    floors
}

/// Rescale target weights so their basis points sum to exactly 10000.
///
/// Every weight except the last is rounded half-up to
/// `weight × 10000 / sum`; the last asset in input order absorbs whatever
/// remainder the rounding left, keeping the total exact. A zero sum has no
/// valid redistribution and returns the inputs unchanged.
pub fn normalize_target_weights(
    weights: &[Percentage],
    warnings: &mut Vec<WarningCode>,
) -> RebalanceResult<Vec<Percentage>> {
    let sum_bps: i128 = weights.iter().map(|w| w.basis_points() as i128).sum();
    if sum_bps == 0 {
        warnings.push(WarningCode::TargetWeightsZero);
        return Ok(weights.to_vec());
    }
    if sum_bps != BASIS_POINTS_SCALE as i128 {
        warnings.push(WarningCode::TargetWeightsNormalized);
    }

    let mut normalized = Vec::with_capacity(weights.len());
    let mut running_sum: i128 = 0;
    for (index, weight) in weights.iter().enumerate() {
        if index == weights.len() - 1 {
            let remainder = BASIS_POINTS_SCALE as i128 - running_sum;
            let remainder = u32::try_from(remainder).map_err(|_| {
                crate::RebalanceError::invalid_input(
                    "target_weights",
                    "normalization remainder fell outside 0..=10000 basis points",
                )
            })?;
            normalized.push(Percentage::from_basis_points(remainder)?);
        } else {
            let bps = round_divide(
                weight.basis_points() as i128 * BASIS_POINTS_SCALE as i128,
                sum_bps,
                DEFAULT_ROUNDING,
            )?;
            running_sum += bps;
            normalized.push(Percentage::from_basis_points(bps as u32)?);
        }
    }

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bps(basis_points: u32) -> Percentage {
        Percentage::from_basis_points(basis_points).unwrap()
    }

    #[test]
    fn test_allocation_conserves_total() {
        let raw = [333, 333, 334];
        let allocated = allocate_pro_rata(&raw, 100);
        assert_eq!(allocated.iter().sum::<i64>(), 100);

        let skewed = [1, 1, 999_999];
        let allocated = allocate_pro_rata(&skewed, 7);
        assert_eq!(allocated.iter().sum::<i64>(), 7);
        assert_eq!(allocated[2], 7);
    }

    #[test]
    fn test_allocation_largest_remainder_wins() {
        // floors: 10*3 = [3,3,3] on shares [35,35,30]; 35s have the larger
        // remainder (0.5 vs 0.0), first in index order gets the spare unit.
        let allocated = allocate_pro_rata(&[35, 35, 30], 10);
        assert_eq!(allocated, vec![4, 3, 3]);
    }

    #[test]
    fn test_allocation_tie_breaks_by_index() {
        let allocated = allocate_pro_rata(&[1, 1, 1], 2);
        assert_eq!(allocated, vec![1, 1, 0]);
    }

    #[test]
    fn test_allocation_degenerate_inputs() {
        assert_eq!(allocate_pro_rata(&[10, 20], 0), vec![0, 0]);
        assert_eq!(allocate_pro_rata(&[10, 20], -5), vec![0, 0]);
        assert_eq!(allocate_pro_rata(&[0, 0], 10), vec![0, 0]);
        assert_eq!(allocate_pro_rata(&[], 10), Vec::<i64>::new());
    }

    #[test]
    fn test_allocation_exact_split_gets_no_extras() {
        let allocated = allocate_pro_rata(&[25, 25, 50], 100);
        assert_eq!(allocated, vec![25, 25, 50]);
    }

    #[test]
    fn test_normalize_rescales_to_exactly_10000() {
        let mut warnings = Vec::new();
        let normalized = normalize_target_weights(&[bps(6_000), bps(6_000)], &mut warnings).unwrap();
        assert_eq!(
            normalized.iter().map(|w| w.basis_points()).sum::<u32>(),
            10_000
        );
        assert_eq!(normalized, vec![bps(5_000), bps(5_000)]);
        assert_eq!(warnings, vec![WarningCode::TargetWeightsNormalized]);
    }

    #[test]
    fn test_normalize_last_asset_absorbs_remainder() {
        let mut warnings = Vec::new();
        let normalized =
            normalize_target_weights(&[bps(3_333), bps(3_333), bps(3_333)], &mut warnings).unwrap();
        // First two round to 3333.(3) → 3333 each; the last is forced to
        // whatever reaches 10000, not its own rounded value.
        assert_eq!(normalized, vec![bps(3_333), bps(3_333), bps(3_334)]);
    }

    #[test]
    fn test_normalize_exact_sum_is_untouched_and_silent() {
        let mut warnings = Vec::new();
        let weights = [bps(7_000), bps(3_000)];
        let normalized = normalize_target_weights(&weights, &mut warnings).unwrap();
        assert_eq!(normalized, weights.to_vec());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_normalize_zero_sum_returns_inputs() {
        let mut warnings = Vec::new();
        let weights = [bps(0), bps(0)];
        let normalized = normalize_target_weights(&weights, &mut warnings).unwrap();
        assert_eq!(normalized, weights.to_vec());
        assert_eq!(warnings, vec![WarningCode::TargetWeightsZero]);
    }
}
