//! Regimes for zero and for a handful of cuts.

use super::BinIndex;

/// Largest cut count handled by the unrolled comparison chain.
pub const LINEAR_MAX_CUTS: usize = 6;

/// No cuts: 0 for NaN, 1 for everything else.
pub(super) fn missing_only<T: BinIndex>(values: &[f64], bins: &mut [T]) {
    for (&val, bin) in values.iter().zip(bins.iter_mut()) {
        *bin = T::from_bin(usize::from(!val.is_nan()));
    }
}

/// Compare against every cut and count. NaN compares false everywhere and
/// is then forced to bin 0.
pub(super) fn linear<T: BinIndex>(values: &[f64], cuts: &[f64], bins: &mut [T]) {
    match cuts.len() {
        1 => linear_fixed::<T, 1>(values, cuts, bins),
        2 => linear_fixed::<T, 2>(values, cuts, bins),
        3 => linear_fixed::<T, 3>(values, cuts, bins),
        4 => linear_fixed::<T, 4>(values, cuts, bins),
        5 => linear_fixed::<T, 5>(values, cuts, bins),
        6 => linear_fixed::<T, 6>(values, cuts, bins),
        n => unreachable!("linear regime with {n} cuts"),
    }
}

#[inline(always)]
fn linear_fixed<T: BinIndex, const N: usize>(values: &[f64], cuts: &[f64], bins: &mut [T]) {
    let mut table = [0.0f64; N];
    table.copy_from_slice(&cuts[..N]);

    for (&val, bin) in values.iter().zip(bins.iter_mut()) {
        let mut idx = 1usize;
        for &cut in &table {
            idx += usize::from(cut <= val);
        }
        idx = if val.is_nan() { 0 } else { idx };
        *bin = T::from_bin(idx);
    }
}
