//! Fixed-depth search over a power-of-two table.
//!
//! The cuts are laid out in a table of `P - 1` slots: slot 0 holds -inf,
//! slots `1..=count_cuts` the cuts, the rest NaN. Every value then walks
//! exactly `log2(P)` halving steps, so the loop has no data-dependent exit.
//! NaN padding compares false against everything, which keeps values above
//! the last cut from stepping into it, and a NaN input never passes any
//! slot and lands in bin 0.

use super::BinIndex;

/// Table sizes, smallest first.
pub const TABLE_SIZES: [usize; 7] = [16, 32, 64, 128, 256, 512, 1024];

/// Largest supported table.
pub const MAX_TABLE_LEN: usize = 1024;

/// A table is used only when there are at least this many samples per slot.
pub const AMORTIZE_FACTOR: usize = 4;

/// Smallest table that fits `count_cuts`, if any.
pub fn table_len_for(count_cuts: usize) -> Option<usize> {
    TABLE_SIZES
        .iter()
        .copied()
        .find(|&len| count_cuts <= len - 2)
}

pub(super) fn padded<T: BinIndex>(table_len: usize, values: &[f64], cuts: &[f64], bins: &mut [T]) {
    match table_len {
        16 => padded_fixed::<T, 16>(values, cuts, bins),
        32 => padded_fixed::<T, 32>(values, cuts, bins),
        64 => padded_fixed::<T, 64>(values, cuts, bins),
        128 => padded_fixed::<T, 128>(values, cuts, bins),
        256 => padded_fixed::<T, 256>(values, cuts, bins),
        512 => padded_fixed::<T, 512>(values, cuts, bins),
        1024 => padded_fixed::<T, 1024>(values, cuts, bins),
        len => unreachable!("no padded table of length {len}"),
    }
}

fn padded_fixed<T: BinIndex, const P: usize>(values: &[f64], cuts: &[f64], bins: &mut [T]) {
    debug_assert!(cuts.len() <= P - 2);

    // last slot stays unused; the search never reads past P - 2
    let mut table = [f64::NAN; P];
    table[0] = f64::NEG_INFINITY;
    table[1..=cuts.len()].copy_from_slice(cuts);

    let first = table[P / 2 - 1];
    for (&val, bin) in values.iter().zip(bins.iter_mut()) {
        let mut idx = if first <= val { P / 2 } else { 0 };
        let mut step = P / 4;
        while step > 0 {
            idx += if table[idx + step - 1] <= val { step } else { 0 };
            step >>= 1;
        }
        *bin = T::from_bin(idx);
    }
}
