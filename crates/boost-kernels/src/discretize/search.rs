//! Binary search over the raw cuts, for counts too large for a padded
//! table or too few samples to pay for building one.

use super::BinIndex;

/// Fewest cuts the search handles: the primed first step needs a cut on
/// each side of the middle.
pub const SEARCH_MIN_CUTS: usize = 3;

pub(super) fn search<T: BinIndex>(values: &[f64], cuts: &[f64], bins: &mut [T]) {
    debug_assert!(cuts.len() >= SEARCH_MIN_CUTS);

    // the first midpoint is the same for every value, so hoist it
    let high_start = (cuts.len() - 1) as isize;
    let first_middle = (cuts.len() - 1) >> 1;
    let first_mid_val = cuts[first_middle];
    let first_mid_low = first_middle as isize + 1;
    let first_mid_high = first_middle as isize - 1;

    for (&val, bin) in values.iter().zip(bins.iter_mut()) {
        let mut idx = 0usize;
        if !val.is_nan() {
            let upper = first_mid_val <= val;
            let mut low = if upper { first_mid_low } else { 0 };
            let mut high = if upper { high_start } else { first_mid_high };

            // low <= high holds on entry and at the top of every pass
            let mut middle;
            let mut mid_val;
            loop {
                middle = (low as usize + high as usize) >> 1;
                mid_val = cuts[middle];
                let go_up = mid_val <= val;
                low = if go_up { middle as isize + 1 } else { low };
                high = if go_up { high } else { middle as isize - 1 };
                if low > high {
                    break;
                }
            }
            idx = if mid_val <= val { middle + 2 } else { middle + 1 };
        }
        *bin = T::from_bin(idx);
    }
}
