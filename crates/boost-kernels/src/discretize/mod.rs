//! Discretization of continuous feature values into bin indices.
//!
//! Bin 0 is reserved for missing values (NaN). Any other value `v` lands in
//! bin `1 + #{cuts <= v}`: cuts are lower-bound inclusive, so a value equal
//! to a cut belongs to the bin that cut opens. ±inf are ordinary values.
//!
//! # Regimes
//!
//! The kernel is chosen from the cut count and the sample count; all of them
//! produce identical output:
//!
//! | Regime | Cuts | Method |
//! |--------|------|--------|
//! | [`Regime::Missing`] | 0 | NaN test only |
//! | [`Regime::Linear`] | 1-6 | unrolled compare-and-count |
//! | [`Regime::Padded`] | 7-1022, enough samples | fixed-depth search over a padded table |
//! | [`Regime::Search`] | otherwise | binary search over the cuts |
//!
//! A padded table of `P` slots is only built when there are at least
//! `4 * P` samples to amortize it.
//!
//! # Entry points
//!
//! - [`discretize`]: slices in, `Result` out
//! - [`discretize_raw`]: counts and optional buffers in, [`Status`] out, for
//!   foreign callers
//! - [`discretize_par`] / [`discretize_columns`]: parallel drivers
//!
//! # Preconditions
//!
//! Cuts must be strictly increasing and contain no NaN or infinity. Debug
//! builds check this; release builds trust the caller and give unspecified
//! (but memory-safe) bins when the contract is broken.

mod bin_index;
mod columns;
mod error;
mod linear;
mod padded;
mod search;

use std::mem::size_of;

pub use bin_index::BinIndex;
pub use columns::{discretize_columns, discretize_par};
pub use error::DiscretizeError;
pub use linear::LINEAR_MAX_CUTS;
pub use padded::{table_len_for, AMORTIZE_FACTOR, MAX_TABLE_LEN, TABLE_SIZES};
pub use search::SEARCH_MIN_CUTS;

use crate::logging::LogBudget;
use crate::status::Status;

static ENTER_BUDGET: LogBudget = LogBudget::new(25);
static EXIT_BUDGET: LogBudget = LogBudget::new(25);

// =============================================================================
// Regime
// =============================================================================

/// Discretization strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    /// No cuts: only missing versus present.
    Missing,
    /// 1 to [`LINEAR_MAX_CUTS`] cuts, compared one after another.
    Linear,
    /// Fixed-depth search over a padded table of this many slots.
    Padded(usize),
    /// Variable-depth binary search over the cuts.
    Search,
}

impl Regime {
    /// The regime used for `count_cuts` cuts over `count_samples` values.
    pub fn select(count_cuts: usize, count_samples: usize) -> Self {
        match count_cuts {
            0 => Regime::Missing,
            1..=LINEAR_MAX_CUTS => Regime::Linear,
            _ => match table_len_for(count_cuts) {
                Some(len) if count_samples >= AMORTIZE_FACTOR * len => Regime::Padded(len),
                _ => Regime::Search,
            },
        }
    }

    /// Whether this regime can produce correct bins for `count_cuts` cuts.
    pub fn supports(self, count_cuts: usize) -> bool {
        match self {
            Regime::Missing => count_cuts == 0,
            Regime::Linear => (1..=LINEAR_MAX_CUTS).contains(&count_cuts),
            Regime::Padded(len) => TABLE_SIZES.contains(&len) && count_cuts <= len - 2,
            Regime::Search => count_cuts >= SEARCH_MIN_CUTS,
        }
    }
}

// =============================================================================
// Entry points
// =============================================================================

/// Discretize `values` into `bins` using `cuts`.
///
/// `values` and `bins` must have the same length. `bins` is written only if
/// every check passes.
///
/// # Example
///
/// ```
/// use boost_kernels::discretize;
///
/// let mut bins = [0u8; 2];
/// discretize(&[3.0, f64::NAN], &[], &mut bins).unwrap();
/// assert_eq!(bins, [1, 0]);
/// ```
pub fn discretize<T: BinIndex>(
    values: &[f64],
    cuts: &[f64],
    bins: &mut [T],
) -> Result<(), DiscretizeError> {
    check_slices::<T>(values, cuts, bins).map_err(log_failure)?;
    run(values, cuts, bins);
    Ok(())
}

/// Discretize with an explicitly chosen regime.
///
/// Output is identical to [`discretize`] whenever the regime supports the cut
/// count; the sample-count amortization rule is not applied. Mostly useful
/// for benchmarking and for cross-checking regimes.
pub fn discretize_with_regime<T: BinIndex>(
    regime: Regime,
    values: &[f64],
    cuts: &[f64],
    bins: &mut [T],
) -> Result<(), DiscretizeError> {
    check_slices::<T>(values, cuts, bins).map_err(log_failure)?;
    if !regime.supports(cuts.len()) {
        return Err(log_failure(DiscretizeError::UnsupportedRegime {
            regime,
            count_cuts: cuts.len(),
        }));
    }
    #[cfg(debug_assertions)]
    debug_check_cuts(cuts);
    run_regime(regime, values, cuts, bins);
    Ok(())
}

/// Status-code entry point for callers holding counts and optional buffers.
///
/// Validation follows a fixed order and stops at the first failure, which
/// is logged at error level. A zero sample count succeeds before any buffer
/// is looked at; with zero cuts the cut buffer is never read. Slices may be
/// longer than their counts: only the first `count_*` elements are used.
pub fn discretize_raw<T: BinIndex>(
    count_samples: i64,
    feature_values: Option<&[f64]>,
    count_cuts: i64,
    cuts_lower_bound_inclusive: Option<&[f64]>,
    bins_out: Option<&mut [T]>,
) -> Status {
    log_counted!(
        ENTER_BUDGET,
        "Entered discretize_raw: count_samples={count_samples}, count_cuts={count_cuts}"
    );

    let result = discretize_raw_checked(
        count_samples,
        feature_values,
        count_cuts,
        cuts_lower_bound_inclusive,
        bins_out,
    )
    .map_err(log_failure);
    let status = Status::from(&result);

    log_counted!(EXIT_BUDGET, "Exited discretize_raw: status={status}");
    status
}

fn discretize_raw_checked<T: BinIndex>(
    count_samples: i64,
    feature_values: Option<&[f64]>,
    count_cuts: i64,
    cuts: Option<&[f64]>,
    bins_out: Option<&mut [T]>,
) -> Result<(), DiscretizeError> {
    let n = check_sample_count::<T>(count_samples)?;
    if n == 0 {
        return Ok(());
    }

    let values = feature_values.ok_or(DiscretizeError::MissingFeatureValues)?;
    let bins = bins_out.ok_or(DiscretizeError::MissingOutput)?;
    let values = prefix("feature_values", values, n)?;
    let bins = prefix_mut("bins_out", bins, n)?;

    if count_cuts < 0 {
        return Err(DiscretizeError::NegativeCutCount(count_cuts));
    }
    let cuts: &[f64] = if count_cuts == 0 {
        &[]
    } else {
        let cuts = cuts.ok_or(DiscretizeError::MissingCuts(count_cuts))?;
        let n_cuts = check_cut_count::<T>(count_cuts)?;
        prefix("cuts", cuts, n_cuts)?
    };

    run(values, cuts, bins);
    Ok(())
}

// =============================================================================
// Validation
// =============================================================================

fn log_failure(err: DiscretizeError) -> DiscretizeError {
    log::error!("discretize rejected: {err}");
    err
}

fn check_slices<T: BinIndex>(
    values: &[f64],
    cuts: &[f64],
    bins: &[T],
) -> Result<(), DiscretizeError> {
    if values.len() != bins.len() {
        return Err(DiscretizeError::LengthMismatch {
            values: values.len(),
            bins: bins.len(),
        });
    }
    let count_samples = i64::try_from(values.len())
        .map_err(|_| DiscretizeError::SampleCountTooLarge(i64::MAX))?;
    check_sample_count::<T>(count_samples)?;
    if !cuts.is_empty() {
        let count_cuts =
            i64::try_from(cuts.len()).map_err(|_| DiscretizeError::CutCountTooLarge(i64::MAX))?;
        check_cut_count::<T>(count_cuts)?;
    }
    Ok(())
}

fn check_sample_count<T: BinIndex>(count_samples: i64) -> Result<usize, DiscretizeError> {
    if count_samples < 0 {
        return Err(DiscretizeError::NegativeSampleCount(count_samples));
    }
    let n = usize::try_from(count_samples)
        .map_err(|_| DiscretizeError::SampleCountTooLarge(count_samples))?;
    for element_bytes in [size_of::<f64>(), size_of::<T>()] {
        if n.checked_mul(element_bytes).is_none() {
            return Err(DiscretizeError::SampleBufferOverflow {
                count: n,
                element_bytes,
            });
        }
    }
    Ok(n)
}

fn check_cut_count<T: BinIndex>(count_cuts: i64) -> Result<usize, DiscretizeError> {
    debug_assert!(count_cuts > 0);
    // count_cuts + 1 bins must be representable
    if count_cuts as u128 >= T::MAX {
        return Err(DiscretizeError::NoRoomForMissingBin { count_cuts });
    }
    let n_cuts =
        usize::try_from(count_cuts).map_err(|_| DiscretizeError::CutCountTooLarge(count_cuts))?;
    if n_cuts.checked_mul(size_of::<f64>()).is_none() {
        return Err(DiscretizeError::CutBufferOverflow(n_cuts));
    }
    if n_cuts == usize::MAX {
        return Err(DiscretizeError::NoRoomForMissingBin { count_cuts });
    }
    if n_cuts > isize::MAX as usize {
        return Err(DiscretizeError::SearchIndexOverflow(n_cuts));
    }
    if n_cuts > usize::MAX / 2 + 1 {
        return Err(DiscretizeError::SearchMidpointOverflow(n_cuts));
    }
    Ok(n_cuts)
}

fn prefix<'a>(
    buffer: &'static str,
    slice: &'a [f64],
    required: usize,
) -> Result<&'a [f64], DiscretizeError> {
    slice.get(..required).ok_or(DiscretizeError::BufferTooShort {
        buffer,
        len: slice.len(),
        required,
    })
}

fn prefix_mut<'a, T>(
    buffer: &'static str,
    slice: &'a mut [T],
    required: usize,
) -> Result<&'a mut [T], DiscretizeError> {
    let len = slice.len();
    slice
        .get_mut(..required)
        .ok_or(DiscretizeError::BufferTooShort {
            buffer,
            len,
            required,
        })
}

#[cfg(debug_assertions)]
fn debug_check_cuts(cuts: &[f64]) {
    for (i, &cut) in cuts.iter().enumerate() {
        debug_assert!(cut.is_finite(), "cut {i} is not finite: {cut}");
    }
    for (i, pair) in cuts.windows(2).enumerate() {
        debug_assert!(
            pair[0] < pair[1],
            "cuts not strictly increasing at {i}: {} >= {}",
            pair[0],
            pair[1]
        );
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Discretize already-validated, equally long slices.
pub(crate) fn run<T: BinIndex>(values: &[f64], cuts: &[f64], bins: &mut [T]) {
    debug_assert_eq!(values.len(), bins.len());
    #[cfg(debug_assertions)]
    debug_check_cuts(cuts);
    run_regime(Regime::select(cuts.len(), values.len()), values, cuts, bins);
}

fn run_regime<T: BinIndex>(regime: Regime, values: &[f64], cuts: &[f64], bins: &mut [T]) {
    match regime {
        Regime::Missing => linear::missing_only(values, bins),
        Regime::Linear => linear::linear(values, cuts, bins),
        Regime::Padded(len) => padded::padded(len, values, cuts, bins),
        Regime::Search => search::search(values, cuts, bins),
    }
}
