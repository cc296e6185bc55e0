//! Testing utilities for boost-kernels.
//!
//! Assertion helpers, a naive reference discretizer and seeded data
//! generators shared by unit tests, integration tests and benchmarks.
//!
//! ```
//! use boost_kernels::testing::{reference_bin, seeded_rng, sorted_cuts};
//!
//! let mut rng = seeded_rng(7);
//! let cuts = sorted_cuts(&mut rng, 10);
//! assert_eq!(reference_bin(f64::NAN, &cuts), 0);
//! assert_eq!(reference_bin(f64::INFINITY, &cuts), 11);
//! ```

use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

// =============================================================================
// Constants
// =============================================================================

/// Default tolerance for f32 kernel outputs of order one.
pub const DEFAULT_TOLERANCE: f32 = 1e-5;

// =============================================================================
// Floating Point Assertions
// =============================================================================

/// Assert that two f32 slices are approximately equal element-wise.
///
/// # Panics
///
/// Panics if lengths differ or any element differs by more than tolerance.
pub fn assert_slice_approx_eq(actual: &[f32], expected: &[f32], tolerance: f32, context: &str) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "{context}: length mismatch - got {}, expected {}",
        actual.len(),
        expected.len()
    );

    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        let diff = (a - e).abs();
        assert!(
            diff <= tolerance,
            "{context}[{i}]: {a} ≠ {e} (diff={diff}, tolerance={tolerance})"
        );
    }
}

// =============================================================================
// Reference Discretizer
// =============================================================================

/// Bin of `value` by linear scan: 0 for NaN, else 1 + number of cuts <= value.
pub fn reference_bin(value: f64, cuts: &[f64]) -> usize {
    if value.is_nan() {
        0
    } else {
        1 + cuts.iter().filter(|&&cut| cut <= value).count()
    }
}

/// Reference bins for every value.
pub fn reference_bins(values: &[f64], cuts: &[f64]) -> Vec<usize> {
    values.iter().map(|&v| reference_bin(v, cuts)).collect()
}

// =============================================================================
// Data Generators
// =============================================================================

/// Deterministic generator for reproducible tests and benchmarks.
pub fn seeded_rng(seed: u64) -> Xoshiro256PlusPlus {
    Xoshiro256PlusPlus::seed_from_u64(seed)
}

/// `n` strictly increasing finite cut points spread over roughly [-n, n].
pub fn sorted_cuts<R: Rng>(rng: &mut R, n: usize) -> Vec<f64> {
    let mut cut = -(n as f64);
    (0..n)
        .map(|_| {
            cut += rng.gen_range(0.25..2.0);
            cut
        })
        .collect()
}

/// Feature values covering the range of `cuts`.
///
/// About `nan_rate` of the values are NaN; some land exactly on a cut and
/// some fall outside the cut range on either side.
pub fn random_values<R: Rng>(rng: &mut R, n: usize, cuts: &[f64], nan_rate: f64) -> Vec<f64> {
    let (lo, hi) = match (cuts.first(), cuts.last()) {
        (Some(&lo), Some(&hi)) => (lo - 2.0, hi + 2.0),
        _ => (-1.0, 1.0),
    };
    (0..n)
        .map(|_| {
            if rng.gen_bool(nan_rate) {
                f64::NAN
            } else if !cuts.is_empty() && rng.gen_bool(0.1) {
                cuts[rng.gen_range(0..cuts.len())]
            } else {
                rng.gen_range(lo..=hi)
            }
        })
        .collect()
}
