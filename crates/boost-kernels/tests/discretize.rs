//! Integration tests for discretization.
//!
//! Every regime is checked against the linear-scan reference, and the
//! status-code entry point is driven through its validation order.

use boost_kernels::discretize::{MAX_TABLE_LEN, TABLE_SIZES};
use boost_kernels::testing::{random_values, reference_bins, seeded_rng, sorted_cuts};
use boost_kernels::{
    discretize, discretize_columns, discretize_par, discretize_raw, discretize_with_regime,
    BinIndex, DiscretizeError, KernelParams, Parallelism, Regime, Status,
};
use ndarray::Array2;
use proptest::collection::vec as prop_vec;
use proptest::prelude::*;
use rstest::rstest;

fn as_usize<T: BinIndex>(bins: &[T]) -> Vec<usize> {
    bins.iter().map(|&b| b.to_bin()).collect()
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn three_cuts_with_missing() {
    let mut bins = [0i64; 5];
    discretize(&[0.5, 1.0, 5.0, 9.5, f64::NAN], &[1.0, 5.0, 9.0], &mut bins).unwrap();
    assert_eq!(bins, [1, 2, 3, 4, 0]);
}

#[test]
fn no_cuts() {
    let mut bins = [9i32; 2];
    discretize(&[3.0, f64::NAN], &[], &mut bins).unwrap();
    assert_eq!(bins, [1, 0]);
}

#[test]
fn infinities_are_values() {
    let cuts = [-1.0, 0.0, 1.0];
    let mut bins = [0u8; 3];
    discretize(&[f64::NEG_INFINITY, f64::INFINITY, -0.0], &cuts, &mut bins).unwrap();
    assert_eq!(bins, [1, 4, 3]);
}

#[rstest]
#[case(14, Regime::Padded(16))]
#[case(15, Regime::Padded(32))]
#[case(300, Regime::Padded(512))]
fn padded_agrees_with_search(#[case] count_cuts: usize, #[case] regime: Regime) {
    let mut rng = seeded_rng(count_cuts as u64);
    let cuts = sorted_cuts(&mut rng, count_cuts);
    let values = random_values(&mut rng, 1000, &cuts, 0.05);
    assert!(regime.supports(count_cuts));

    let mut padded = vec![0u32; values.len()];
    let mut search = vec![0u32; values.len()];
    discretize_with_regime(regime, &values, &cuts, &mut padded).unwrap();
    discretize_with_regime(Regime::Search, &values, &cuts, &mut search).unwrap();
    assert_eq!(padded, search);
    assert_eq!(as_usize(&padded), reference_bins(&values, &cuts));
}

#[test]
fn automatic_regime_matches_reference_across_table_sizes() {
    let mut rng = seeded_rng(99);
    for &len in &TABLE_SIZES {
        let cuts = sorted_cuts(&mut rng, len - 2);
        // enough samples for the table to be chosen
        let values = random_values(&mut rng, 4 * len, &cuts, 0.02);
        assert_eq!(Regime::select(cuts.len(), values.len()), Regime::Padded(len));
        let mut bins = vec![0u16; values.len()];
        discretize(&values, &cuts, &mut bins).unwrap();
        assert_eq!(as_usize(&bins), reference_bins(&values, &cuts), "table {len}");
    }

    let cuts = sorted_cuts(&mut rng, MAX_TABLE_LEN);
    let values = random_values(&mut rng, 10_000, &cuts, 0.02);
    assert_eq!(Regime::select(cuts.len(), values.len()), Regime::Search);
    let mut bins = vec![0u16; values.len()];
    discretize(&values, &cuts, &mut bins).unwrap();
    assert_eq!(as_usize(&bins), reference_bins(&values, &cuts));
}

// =============================================================================
// Output types
// =============================================================================

fn check_output_type<T: BinIndex + Default>(count_cuts: usize) {
    let mut rng = seeded_rng(7 + count_cuts as u64);
    let cuts = sorted_cuts(&mut rng, count_cuts);
    let values = random_values(&mut rng, 600, &cuts, 0.1);
    let mut bins = vec![T::default(); values.len()];
    discretize(&values, &cuts, &mut bins).unwrap();
    assert_eq!(as_usize(&bins), reference_bins(&values, &cuts), "{count_cuts} cuts");
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(6)]
#[case(7)]
#[case(30)]
#[case(126)]
fn every_output_type(#[case] count_cuts: usize) {
    check_output_type::<u8>(count_cuts);
    check_output_type::<i8>(count_cuts);
    check_output_type::<u16>(count_cuts);
    check_output_type::<i16>(count_cuts);
    check_output_type::<u32>(count_cuts);
    check_output_type::<i32>(count_cuts);
    check_output_type::<u64>(count_cuts);
    check_output_type::<i64>(count_cuts);
    check_output_type::<usize>(count_cuts);
    check_output_type::<isize>(count_cuts);
}

#[test]
fn i8_limit() {
    // 126 cuts give bins up to 127
    let cuts: Vec<f64> = (0..127).map(f64::from).collect();
    let mut bins = [0i8; 1];
    assert_eq!(
        discretize(&[1.0], &cuts, &mut bins),
        Err(DiscretizeError::NoRoomForMissingBin { count_cuts: 127 })
    );
    discretize(&[1000.0], &cuts[..126], &mut bins).unwrap();
    assert_eq!(bins, [127]);
}

// =============================================================================
// Status-code entry point
// =============================================================================

#[test]
fn raw_success_and_prefixes() {
    let values = [0.5, 7.0, f64::NAN, 100.0];
    let cuts = [1.0, 5.0, 9.0, 1e9];
    let mut bins = [-1i64; 4];
    // only the first three values and first three cuts are used
    let status = discretize_raw(3, Some(&values[..]), 3, Some(&cuts[..]), Some(&mut bins[..]));
    assert_eq!(status, Status::Success);
    assert_eq!(status.code(), 0);
    assert_eq!(bins, [1, 3, 0, -1]);
}

#[test]
fn raw_zero_samples_ignores_buffers() {
    let status = discretize_raw::<i64>(0, None, -5, None, None);
    assert!(status.is_success());
}

#[test]
fn raw_zero_cuts_never_reads_cuts() {
    let mut bins = [7u8; 2];
    let status = discretize_raw(2, Some(&[1.0, f64::NAN][..]), 0, None, Some(&mut bins[..]));
    assert_eq!(status, Status::Success);
    assert_eq!(bins, [1, 0]);
}

#[rstest]
#[case::negative_samples(-1, true, 1, true, true)]
#[case::missing_values(2, false, 1, true, true)]
#[case::missing_output(2, true, 1, true, false)]
#[case::negative_cuts(2, true, -1, true, true)]
#[case::missing_cuts(2, true, 1, false, true)]
#[case::short_values(3, true, 1, true, true)]
#[case::short_cuts(2, true, 2, true, true)]
fn raw_failures_leave_output(
    #[case] count_samples: i64,
    #[case] with_values: bool,
    #[case] count_cuts: i64,
    #[case] with_cuts: bool,
    #[case] with_output: bool,
) {
    let values = [1.0, 2.0];
    let cuts = [1.5];
    let mut bins = [42u32; 3];
    let status = discretize_raw(
        count_samples,
        with_values.then_some(&values[..]),
        count_cuts,
        with_cuts.then_some(&cuts[..]),
        with_output.then_some(&mut bins[..]),
    );
    assert_eq!(status, Status::Failure);
    assert_eq!(status.code(), 1);
    assert_eq!(bins, [42; 3]);
}

#[test]
fn raw_too_many_cuts_for_output_type() {
    let cuts: Vec<f64> = (0..255).map(f64::from).collect();
    let mut bins = [0u8; 1];
    let status = discretize_raw(1, Some(&[3.0][..]), 255, Some(&cuts[..]), Some(&mut bins[..]));
    assert_eq!(status, Status::Failure);
    let status = discretize_raw(1, Some(&[3.0][..]), 254, Some(&cuts[..]), Some(&mut bins[..]));
    assert_eq!(status, Status::Success);
    assert_eq!(bins, [5]);
}

// =============================================================================
// Parallel drivers
// =============================================================================

#[test]
fn parallel_chunks_match_sequential() {
    let mut rng = seeded_rng(5);
    let cuts = sorted_cuts(&mut rng, 40);
    let values = random_values(&mut rng, 20_000, &cuts, 0.05);

    let mut sequential = vec![0u16; values.len()];
    discretize(&values, &cuts, &mut sequential).unwrap();

    let params = KernelParams::default().with_threads(3).with_min_chunk_samples(1000);
    let parallel = params
        .install(|parallelism| {
            let mut bins = vec![0u16; values.len()];
            discretize_par(&values, &cuts, &mut bins, parallelism, params.min_chunk_samples)
                .map(|()| bins)
        })
        .unwrap()
        .unwrap();
    assert_eq!(parallel, sequential);
}

#[test]
fn columns_use_their_own_cuts() {
    let mut rng = seeded_rng(17);
    let n_samples = 500;
    let cut_sets: Vec<Vec<f64>> = [0, 3, 12, 100, 2000]
        .iter()
        .map(|&n| sorted_cuts(&mut rng, n))
        .collect();
    let rows: Vec<Vec<f64>> = cut_sets
        .iter()
        .map(|cuts| random_values(&mut rng, n_samples, cuts, 0.1))
        .collect();
    let features =
        Array2::from_shape_fn((rows.len(), n_samples), |(feature, sample)| rows[feature][sample]);
    let cuts: Vec<&[f64]> = cut_sets.iter().map(Vec::as_slice).collect();

    let mut bins = Array2::<u32>::zeros(features.dim());
    discretize_columns(features.view(), &cuts, bins.view_mut(), Parallelism::Parallel).unwrap();

    for (feature, row) in bins.rows().into_iter().enumerate() {
        let got: Vec<usize> = row.iter().map(|&b| b as usize).collect();
        assert_eq!(got, reference_bins(&rows[feature], &cut_sets[feature]), "feature {feature}");
    }
}

// =============================================================================
// Properties
// =============================================================================

/// Strictly increasing finite cuts: a running sum of positive steps.
fn arb_cuts(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (-100.0f64..100.0, prop_vec(0.001f64..10.0, 0..max_len)).prop_map(|(start, steps)| {
        let mut cut = start;
        steps
            .into_iter()
            .map(|step| {
                cut += step;
                cut
            })
            .collect()
    })
}

fn arb_value() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => -200.0f64..400.0,
        1 => Just(f64::NAN),
        1 => Just(f64::INFINITY),
        1 => Just(f64::NEG_INFINITY),
    ]
}

proptest! {
    #[test]
    fn matches_reference(cuts in arb_cuts(80), values in prop_vec(arb_value(), 0..300)) {
        let mut bins = vec![0i64; values.len()];
        discretize(&values, &cuts, &mut bins).unwrap();
        prop_assert_eq!(as_usize(&bins), reference_bins(&values, &cuts));
    }

    #[test]
    fn missing_only_for_nan(cuts in arb_cuts(40), values in prop_vec(arb_value(), 1..100)) {
        let mut bins = vec![0u32; values.len()];
        discretize(&values, &cuts, &mut bins).unwrap();
        for (v, b) in values.iter().zip(&bins) {
            prop_assert_eq!(*b == 0, v.is_nan());
            prop_assert!(*b as usize <= cuts.len() + 1);
        }
    }

    #[test]
    fn monotone_in_value(cuts in arb_cuts(60), values in prop_vec(-200.0f64..400.0, 1..200)) {
        let mut values = values;
        values.sort_by(f64::total_cmp);
        let mut bins = vec![0u16; values.len()];
        discretize(&values, &cuts, &mut bins).unwrap();
        prop_assert!(bins.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn deterministic(cuts in arb_cuts(60), values in prop_vec(arb_value(), 0..200)) {
        let mut first = vec![0u16; values.len()];
        let mut second = vec![0u16; values.len()];
        discretize(&values, &cuts, &mut first).unwrap();
        discretize(&values, &cuts, &mut second).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn regimes_agree(cuts in arb_cuts(200), values in prop_vec(arb_value(), 0..100)) {
        let expected = reference_bins(&values, &cuts);
        let mut regimes = vec![Regime::Missing, Regime::Linear, Regime::Search];
        regimes.extend(TABLE_SIZES.iter().map(|&len| Regime::Padded(len)));
        for regime in regimes.into_iter().filter(|r| r.supports(cuts.len())) {
            let mut bins = vec![0u32; values.len()];
            discretize_with_regime(regime, &values, &cuts, &mut bins).unwrap();
            prop_assert_eq!(as_usize(&bins), expected.clone(), "{:?}", regime);
        }
    }
}

// =============================================================================
// Malformed Cuts
// =============================================================================

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "not strictly increasing")]
fn decreasing_cuts_rejected_in_debug() {
    let mut bins = [0u8; 1];
    let _ = discretize(&[1.0], &[3.0, 2.0, 1.0], &mut bins);
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "is not finite")]
fn infinite_cut_rejected_in_debug() {
    let mut bins = [0u8; 1];
    let _ = discretize_with_regime(Regime::Linear, &[1.0], &[1.0, f64::INFINITY], &mut bins);
}

#[cfg(not(debug_assertions))]
#[rstest]
#[case(Regime::Missing, vec![])]
#[case(Regime::Linear, vec![5.0, 1.0, 3.0])]
#[case(Regime::Linear, vec![2.0, 2.0, 2.0, 1.0, 7.0, 0.0])]
#[case(Regime::Padded(16), vec![9.0, 1.0, 4.0, 4.0, -3.0, 12.0, 0.5, 8.0])]
#[case(Regime::Padded(16), vec![14.0, 13.0, 12.0, 11.0, 10.0, 9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0])]
#[case(Regime::Search, vec![3.0, 2.0, 1.0])]
#[case(Regime::Search, vec![1.0, 1.0, 1.0, 1.0, 0.0, 9.0, 4.0, 4.0, 2.0, 6.0])]
fn malformed_cuts_stay_in_range(#[case] regime: Regime, #[case] cuts: Vec<f64>) {
    let mut values: Vec<f64> = (-20..=20).map(|v| f64::from(v) * 0.75).collect();
    values.extend([f64::NAN, f64::NEG_INFINITY, f64::INFINITY, 1.0, 2.0, 4.0]);
    let max_bin = cuts.len() + 1;

    let mut bins = vec![u16::MAX; values.len()];
    discretize_with_regime(regime, &values, &cuts, &mut bins).unwrap();
    let mut auto = vec![u16::MAX; values.len()];
    discretize(&values, &cuts, &mut auto).unwrap();

    for out in [&bins, &auto] {
        for (&value, &bin) in values.iter().zip(out.iter()) {
            let bin = usize::from(bin);
            assert!(bin <= max_bin, "{regime:?}: {value} -> {bin} > {max_bin}");
            if value.is_nan() {
                assert_eq!(bin, 0, "{regime:?}: NaN must map to 0");
            } else {
                assert!(bin >= 1, "{regime:?}: {value} -> 0");
            }
        }
    }
}
