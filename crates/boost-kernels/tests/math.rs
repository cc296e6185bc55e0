//! Integration tests for the exp/log approximations and softmax.

use approx::assert_relative_eq;
use boost_kernels::math::{exp32_slice, exp32_with, log32_slice, log32_with};
use boost_kernels::{exp32, log32, softmax, DefaultLanes, Lanes};
use proptest::prelude::*;

#[test]
fn exp_over_its_range() {
    let mut x = -87.0f32;
    while x < 87.0 {
        assert_relative_eq!(exp32(x), x.exp(), max_relative = 2e-6);
        x += 0.173;
    }
}

#[test]
fn log_over_its_range() {
    let mut x = 1e-30f32;
    while x < 1e30 {
        assert_relative_eq!(log32(x), x.ln(), max_relative = 2e-6, epsilon = 1e-6);
        x *= 1.37;
    }
}

#[test]
fn edge_values() {
    assert_eq!(exp32(f32::INFINITY), f32::INFINITY);
    assert_eq!(exp32(f32::NEG_INFINITY), 0.0);
    assert_eq!(exp32(100.0f32), f32::INFINITY);
    assert_eq!(exp32(-100.0f32), 0.0);
    assert!(exp32(f32::NAN).is_nan());

    assert_eq!(log32(0.0f32), f32::NEG_INFINITY);
    assert_eq!(log32(f32::INFINITY), f32::INFINITY);
    assert!(log32(-1.0f32).is_nan());
    assert!(log32(f32::NAN).is_nan());
    assert_eq!(log32(1.0f32), 0.0);
}

#[test]
fn negated_variants() {
    let x = 1.25f32;
    assert_relative_eq!(
        exp32_with::<f32, true, true, true, true>(x),
        (-x).exp(),
        max_relative = 2e-6
    );
    assert_relative_eq!(
        log32_with::<f32, true, true, true, true, true>(x),
        -x.ln(),
        max_relative = 2e-6
    );
    assert_eq!(
        log32_with::<f32, true, true, true, true, true>(0.0),
        f32::INFINITY
    );
}

#[test]
fn slices_agree_with_lanes() {
    let src: Vec<f32> = (0..37).map(|i| i as f32 * 0.25 - 4.0).collect();
    let mut exp = vec![0.0f32; src.len()];
    exp32_slice(&src, &mut exp);

    let mut logs = vec![0.0f32; src.len()];
    log32_slice(&exp, &mut logs);
    for (&x, &y) in src.iter().zip(&logs) {
        assert_relative_eq!(y, x, epsilon = 2e-6, max_relative = 1e-5);
    }

    let mut lane_out = vec![0.0f32; DefaultLanes::WIDTH];
    exp32(DefaultLanes::load(&src[..DefaultLanes::WIDTH])).store(&mut lane_out);
    assert_eq!(&lane_out[..], &exp[..DefaultLanes::WIDTH]);
}

#[test]
fn softmax_binary() {
    let logits = [0.0, 1.0, -2.0, 800.0, -800.0];
    let mut probabilities = [0.0; 5];
    softmax(2, &logits, &mut probabilities).unwrap();
    for (&l, &p) in logits.iter().zip(&probabilities) {
        assert_relative_eq!(p, 1.0 / (1.0 + (-l).exp()), max_relative = 1e-12);
    }
    assert_eq!(probabilities[3], 1.0);
    assert_eq!(probabilities[4], 0.0);
}

#[test]
fn softmax_length_mismatch() {
    let mut probabilities = [0.0; 1];
    assert!(softmax(2, &[0.0, 1.0], &mut probabilities).is_err());
}

proptest! {
    #[test]
    fn exp_log_round_trip(x in -80.0f32..80.0) {
        let y = log32(exp32(x));
        prop_assert!((y - x).abs() <= 1e-5 * x.abs().max(1.0), "{} -> {}", x, y);
    }

    #[test]
    fn exp_of_opposites_multiply_to_one(x in -40.0f32..40.0) {
        let product = f64::from(exp32(x)) * f64::from(exp32(-x));
        prop_assert!((product - 1.0).abs() <= 1e-5, "{} -> {}", x, product);
    }
}
