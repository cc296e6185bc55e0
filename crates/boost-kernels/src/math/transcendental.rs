//! Fast `exp` and `log` approximations over [`Lanes`].
//!
//! Both use Cody-Waite range reduction with a split `ln(2)` and a short
//! polynomial on the reduced argument, giving roughly 1 ulp of error across
//! the normal `f32` range. Edge-case handling (NaN, overflow, zero, ...) is
//! switched on per call site through const generics, so a caller that knows
//! its inputs are finite pays nothing for the checks.

use super::lanes::{exponent, mantissa, power2, Lanes};

/// Inputs below this underflow `exp` to zero.
pub const EXP_UNDERFLOW_POINT: f32 = -87.25;
/// Inputs above this overflow `exp` to infinity.
pub const EXP_OVERFLOW_POINT: f32 = 87.25;

const LOG2_E: f32 = 1.442_695_040_888_963_4;
// ln(2) = LN2_HI - LN2_LO_NEG, with LN2_HI exact in few mantissa bits
const LN2_HI: f32 = 0.693_359_375;
const LN2_LO_NEG: f32 = -2.121_944_4e-4;
const SQRT_HALF: f32 = 0.707_106_78;

const EXP_COEFFS: [f32; 6] = [
    1.0 / 2.0,
    1.0 / 6.0,
    1.0 / 24.0,
    1.0 / 120.0,
    1.0 / 720.0,
    1.0 / 5040.0,
];

const LOG_COEFFS: [f32; 9] = [
    3.333_333_1e-1,
    -2.499_999_4e-1,
    2.000_071_5e-1,
    -1.666_805_8e-1,
    1.424_932_3e-1,
    -1.242_014_1e-1,
    1.167_699_9e-1,
    -1.151_461e-1,
    7.037_683_6e-2,
];

// =============================================================================
// Polynomials
// =============================================================================

/// Degree-5 polynomial in Estrin form.
#[inline(always)]
pub fn polynomial5<F: Lanes>(x: F, c: &[f32; 6]) -> F {
    let x2 = x * x;
    let x4 = x2 * x2;
    let s = F::splat;
    let low = x.fma(s(c[1]), s(c[0]));
    let mid = x.fma(s(c[3]), s(c[2]));
    let high = x.fma(s(c[5]), s(c[4]));
    mid.fma(x2, high.fma(x4, low))
}

/// Degree-8 polynomial in Estrin form.
#[inline(always)]
pub fn polynomial8<F: Lanes>(x: F, c: &[f32; 9]) -> F {
    let x2 = x * x;
    let x4 = x2 * x2;
    let x8 = x4 * x4;
    let s = F::splat;
    let p01 = x.fma(s(c[1]), s(c[0]));
    let p23 = x.fma(s(c[3]), s(c[2]));
    let p45 = x.fma(s(c[5]), s(c[4]));
    let p67 = x.fma(s(c[7]), s(c[6]));
    let upper = p67.fma(x2, p45);
    let lower = p23.fma(x2, p01 + s(c[8]) * x8);
    upper.fma(x4, lower)
}

// =============================================================================
// exp
// =============================================================================

/// `exp(val)` (or `exp(-val)` with `NEGATE`) with selectable edge handling.
///
/// - `NAN`: NaN inputs return NaN
/// - `UNDERFLOW`: results below [`EXP_UNDERFLOW_POINT`] are flushed to 0
/// - `OVERFLOW`: results above [`EXP_OVERFLOW_POINT`] become +inf
///
/// With a check disabled the corresponding inputs give unspecified values.
#[inline(always)]
pub fn exp32_with<
    F: Lanes,
    const NEGATE: bool,
    const NAN: bool,
    const UNDERFLOW: bool,
    const OVERFLOW: bool,
>(
    val: F,
) -> F {
    let s = F::splat;
    let mut x = if NEGATE { -val } else { val };

    let rounded = (x * s(LOG2_E)).round_even();
    x = rounded.fnma(s(LN2_HI), x);
    x = rounded.fnma(s(LN2_LO_NEG), x);

    let x2 = x * x;
    let mut ret = polynomial5(x, &EXP_COEFFS);
    ret = ret.fma(x2, x);
    ret = (ret + s(1.0)) * power2(rounded);

    if OVERFLOW {
        let overflowed = if NEGATE {
            val.less(s(-EXP_OVERFLOW_POINT))
        } else {
            s(EXP_OVERFLOW_POINT).less(val)
        };
        ret = F::select(overflowed, s(f32::INFINITY), ret);
    }
    if UNDERFLOW {
        let underflowed = if NEGATE {
            s(-EXP_UNDERFLOW_POINT).less(val)
        } else {
            val.less(s(EXP_UNDERFLOW_POINT))
        };
        ret = F::select(underflowed, s(0.0), ret);
    }
    if NAN {
        ret = F::select(val.nan_mask(), val, ret);
    }
    ret
}

/// `exp` with every edge case handled.
#[inline(always)]
pub fn exp32<F: Lanes>(val: F) -> F {
    exp32_with::<F, false, true, true, true>(val)
}

// =============================================================================
// log
// =============================================================================

/// Natural log of `val` (negated with `NEGATE_OUTPUT`) with selectable edge
/// handling.
///
/// - `NAN`: NaN inputs return NaN
/// - `NEGATIVE`: negative inputs return NaN
/// - `ZERO`: zero and subnormal inputs return -inf
/// - `POS_INF`: +inf returns +inf
///
/// With `NEGATE_OUTPUT` the infinities above flip sign. Disabled checks give
/// unspecified values for the corresponding inputs.
#[inline(always)]
pub fn log32_with<
    F: Lanes,
    const NEGATE_OUTPUT: bool,
    const NAN: bool,
    const NEGATIVE: bool,
    const ZERO: bool,
    const POS_INF: bool,
>(
    val: F,
) -> F {
    let s = F::splat;
    let mut x = mantissa(val);
    let mut e = exponent(val);

    let small = x.less_eq(s(SQRT_HALF));
    x = F::select(small, x + x, x);
    e = F::select(small, e, e + s(1.0));
    x = x - s(1.0);

    let x2 = x * x;
    let mut ret = polynomial8(x, &LOG_COEFFS);
    ret = ret * (x2 * x);
    ret = e.fma(s(LN2_LO_NEG), ret);
    ret = ret + x2.fnma(s(0.5), x);
    ret = e.fma(s(LN2_HI), ret);

    if NEGATE_OUTPUT {
        ret = -ret;
    }

    let inf_out = if NEGATE_OUTPUT {
        -f32::INFINITY
    } else {
        f32::INFINITY
    };

    if ZERO {
        ret = F::select(val.less(s(f32::MIN_POSITIVE)), s(-inf_out), ret);
    }
    if NEGATIVE {
        ret = F::select(val.less(s(0.0)), s(f32::NAN), ret);
    }
    if NAN && POS_INF {
        // one compare covers both: NaN and +inf are the only values not < inf
        let passthrough = if NEGATE_OUTPUT { -val } else { val };
        ret = F::select(val.less(s(f32::INFINITY)), ret, passthrough);
    } else if NAN {
        ret = F::select(val.nan_mask(), val, ret);
    } else if POS_INF {
        ret = F::select(val.equal(s(f32::INFINITY)), s(inf_out), ret);
    }
    ret
}

/// `ln` with every edge case handled.
#[inline(always)]
pub fn log32<F: Lanes>(val: F) -> F {
    log32_with::<F, false, true, true, true, true>(val)
}

// =============================================================================
// Slice drivers
// =============================================================================

/// Apply `f` to every value of `src`, widest lanes first, scalar tail last.
#[inline(always)]
fn map_lanes<F: Lanes>(src: &[f32], dst: &mut [f32], f: impl Fn(F) -> F, tail: impl Fn(f32) -> f32) {
    let n = src.len().min(dst.len());
    let body = n - n % F::WIDTH;
    for (s, d) in src[..body]
        .chunks_exact(F::WIDTH)
        .zip(dst[..body].chunks_exact_mut(F::WIDTH))
    {
        f(F::load(s)).store(d);
    }
    for (s, d) in src[body..n].iter().zip(&mut dst[body..n]) {
        *d = tail(*s);
    }
}

/// `dst[i] = exp(src[i])` over the shorter of the two slices.
pub fn exp32_slice(src: &[f32], dst: &mut [f32]) {
    map_lanes::<super::DefaultLanes>(src, dst, exp32, exp32::<f32>);
}

/// `dst[i] = ln(src[i])` over the shorter of the two slices.
pub fn log32_slice(src: &[f32], dst: &mut [f32]) {
    map_lanes::<super::DefaultLanes>(src, dst, log32, log32::<f32>);
}
