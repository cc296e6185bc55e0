//! The numeric lane abstraction the math primitives are written against.
//!
//! A [`Lanes`] value is either one `f32` or a packed vector of `f32`s. The
//! approximation code in this crate is generic over it, so the same
//! polynomial serves the scalar tail and the 8-wide body of a loop.

use std::ops::{Add, Div, Mul, Neg, Sub};

/// Float lanes with the operations needed by the `exp`/`log` approximations.
///
/// Comparisons produce a [`Lanes::Mask`] consumed by [`Lanes::select`];
/// nothing branches on individual lanes.
pub trait Lanes:
    Copy
    + Send
    + Sync
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    /// Per-lane comparison result.
    type Mask: Copy;
    /// Integer lanes holding the same bits.
    type Bits: Copy;

    /// Number of `f32` lanes.
    const WIDTH: usize;

    fn splat(value: f32) -> Self;

    /// Load the first `WIDTH` values of `src`.
    fn load(src: &[f32]) -> Self;

    /// Store into the first `WIDTH` slots of `dst`.
    fn store(self, dst: &mut [f32]);

    /// `self * m + a`.
    fn fma(self, m: Self, a: Self) -> Self;

    /// `a - self * m`.
    fn fnma(self, m: Self, a: Self) -> Self;

    /// Round to nearest integer, ties to even.
    fn round_even(self) -> Self;

    fn sqrt(self) -> Self;

    fn less(self, rhs: Self) -> Self::Mask;
    fn less_eq(self, rhs: Self) -> Self::Mask;
    fn equal(self, rhs: Self) -> Self::Mask;
    fn nan_mask(self) -> Self::Mask;

    /// Per lane: `if_true` where `mask` is set, else `if_false`.
    fn select(mask: Self::Mask, if_true: Self, if_false: Self) -> Self;

    /// Sum of all lanes.
    fn sum_lanes(self) -> f32;

    fn to_int_bits(self) -> Self::Bits;
    fn from_int_bits(bits: Self::Bits) -> Self;
    fn bits_and(bits: Self::Bits, mask: i32) -> Self::Bits;
    fn bits_or(bits: Self::Bits, mask: i32) -> Self::Bits;
    fn bits_shl(bits: Self::Bits, shift: i32) -> Self::Bits;
    fn bits_shr(bits: Self::Bits, shift: i32) -> Self::Bits;

    /// Numeric (not bitwise) conversion of integer lanes.
    fn bits_to_float(bits: Self::Bits) -> Self;
}

// =============================================================================
// Scalar
// =============================================================================

impl Lanes for f32 {
    type Mask = bool;
    type Bits = i32;

    const WIDTH: usize = 1;

    #[inline(always)]
    fn splat(value: f32) -> Self {
        value
    }

    #[inline(always)]
    fn load(src: &[f32]) -> Self {
        src[0]
    }

    #[inline(always)]
    fn store(self, dst: &mut [f32]) {
        dst[0] = self;
    }

    #[inline(always)]
    fn fma(self, m: Self, a: Self) -> Self {
        f32::mul_add(self, m, a)
    }

    #[inline(always)]
    fn fnma(self, m: Self, a: Self) -> Self {
        f32::mul_add(-self, m, a)
    }

    #[inline(always)]
    fn round_even(self) -> Self {
        self.round_ties_even()
    }

    #[inline(always)]
    fn sqrt(self) -> Self {
        f32::sqrt(self)
    }

    #[inline(always)]
    fn less(self, rhs: Self) -> bool {
        self < rhs
    }

    #[inline(always)]
    fn less_eq(self, rhs: Self) -> bool {
        self <= rhs
    }

    #[inline(always)]
    fn equal(self, rhs: Self) -> bool {
        self == rhs
    }

    #[inline(always)]
    fn nan_mask(self) -> bool {
        self.is_nan()
    }

    #[inline(always)]
    fn select(mask: bool, if_true: Self, if_false: Self) -> Self {
        if mask {
            if_true
        } else {
            if_false
        }
    }

    #[inline(always)]
    fn sum_lanes(self) -> f32 {
        self
    }

    #[inline(always)]
    fn to_int_bits(self) -> i32 {
        self.to_bits() as i32
    }

    #[inline(always)]
    fn from_int_bits(bits: i32) -> Self {
        f32::from_bits(bits as u32)
    }

    #[inline(always)]
    fn bits_and(bits: i32, mask: i32) -> i32 {
        bits & mask
    }

    #[inline(always)]
    fn bits_or(bits: i32, mask: i32) -> i32 {
        bits | mask
    }

    #[inline(always)]
    fn bits_shl(bits: i32, shift: i32) -> i32 {
        bits.wrapping_shl(shift as u32)
    }

    #[inline(always)]
    fn bits_shr(bits: i32, shift: i32) -> i32 {
        bits >> shift
    }

    #[inline(always)]
    fn bits_to_float(bits: i32) -> Self {
        bits as f32
    }
}

// =============================================================================
// SIMD (8 lanes)
// =============================================================================

#[cfg(feature = "simd")]
mod simd {
    use super::Lanes;
    use wide::{f32x8, i32x8, CmpEq, CmpLe, CmpLt};

    impl Lanes for f32x8 {
        type Mask = f32x8;
        type Bits = i32x8;

        const WIDTH: usize = 8;

        #[inline(always)]
        fn splat(value: f32) -> Self {
            f32x8::splat(value)
        }

        #[inline(always)]
        fn load(src: &[f32]) -> Self {
            let mut lanes = [0.0f32; 8];
            lanes.copy_from_slice(&src[..8]);
            f32x8::from(lanes)
        }

        #[inline(always)]
        fn store(self, dst: &mut [f32]) {
            dst[..8].copy_from_slice(&self.to_array());
        }

        #[inline(always)]
        fn fma(self, m: Self, a: Self) -> Self {
            self.mul_add(m, a)
        }

        #[inline(always)]
        fn fnma(self, m: Self, a: Self) -> Self {
            (-self).mul_add(m, a)
        }

        #[inline(always)]
        fn round_even(self) -> Self {
            self.round()
        }

        #[inline(always)]
        fn sqrt(self) -> Self {
            f32x8::sqrt(self)
        }

        #[inline(always)]
        fn less(self, rhs: Self) -> f32x8 {
            self.cmp_lt(rhs)
        }

        #[inline(always)]
        fn less_eq(self, rhs: Self) -> f32x8 {
            self.cmp_le(rhs)
        }

        #[inline(always)]
        fn equal(self, rhs: Self) -> f32x8 {
            self.cmp_eq(rhs)
        }

        #[inline(always)]
        fn nan_mask(self) -> f32x8 {
            self.is_nan()
        }

        #[inline(always)]
        fn select(mask: f32x8, if_true: Self, if_false: Self) -> Self {
            mask.blend(if_true, if_false)
        }

        #[inline(always)]
        fn sum_lanes(self) -> f32 {
            self.to_array().iter().sum()
        }

        #[inline(always)]
        fn to_int_bits(self) -> i32x8 {
            bytemuck::cast(self)
        }

        #[inline(always)]
        fn from_int_bits(bits: i32x8) -> Self {
            bytemuck::cast(bits)
        }

        #[inline(always)]
        fn bits_and(bits: i32x8, mask: i32) -> i32x8 {
            bits & i32x8::splat(mask)
        }

        #[inline(always)]
        fn bits_or(bits: i32x8, mask: i32) -> i32x8 {
            bits | i32x8::splat(mask)
        }

        #[inline(always)]
        fn bits_shl(bits: i32x8, shift: i32) -> i32x8 {
            bits << shift
        }

        #[inline(always)]
        fn bits_shr(bits: i32x8, shift: i32) -> i32x8 {
            bits >> shift
        }

        #[inline(always)]
        fn bits_to_float(bits: i32x8) -> Self {
            f32x8::from_i32x8(bits)
        }
    }
}

/// Widest lanes available in this build.
#[cfg(feature = "simd")]
pub type DefaultLanes = wide::f32x8;

/// Widest lanes available in this build.
#[cfg(not(feature = "simd"))]
pub type DefaultLanes = f32;

// =============================================================================
// Bit-level helpers
// =============================================================================

/// Mantissa of `value` rescaled into [0.5, 1).
#[inline(always)]
pub fn mantissa<F: Lanes>(value: F) -> F {
    let bits = F::bits_and(value.to_int_bits(), 0x007F_FFFF);
    F::from_int_bits(F::bits_or(bits, 0x3F00_0000))
}

/// Unbiased binary exponent of `value`, as a float.
#[inline(always)]
pub fn exponent<F: Lanes>(value: F) -> F {
    let biased = F::bits_and(F::bits_shr(value.to_int_bits(), 23), 0xFF);
    F::bits_to_float(biased) - F::splat(127.0)
}

/// `2^n` for integral `n` in the normal exponent range.
///
/// Adding `2^23 + 127` moves the biased exponent into the low mantissa bits,
/// which are then shifted into the exponent field.
#[inline(always)]
pub fn power2<F: Lanes>(n: F) -> F {
    let shifted = (n + F::splat(8_388_608.0 + 127.0)).to_int_bits();
    F::from_int_bits(F::bits_shl(shifted, 23))
}
