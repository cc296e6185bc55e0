//! Math primitives for loss functions.
//!
//! Everything here is generic over [`Lanes`], implemented for plain `f32`
//! and, with the `simd` feature, for `wide::f32x8`. Edge-case handling in
//! [`exp32_with`] and [`log32_with`] is chosen at compile time through const
//! generics: disabled checks cost nothing and leave the affected inputs with
//! unspecified results.
//!
//! # Example
//!
//! ```
//! use boost_kernels::math::{exp32, log32};
//!
//! let x = 1.5f32;
//! assert!((log32(exp32(x)) - x).abs() < 1e-5);
//! ```

mod lanes;
mod softmax;
mod transcendental;

pub use lanes::{exponent, mantissa, power2, DefaultLanes, Lanes};
pub use softmax::{softmax, SoftmaxError};
pub use transcendental::{
    exp32, exp32_slice, exp32_with, log32, log32_slice, log32_with, polynomial5, polynomial8,
    EXP_OVERFLOW_POINT, EXP_UNDERFLOW_POINT,
};
