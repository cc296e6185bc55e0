//! boost-kernels: numeric kernels for gradient boosting training.
//!
//! The hot loops a boosting engine runs on every round, written to stay
//! branch-predictable on unordered real-world data:
//!
//! - [`discretize`] - continuous feature values to bin indices, bin 0 reserved
//!   for missing (NaN) values
//! - [`update`] - applies a trained update tensor to per-sample gradients,
//!   hessians and scores, optionally reporting a metric
//! - [`math`] - lane-parallel `exp`/`log` approximations used by loss functions
//!
//! # Key Types
//!
//! - [`discretize()`] / [`discretize_raw`] - slice and status-code entry points
//! - [`UpdateBatch`] / [`Objective`] - update application per objective
//! - [`Lanes`] - scalar or SIMD numeric type the math primitives run on
//!
//! # Example
//!
//! ```
//! use boost_kernels::discretize;
//!
//! let cuts = [1.0, 5.0, 9.0];
//! let values = [0.5, 1.0, 5.0, 9.5, f64::NAN];
//! let mut bins = [0i64; 5];
//! discretize(&values, &cuts, &mut bins).unwrap();
//! assert_eq!(bins, [1, 2, 3, 4, 0]);
//! ```

#[macro_use]
mod logging;

pub mod discretize;
pub mod math;
pub mod params;
pub mod status;
pub mod testing;
pub mod update;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use discretize::{
    discretize, discretize_columns, discretize_par, discretize_raw, discretize_with_regime,
    BinIndex, DiscretizeError, Regime,
};
pub use math::{exp32, log32, softmax, DefaultLanes, Lanes};
pub use params::{KernelParams, ParamValidationError};
pub use status::Status;
pub use update::{
    apply_update, apply_update_mse, LogisticLoss, Objective, ObjectiveConfig, ObjectiveError,
    PseudoHuberLoss, SquaredLoss, TensorBins, UpdateBatch, UpdateError, UpdateObjective,
};
pub use utils::{run_with_threads, Parallelism};
