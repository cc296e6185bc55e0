//! Applying a trained update tensor to per-sample training state.
//!
//! After each boosting step the new term's update tensor is folded into every
//! sample. The tensor cell for a sample is given by its bin index, read from
//! bit-packed storage (see [`packing`]); a zero-dimensional tensor has a single
//! cell that applies to all samples.
//!
//! # Paths
//!
//! - **Squared error** ([`apply_update_mse`]): stored gradients are residuals,
//!   so the update is added to them directly. The optional metric is
//!   `Σ w·g²` over the updated gradients.
//! - **General objectives** ([`apply_update`]): the per-sample score moves by
//!   the update, then gradient, hessian and metric are recomputed from
//!   `(score, target)` by an [`UpdateObjective`]. Weights multiply only the
//!   metric.
//!
//! [`Objective::apply_update`] picks the path for a configured objective.
//!
//! # Example
//!
//! ```
//! use boost_kernels::{Objective, TensorBins, UpdateBatch};
//!
//! let mut gradients = vec![1.0f32, -1.0, 0.5];
//! let metric = Objective::squared()
//!     .apply_update(UpdateBatch {
//!         bins: TensorBins::Scalar,
//!         update_scores: &[0.5],
//!         gradients: &mut gradients,
//!         hessians: None,
//!         sample_scores: None,
//!         targets: None,
//!         weights: None,
//!         calc_metric: true,
//!     })
//!     .unwrap();
//! assert_eq!(gradients, [1.5, -0.5, 1.0]);
//! assert_eq!(metric, Some(2.25 + 0.25 + 1.0));
//! ```

mod kernels;
mod objectives;
pub mod packing;

use std::iter;

use thiserror::Error;

pub use objectives::{
    LogisticLoss, Objective, ObjectiveConfig, ObjectiveError, PseudoHuberLoss, SquaredLoss,
    UpdateObjective,
};
pub use packing::{
    bits_per_item, items_per_pack_for_bins, low_mask, pack_bins, packed_len, PackedBins,
    BITS_PER_WORD,
};

use crate::logging::LogBudget;
use kernels::Buffers;

static ENTER_BUDGET: LogBudget = LogBudget::new(25);
static EXIT_BUDGET: LogBudget = LogBudget::new(25);

// =============================================================================
// Inputs
// =============================================================================

/// Where each sample's tensor cell comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorBins<'a> {
    /// Zero-dimensional update: `update_scores[0]` applies to every sample.
    Scalar,
    /// Per-sample bin indices, `items_per_pack` to a word.
    Packed {
        words: &'a [u64],
        items_per_pack: usize,
    },
}

/// One update application over `gradients.len()` samples.
///
/// Every optional per-sample buffer must be as long as `gradients`.
#[derive(Debug)]
pub struct UpdateBatch<'a> {
    pub bins: TensorBins<'a>,
    /// The update tensor, indexed by bin.
    pub update_scores: &'a [f32],
    pub gradients: &'a mut [f32],
    /// Filled when present; only for objectives with a hessian.
    pub hessians: Option<&'a mut [f32]>,
    /// Per-sample scores; required by general objectives.
    pub sample_scores: Option<&'a mut [f32]>,
    /// Per-sample targets; required by general objectives.
    pub targets: Option<&'a [f32]>,
    /// Per-sample weights applied to the metric.
    pub weights: Option<&'a [f32]>,
    /// Whether to compute and return the metric sum.
    pub calc_metric: bool,
}

/// Why an update could not be applied. Nothing is written on error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateError {
    #[error("{buffer} holds {got} samples, expected {expected}")]
    LengthMismatch {
        buffer: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("items per pack must be in 1..=64, got {0}")]
    InvalidItemsPerPack(usize),

    #[error("packed bins hold {words} words, {required} required")]
    PackedTooShort { words: usize, required: usize },

    #[error("bin {bin} does not fit in {bits} bits")]
    BinTooWide { bin: usize, bits: usize },

    #[error("update tensor is empty")]
    EmptyTensor,

    #[error("bin {bin} is outside the update tensor of {len} cells")]
    BinOutOfRange { bin: usize, len: usize },

    #[error("{0} objective needs per-sample scores")]
    MissingScores(&'static str),

    #[error("{0} objective needs per-sample targets")]
    MissingTargets(&'static str),

    #[error("{0} objective has no hessian")]
    HessianUnsupported(&'static str),
}

impl UpdateBatch<'_> {
    /// Number of samples, after checking every buffer against it.
    fn validate(&self) -> Result<usize, UpdateError> {
        let n = self.gradients.len();
        let lengths = [
            ("hessians", self.hessians.as_deref().map(<[f32]>::len)),
            ("sample_scores", self.sample_scores.as_deref().map(<[f32]>::len)),
            ("targets", self.targets.map(<[f32]>::len)),
            ("weights", self.weights.map(<[f32]>::len)),
        ];
        for (buffer, len) in lengths {
            match len {
                Some(got) if got != n => {
                    return Err(UpdateError::LengthMismatch {
                        buffer,
                        expected: n,
                        got,
                    })
                }
                _ => {}
            }
        }
        if n == 0 {
            return Ok(0);
        }
        if self.update_scores.is_empty() {
            return Err(UpdateError::EmptyTensor);
        }
        if let TensorBins::Packed {
            words,
            items_per_pack,
        } = self.bins
        {
            packing::check_items_per_pack(items_per_pack)?;
            let required = packed_len(n, items_per_pack);
            if words.len() < required {
                return Err(UpdateError::PackedTooShort {
                    words: words.len(),
                    required,
                });
            }
            // skip the scan when no field value can reach past the tensor
            let len = self.update_scores.len();
            if (len as u64) <= low_mask(bits_per_item(items_per_pack)) {
                let widest = PackedBins::new(words, items_per_pack, n).max();
                if let Some(bin) = widest.filter(|&bin| bin >= len) {
                    return Err(UpdateError::BinOutOfRange { bin, len });
                }
            }
        }
        Ok(n)
    }
}

fn log_failure(err: UpdateError) -> UpdateError {
    log::error!("update rejected: {err}");
    err
}

fn empty_metric(calc_metric: bool) -> Option<f64> {
    calc_metric.then_some(0.0)
}

// =============================================================================
// Entry points
// =============================================================================

/// Squared-error update of stored gradients.
///
/// `gradient += update` per sample (sample scores, if given, move by the same
/// amount). Targets are not needed. Requesting hessians is an error.
pub fn apply_update_mse(batch: UpdateBatch<'_>) -> Result<Option<f64>, UpdateError> {
    let n = batch.validate().map_err(log_failure)?;
    log_counted!(ENTER_BUDGET, "Entered apply_update: objective=squared, samples={n}");
    if n == 0 {
        return Ok(empty_metric(batch.calc_metric));
    }
    if batch.hessians.is_some() {
        return Err(log_failure(UpdateError::HessianUnsupported("squared")));
    }

    let UpdateBatch {
        bins,
        update_scores,
        gradients,
        sample_scores,
        weights,
        calc_metric,
        ..
    } = batch;
    let scores = sample_scores.unwrap_or_default();
    let weights = weights.unwrap_or_default();

    let sum = match bins {
        TensorBins::Scalar => {
            let updates = iter::repeat(update_scores[0]).take(n);
            kernels::squared(updates, gradients, scores, weights, calc_metric)
        }
        TensorBins::Packed {
            words,
            items_per_pack,
        } => {
            let updates = PackedBins::new(words, items_per_pack, n).map(|bin| update_scores[bin]);
            kernels::squared(updates, gradients, scores, weights, calc_metric)
        }
    };

    log_counted!(EXIT_BUDGET, "Exited apply_update: objective=squared");
    Ok(calc_metric.then_some(sum))
}

/// Update scores and recompute derivatives for a general objective.
///
/// Needs `sample_scores` and `targets`. Fills `hessians` when given, which
/// requires an objective with a hessian.
pub fn apply_update<O: UpdateObjective>(
    objective: &O,
    batch: UpdateBatch<'_>,
) -> Result<Option<f64>, UpdateError> {
    let name = objective.name();
    let n = batch.validate().map_err(log_failure)?;
    log_counted!(ENTER_BUDGET, "Entered apply_update: objective={name}, samples={n}");
    if n == 0 {
        return Ok(empty_metric(batch.calc_metric));
    }
    if batch.hessians.is_some() && !O::HAS_HESSIAN {
        return Err(log_failure(UpdateError::HessianUnsupported(name)));
    }

    let UpdateBatch {
        bins,
        update_scores,
        gradients,
        hessians,
        sample_scores,
        targets,
        weights,
        calc_metric,
    } = batch;
    let buffers = Buffers {
        scores: sample_scores
            .ok_or(UpdateError::MissingScores(name))
            .map_err(log_failure)?,
        targets: targets
            .ok_or(UpdateError::MissingTargets(name))
            .map_err(log_failure)?,
        gradients,
        hessians: hessians.unwrap_or_default(),
        weights: weights.unwrap_or_default(),
    };

    let sum = match bins {
        TensorBins::Scalar => {
            let updates = iter::repeat(update_scores[0]).take(n);
            kernels::general(objective, updates, buffers, calc_metric)
        }
        TensorBins::Packed {
            words,
            items_per_pack,
        } => {
            let updates = PackedBins::new(words, items_per_pack, n).map(|bin| update_scores[bin]);
            kernels::general(objective, updates, buffers, calc_metric)
        }
    };

    log_counted!(EXIT_BUDGET, "Exited apply_update: objective={name}");
    Ok(calc_metric.then_some(sum))
}

impl Objective {
    /// Apply `batch` with the kernels for this objective.
    pub fn apply_update(&self, batch: UpdateBatch<'_>) -> Result<Option<f64>, UpdateError> {
        match self {
            Self::Squared(_) => apply_update_mse(batch),
            Self::PseudoHuber(loss) => apply_update(loss, batch),
            Self::Logistic(loss) => apply_update(loss, batch),
        }
    }
}
