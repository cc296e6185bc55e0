//! Losses the update engine recomputes after moving the scores.
//!
//! Each loss is written once against [`Lanes`] and runs on both the 8-wide
//! body and the scalar tail of the update loop.
//!
//! # Available Objectives
//!
//! - [`SquaredLoss`]: mean squared error, with a dedicated fast path that
//!   updates stored gradients directly
//! - [`PseudoHuberLoss`]: robust regression with configurable delta
//! - [`LogisticLoss`]: binary classification (log loss)

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::abort_unsupported;
use crate::math::{exp32, exp32_with, log32, Lanes};

// =============================================================================
// UpdateObjective Trait
// =============================================================================

/// Per-sample loss derivatives and metric, evaluated lane-parallel.
///
/// `score` is the model's raw output after the update, `target` the label.
pub trait UpdateObjective: Send + Sync {
    /// Whether [`gradient_hessian`](Self::gradient_hessian) is meaningful.
    const HAS_HESSIAN: bool = false;

    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// First derivative of the loss with respect to the score.
    fn gradient<F: Lanes>(&self, score: F, target: F) -> F;

    /// Gradient and second derivative.
    ///
    /// Objectives without a hessian keep this default; the engine rejects
    /// hessian requests for them before calling it.
    #[inline(always)]
    fn gradient_hessian<F: Lanes>(&self, score: F, target: F) -> (F, F) {
        (self.gradient(score, target), F::splat(1.0))
    }

    /// Per-sample metric contribution, summed (and weighted) by the engine.
    fn metric<F: Lanes>(&self, score: F, target: F) -> F;
}

// =============================================================================
// SquaredLoss
// =============================================================================

/// Squared error: gradient `score - target`, metric `residual²`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SquaredLoss;

impl UpdateObjective for SquaredLoss {
    fn name(&self) -> &'static str {
        "squared"
    }

    #[inline(always)]
    fn gradient<F: Lanes>(&self, score: F, target: F) -> F {
        score - target
    }

    #[inline(always)]
    fn metric<F: Lanes>(&self, score: F, target: F) -> F {
        let residual = score - target;
        residual * residual
    }
}

// =============================================================================
// PseudoHuberLoss
// =============================================================================

/// Pseudo-Huber loss: quadratic near zero, linear beyond `delta`.
///
/// With `r = score - target` and `c = 1 + (r / delta)²`:
/// - gradient: `r / sqrt(c)`
/// - hessian: `1 / (c * sqrt(c))`
/// - metric: `delta² * (sqrt(c) - 1)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PseudoHuberLoss {
    delta: f64,
    delta_inverted: f32,
    delta_squared: f32,
}

impl PseudoHuberLoss {
    /// Create with the given delta.
    ///
    /// Rejects zero, NaN and infinite deltas, and deltas whose square or
    /// inverse is not finite in `f32`.
    pub fn new(delta: f64) -> Result<Self, ObjectiveError> {
        if delta == 0.0 || !delta.is_finite() {
            return Err(ObjectiveError::InvalidDelta(delta));
        }
        let delta_squared = (delta * delta) as f32;
        if !delta_squared.is_finite() {
            return Err(ObjectiveError::DeltaSquaredOverflow(delta));
        }
        let delta_inverted = (1.0 / delta) as f32;
        if !delta_inverted.is_finite() {
            return Err(ObjectiveError::DeltaInverseOverflow(delta));
        }
        Ok(Self {
            delta,
            delta_inverted,
            delta_squared,
        })
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// `(residual, sqrt(1 + (residual / delta)²))`
    #[inline(always)]
    fn scaled<F: Lanes>(&self, score: F, target: F) -> (F, F) {
        let residual = score - target;
        let ratio = residual * F::splat(self.delta_inverted);
        let calc = ratio.fma(ratio, F::splat(1.0));
        (residual, calc.sqrt())
    }
}

impl UpdateObjective for PseudoHuberLoss {
    const HAS_HESSIAN: bool = true;

    fn name(&self) -> &'static str {
        "pseudo_huber"
    }

    #[inline(always)]
    fn gradient<F: Lanes>(&self, score: F, target: F) -> F {
        let (residual, sqrt_calc) = self.scaled(score, target);
        residual / sqrt_calc
    }

    #[inline(always)]
    fn gradient_hessian<F: Lanes>(&self, score: F, target: F) -> (F, F) {
        let (residual, sqrt_calc) = self.scaled(score, target);
        let calc = sqrt_calc * sqrt_calc;
        (residual / sqrt_calc, F::splat(1.0) / (calc * sqrt_calc))
    }

    #[inline(always)]
    fn metric<F: Lanes>(&self, score: F, target: F) -> F {
        let (_, sqrt_calc) = self.scaled(score, target);
        F::splat(self.delta_squared) * (sqrt_calc - F::splat(1.0))
    }
}

// =============================================================================
// LogisticLoss
// =============================================================================

/// Binary log loss on raw scores, targets in {0, 1}.
///
/// With `p = sigmoid(score)`: gradient `p - y`, hessian `p (1 - p)`,
/// metric `ln(1 + e^-s)` for positive targets and `ln(1 + e^s)` otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LogisticLoss;

impl LogisticLoss {
    /// Logistic loss for `n_classes` classes.
    ///
    /// Only binary classification is implemented; any other class count is
    /// logged and the process aborts.
    pub fn new(n_classes: usize) -> Self {
        if n_classes != 2 {
            abort_unsupported(format_args!(
                "logistic loss supports 2 classes only, got {n_classes}"
            ));
        }
        Self
    }

    #[inline(always)]
    fn probability<F: Lanes>(score: F) -> F {
        // exp(-score) overflows to inf for very negative scores, giving p = 0
        F::splat(1.0) / (F::splat(1.0) + exp32_with::<F, true, true, true, true>(score))
    }
}

impl UpdateObjective for LogisticLoss {
    const HAS_HESSIAN: bool = true;

    fn name(&self) -> &'static str {
        "logistic"
    }

    #[inline(always)]
    fn gradient<F: Lanes>(&self, score: F, target: F) -> F {
        Self::probability(score) - target
    }

    #[inline(always)]
    fn gradient_hessian<F: Lanes>(&self, score: F, target: F) -> (F, F) {
        let p = Self::probability(score);
        (p - target, p * (F::splat(1.0) - p))
    }

    #[inline(always)]
    fn metric<F: Lanes>(&self, score: F, target: F) -> F {
        let positive = F::splat(0.5).less(target);
        let arg = F::select(positive, -score, score);
        let softplus = log32(F::splat(1.0) + exp32(arg));
        // ln(1 + e^x) == x to f32 precision past 16
        F::select(F::splat(16.0).less(arg), arg, softplus)
    }
}

// =============================================================================
// Objective (configuration)
// =============================================================================

/// Invalid objective parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ObjectiveError {
    #[error("pseudo-Huber delta must be finite and non-zero, got {0}")]
    InvalidDelta(f64),

    #[error("pseudo-Huber delta {0} squared overflows f32")]
    DeltaSquaredOverflow(f64),

    #[error("pseudo-Huber delta {0} inverted overflows f32")]
    DeltaInverseOverflow(f64),
}

/// Serialized form of an [`Objective`].
///
/// ```
/// use boost_kernels::{Objective, ObjectiveConfig};
///
/// let config: ObjectiveConfig = serde_json::from_str(r#"{"type": "pseudo_huber", "delta": 1.5}"#).unwrap();
/// assert_eq!(config, ObjectiveConfig::PseudoHuber { delta: 1.5 });
/// let objective = Objective::try_from(config).unwrap();
/// assert!(objective.has_hessian());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectiveConfig {
    Squared,
    PseudoHuber {
        delta: f64,
    },
    Logistic {
        #[serde(default = "binary_classes")]
        n_classes: usize,
    },
}

fn binary_classes() -> usize {
    2
}

/// The objective an update is applied for, chosen at configuration time.
///
/// Each variant dispatches to kernels monomorphized for its loss.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ObjectiveConfig", into = "ObjectiveConfig")]
pub enum Objective {
    /// Squared error; uses the stored-gradient fast path.
    Squared(SquaredLoss),
    /// Pseudo-Huber loss for robust regression.
    PseudoHuber(PseudoHuberLoss),
    /// Binary logistic loss.
    Logistic(LogisticLoss),
}

/// Convenience constructors.
impl Objective {
    pub fn squared() -> Self {
        Self::Squared(SquaredLoss)
    }

    pub fn pseudo_huber(delta: f64) -> Result<Self, ObjectiveError> {
        PseudoHuberLoss::new(delta).map(Self::PseudoHuber)
    }

    pub fn logistic() -> Self {
        Self::Logistic(LogisticLoss)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Squared(loss) => loss.name(),
            Self::PseudoHuber(loss) => loss.name(),
            Self::Logistic(loss) => loss.name(),
        }
    }

    /// Whether this objective can fill a hessian buffer.
    pub fn has_hessian(&self) -> bool {
        match self {
            Self::Squared(_) => SquaredLoss::HAS_HESSIAN,
            Self::PseudoHuber(_) => PseudoHuberLoss::HAS_HESSIAN,
            Self::Logistic(_) => LogisticLoss::HAS_HESSIAN,
        }
    }

    /// Whether updates need per-sample scores and targets.
    ///
    /// Squared error updates the stored gradients directly.
    pub fn needs_scores(&self) -> bool {
        !matches!(self, Self::Squared(_))
    }
}

impl TryFrom<ObjectiveConfig> for Objective {
    type Error = ObjectiveError;

    fn try_from(config: ObjectiveConfig) -> Result<Self, Self::Error> {
        match config {
            ObjectiveConfig::Squared => Ok(Self::squared()),
            ObjectiveConfig::PseudoHuber { delta } => Self::pseudo_huber(delta),
            ObjectiveConfig::Logistic { n_classes } => {
                Ok(Self::Logistic(LogisticLoss::new(n_classes)))
            }
        }
    }
}

impl From<Objective> for ObjectiveConfig {
    fn from(objective: Objective) -> Self {
        match objective {
            Objective::Squared(_) => Self::Squared,
            Objective::PseudoHuber(loss) => Self::PseudoHuber { delta: loss.delta() },
            Objective::Logistic(_) => Self::Logistic { n_classes: 2 },
        }
    }
}
