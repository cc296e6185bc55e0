//! Monomorphized inner loops.
//!
//! Runtime options (hessian output, metric, weights) are turned into const
//! generic flags once per call so the per-sample loop carries no branches
//! for them.

use super::objectives::UpdateObjective;
use crate::math::{DefaultLanes, Lanes};

/// Widest lane type any kernel is instantiated with.
const MAX_LANES: usize = 8;

// =============================================================================
// Squared error fast path
// =============================================================================

/// Add each update to the stored gradient and optionally sum `gradient²`.
///
/// `scores`, when non-empty, receives the same update. `weights`, when
/// non-empty, scales each metric term.
pub(super) fn squared<I: Iterator<Item = f32>>(
    updates: I,
    gradients: &mut [f32],
    scores: &mut [f32],
    weights: &[f32],
    metric: bool,
) -> f64 {
    match (metric, !weights.is_empty()) {
        (false, _) => squared_kernel::<I, false, false>(updates, gradients, scores, weights),
        (true, false) => squared_kernel::<I, true, false>(updates, gradients, scores, weights),
        (true, true) => squared_kernel::<I, true, true>(updates, gradients, scores, weights),
    }
}

fn squared_kernel<I: Iterator<Item = f32>, const METRIC: bool, const WEIGHT: bool>(
    updates: I,
    gradients: &mut [f32],
    scores: &mut [f32],
    weights: &[f32],
) -> f64 {
    let mut sum = 0.0f64;
    for (i, (gradient, update)) in gradients.iter_mut().zip(updates).enumerate() {
        // stored gradients are raw residuals: moving the score moves them 1:1
        let g = *gradient + update;
        *gradient = g;
        if let Some(score) = scores.get_mut(i) {
            *score += update;
        }
        if METRIC {
            let mut err = g * g;
            if WEIGHT {
                err *= weights[i];
            }
            sum += f64::from(err);
        }
    }
    sum
}

// =============================================================================
// General objectives
// =============================================================================

/// Per-sample buffers of a general update. `hessians` and `weights` are
/// empty when not requested.
pub(super) struct Buffers<'a> {
    pub scores: &'a mut [f32],
    pub targets: &'a [f32],
    pub gradients: &'a mut [f32],
    pub hessians: &'a mut [f32],
    pub weights: &'a [f32],
}

/// Move each score by its update, then recompute gradient (and hessian)
/// from `(score, target)`. Returns the (weighted) metric sum when `metric`.
pub(super) fn general<O, I>(objective: &O, updates: I, buffers: Buffers<'_>, metric: bool) -> f64
where
    O: UpdateObjective,
    I: Iterator<Item = f32>,
{
    let hessian = !buffers.hessians.is_empty();
    let weighted = metric && !buffers.weights.is_empty();
    match (hessian, metric, weighted) {
        (false, false, _) => {
            general_kernel::<O, DefaultLanes, I, false, false, false>(objective, updates, buffers)
        }
        (false, true, false) => {
            general_kernel::<O, DefaultLanes, I, false, true, false>(objective, updates, buffers)
        }
        (false, true, true) => {
            general_kernel::<O, DefaultLanes, I, false, true, true>(objective, updates, buffers)
        }
        (true, false, _) => {
            general_kernel::<O, DefaultLanes, I, true, false, false>(objective, updates, buffers)
        }
        (true, true, false) => {
            general_kernel::<O, DefaultLanes, I, true, true, false>(objective, updates, buffers)
        }
        (true, true, true) => {
            general_kernel::<O, DefaultLanes, I, true, true, true>(objective, updates, buffers)
        }
    }
}

fn general_kernel<O, F, I, const HESSIAN: bool, const METRIC: bool, const WEIGHT: bool>(
    objective: &O,
    mut updates: I,
    mut buffers: Buffers<'_>,
) -> f64
where
    O: UpdateObjective,
    F: Lanes,
    I: Iterator<Item = f32>,
{
    let n = buffers.gradients.len();
    let body = n - n % F::WIDTH;
    let mut lane_buf = [0.0f32; MAX_LANES];
    let lane_updates = &mut lane_buf[..F::WIDTH];

    let mut sum = 0.0f64;
    for at in (0..body).step_by(F::WIDTH) {
        for (slot, update) in lane_updates.iter_mut().zip(&mut updates) {
            *slot = update;
        }
        let update = F::load(lane_updates);
        sum += step::<O, F, HESSIAN, METRIC, WEIGHT>(objective, update, at, &mut buffers);
    }
    for (at, update) in (body..n).zip(updates) {
        sum += step::<O, f32, HESSIAN, METRIC, WEIGHT>(objective, update, at, &mut buffers);
    }
    sum
}

#[inline(always)]
fn step<O, F, const HESSIAN: bool, const METRIC: bool, const WEIGHT: bool>(
    objective: &O,
    update: F,
    at: usize,
    buffers: &mut Buffers<'_>,
) -> f64
where
    O: UpdateObjective,
    F: Lanes,
{
    let lanes = at..at + F::WIDTH;

    let score = F::load(&buffers.scores[lanes.clone()]) + update;
    score.store(&mut buffers.scores[lanes.clone()]);
    let target = F::load(&buffers.targets[lanes.clone()]);

    if HESSIAN {
        let (gradient, hessian) = objective.gradient_hessian(score, target);
        gradient.store(&mut buffers.gradients[lanes.clone()]);
        hessian.store(&mut buffers.hessians[lanes.clone()]);
    } else {
        objective
            .gradient(score, target)
            .store(&mut buffers.gradients[lanes.clone()]);
    }

    if METRIC {
        let mut metric = objective.metric(score, target);
        if WEIGHT {
            metric = metric * F::load(&buffers.weights[lanes]);
        }
        f64::from(metric.sum_lanes())
    } else {
        0.0
    }
}
