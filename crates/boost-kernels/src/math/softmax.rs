//! Class probabilities from logits.

use thiserror::Error;

use crate::logging::abort_unsupported;

/// Errors from [`softmax`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SoftmaxError {
    #[error("logits and probabilities differ in length: {logits} vs {probabilities}")]
    LengthMismatch { logits: usize, probabilities: usize },
}

/// Probability of the positive class for each binary logit.
///
/// Each output is `e^l / (1 + e^l)`, computed with the exact `exp`. Only
/// binary classification is implemented: any `n_classes` other than 2 logs
/// the request and aborts the process.
///
/// ```
/// use boost_kernels::softmax;
///
/// let mut p = [0.0; 2];
/// softmax(2, &[0.0, f64::INFINITY], &mut p).unwrap();
/// assert_eq!(p[0], 0.5);
/// ```
pub fn softmax(
    n_classes: usize,
    logits: &[f64],
    probabilities: &mut [f64],
) -> Result<(), SoftmaxError> {
    if n_classes != 2 {
        abort_unsupported(format_args!(
            "softmax supports 2 classes only, got {n_classes}"
        ));
    }
    if logits.len() != probabilities.len() {
        log::error!(
            "softmax length mismatch: {} logits, {} outputs",
            logits.len(),
            probabilities.len()
        );
        return Err(SoftmaxError::LengthMismatch {
            logits: logits.len(),
            probabilities: probabilities.len(),
        });
    }

    for (&logit, p) in logits.iter().zip(probabilities.iter_mut()) {
        let odds = logit.exp();
        // e^l overflows to inf for large logits; the limit is 1
        *p = if odds.is_infinite() {
            1.0
        } else {
            odds / (1.0 + odds)
        };
    }
    Ok(())
}
