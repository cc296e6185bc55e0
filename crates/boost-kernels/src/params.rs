//! Kernel execution parameters.
//!
//! [`KernelParams`] controls how the parallel drivers split their work. It
//! has sensible defaults and a `validate()` method; [`KernelParams::install`]
//! validates, sets up the thread pool and hands the resulting
//! [`Parallelism`] to the kernel.

use crate::utils::{run_with_threads, Parallelism};

// =============================================================================
// KernelParams
// =============================================================================

/// Parallel execution parameters.
///
/// # Example
///
/// ```
/// use boost_kernels::{discretize_par, KernelParams};
///
/// let params = KernelParams { n_threads: 2, min_chunk_samples: 4 };
/// let values = vec![0.5; 64];
/// let mut bins = vec![0u8; 64];
/// params
///     .install(|par| discretize_par(&values, &[1.0], &mut bins, par, params.min_chunk_samples))
///     .unwrap()
///     .unwrap();
/// assert!(bins.iter().all(|&b| b == 1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelParams {
    /// Thread count: 0 = auto, 1 = sequential, n = dedicated pool of n threads.
    pub n_threads: usize,
    /// Smallest number of samples handed to one task. Must be >= 1.
    pub min_chunk_samples: usize,
}

impl Default for KernelParams {
    fn default() -> Self {
        Self {
            n_threads: 0,
            min_chunk_samples: 16 * 1024,
        }
    }
}

impl KernelParams {
    /// Sequential execution with default chunking.
    pub fn sequential() -> Self {
        Self {
            n_threads: 1,
            ..Default::default()
        }
    }

    /// Set the thread count.
    pub fn with_threads(mut self, n_threads: usize) -> Self {
        self.n_threads = n_threads;
        self
    }

    /// Set the minimum chunk size.
    pub fn with_min_chunk_samples(mut self, min_chunk_samples: usize) -> Self {
        self.min_chunk_samples = min_chunk_samples;
        self
    }

    /// Validate parameters.
    pub fn validate(&self) -> Result<(), ParamValidationError> {
        if self.min_chunk_samples == 0 {
            return Err(ParamValidationError::InvalidMinChunkSamples(
                self.min_chunk_samples,
            ));
        }
        Ok(())
    }

    /// Validate, then run `f` inside the configured thread pool.
    pub fn install<T: Send>(
        &self,
        f: impl FnOnce(Parallelism) -> T + Send,
    ) -> Result<T, ParamValidationError> {
        self.validate()?;
        run_with_threads(self.n_threads, f)
            .map_err(|e| ParamValidationError::ThreadPool(e.to_string()))
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Parameter validation error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamValidationError {
    /// min_chunk_samples must be >= 1.
    #[error("min_chunk_samples must be >= 1, got {0}")]
    InvalidMinChunkSamples(usize),

    /// The requested thread pool could not be created.
    #[error("failed to create thread pool: {0}")]
    ThreadPool(String),
}
