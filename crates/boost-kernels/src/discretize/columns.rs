//! Parallel drivers: chunked samples of one feature, or many features at once.

use ndarray::{ArrayView2, ArrayViewMut2};

use super::{
    check_cut_count, check_sample_count, check_slices, log_failure, run, BinIndex, DiscretizeError,
};
use crate::utils::Parallelism;

/// [`discretize`](super::discretize) split into disjoint chunks of at least
/// `min_chunk_samples` values.
///
/// The output equals the sequential call exactly. Chunks are processed on
/// the current rayon pool when `parallelism` allows it.
pub fn discretize_par<T: BinIndex>(
    values: &[f64],
    cuts: &[f64],
    bins: &mut [T],
    parallelism: Parallelism,
    min_chunk_samples: usize,
) -> Result<(), DiscretizeError> {
    check_slices::<T>(values, cuts, bins).map_err(log_failure)?;
    if values.is_empty() {
        return Ok(());
    }

    let chunk = chunk_len(values.len(), min_chunk_samples, parallelism);
    let jobs: Vec<(&[f64], &mut [T])> = values.chunks(chunk).zip(bins.chunks_mut(chunk)).collect();
    parallelism.maybe_par_for_each(jobs, |(values, bins)| run(values, cuts, bins));
    Ok(())
}

/// Discretize every row of a `[n_features, n_samples]` matrix with that
/// feature's own cuts.
///
/// Both matrices must be in standard (row-major, contiguous) layout. Each
/// feature is one task.
///
/// ```
/// use boost_kernels::{discretize_columns, Parallelism};
/// use ndarray::{array, Array2};
///
/// let features = array![[0.5, 2.0, f64::NAN], [10.0, -10.0, 0.0]];
/// let mut bins = Array2::<u16>::zeros((2, 3));
/// let cuts: [&[f64]; 2] = [&[1.0], &[0.0, 5.0]];
/// discretize_columns(features.view(), &cuts, bins.view_mut(), Parallelism::Sequential).unwrap();
/// assert_eq!(bins, array![[1u16, 2, 0], [3, 1, 2]]);
/// ```
pub fn discretize_columns<T: BinIndex>(
    features: ArrayView2<'_, f64>,
    cuts: &[&[f64]],
    mut bins: ArrayViewMut2<'_, T>,
    parallelism: Parallelism,
) -> Result<(), DiscretizeError> {
    check_columns(&features, cuts, &bins).map_err(log_failure)?;

    let (_, n_samples) = features.dim();
    if n_samples == 0 {
        return Ok(());
    }
    let values = features
        .as_slice()
        .ok_or(DiscretizeError::NonContiguous("feature"))
        .map_err(log_failure)?;
    let out = bins
        .as_slice_mut()
        .ok_or(DiscretizeError::NonContiguous("bin"))
        .map_err(log_failure)?;

    let jobs: Vec<((&[f64], &mut [T]), &[f64])> = values
        .chunks(n_samples)
        .zip(out.chunks_mut(n_samples))
        .zip(cuts.iter().copied())
        .collect();
    parallelism.maybe_par_for_each(jobs, |((values, bins), cuts)| run(values, cuts, bins));
    Ok(())
}

fn check_columns<T: BinIndex>(
    features: &ArrayView2<'_, f64>,
    cuts: &[&[f64]],
    bins: &ArrayViewMut2<'_, T>,
) -> Result<(), DiscretizeError> {
    let shape = features.dim();
    if bins.dim() != shape {
        return Err(DiscretizeError::ShapeMismatch {
            features: shape,
            bins: bins.dim(),
        });
    }
    let (n_features, n_samples) = shape;
    if cuts.len() != n_features {
        return Err(DiscretizeError::CutSetCount {
            features: n_features,
            cut_sets: cuts.len(),
        });
    }
    for feature_cuts in cuts.iter().filter(|c| !c.is_empty()) {
        let count = i64::try_from(feature_cuts.len())
            .map_err(|_| DiscretizeError::CutCountTooLarge(i64::MAX))?;
        check_cut_count::<T>(count)?;
    }
    let count_samples =
        i64::try_from(n_samples).map_err(|_| DiscretizeError::SampleCountTooLarge(i64::MAX))?;
    check_sample_count::<T>(count_samples)?;
    Ok(())
}

/// Chunk length: at least `min_chunk_samples`, and no more chunks than a
/// few per thread.
fn chunk_len(n: usize, min_chunk_samples: usize, parallelism: Parallelism) -> usize {
    let min = min_chunk_samples.max(1);
    if !parallelism.is_parallel() {
        return n.max(min);
    }
    let target = n.div_ceil(rayon::current_num_threads() * 4);
    target.max(min)
}
