use thiserror::Error;

/// Why a discretization call was rejected.
///
/// Every check runs before the output is touched, so on error the output
/// buffer holds whatever it held before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscretizeError {
    #[error("sample count is negative: {0}")]
    NegativeSampleCount(i64),

    #[error("sample count {0} does not fit in usize")]
    SampleCountTooLarge(i64),

    #[error("byte size of {count} samples of {element_bytes} bytes overflows usize")]
    SampleBufferOverflow { count: usize, element_bytes: usize },

    #[error("feature values are missing")]
    MissingFeatureValues,

    #[error("bin output is missing")]
    MissingOutput,

    #[error("{buffer} holds {len} elements, {required} required")]
    BufferTooShort {
        buffer: &'static str,
        len: usize,
        required: usize,
    },

    #[error("cut count is negative: {0}")]
    NegativeCutCount(i64),

    #[error("cut points are missing for {0} cuts")]
    MissingCuts(i64),

    #[error("{count_cuts} cuts leave no bin index for missing values in the output type")]
    NoRoomForMissingBin { count_cuts: i64 },

    #[error("cut count {0} does not fit in usize")]
    CutCountTooLarge(i64),

    #[error("byte size of {0} cut points overflows usize")]
    CutBufferOverflow(usize),

    #[error("cut count {0} exceeds the largest signed search index")]
    SearchIndexOverflow(usize),

    #[error("cut count {0} could overflow a search midpoint")]
    SearchMidpointOverflow(usize),

    #[error("{values} feature values but {bins} bin slots")]
    LengthMismatch { values: usize, bins: usize },

    #[error("{regime:?} cannot discretize with {count_cuts} cuts")]
    UnsupportedRegime {
        regime: super::Regime,
        count_cuts: usize,
    },

    #[error("feature matrix is {features:?} but bin matrix is {bins:?}")]
    ShapeMismatch {
        features: (usize, usize),
        bins: (usize, usize),
    },

    #[error("{features} features but {cut_sets} cut sets")]
    CutSetCount { features: usize, cut_sets: usize },

    #[error("{0} matrix is not contiguous in standard layout")]
    NonContiguous(&'static str),
}
