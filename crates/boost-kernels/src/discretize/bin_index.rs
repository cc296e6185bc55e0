/// Integer type that bin indices are written as.
///
/// Implemented for every primitive integer. A type can hold indices for at
/// most `MAX - 1` cuts: `count_cuts + 1` must stay representable.
pub trait BinIndex: Copy + Send + Sync + 'static {
    /// Largest representable value.
    const MAX: u128;

    /// Convert an index already checked against [`BinIndex::MAX`].
    fn from_bin(bin: usize) -> Self;

    /// Widen back to `usize`, mainly for tests and comparisons.
    fn to_bin(self) -> usize;
}

macro_rules! impl_bin_index {
    ($($t:ty),* $(,)?) => {
        $(
            impl BinIndex for $t {
                const MAX: u128 = <$t>::MAX as u128;

                #[inline(always)]
                fn from_bin(bin: usize) -> Self {
                    bin as $t
                }

                #[inline(always)]
                fn to_bin(self) -> usize {
                    self as usize
                }
            }
        )*
    };
}

impl_bin_index!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);
