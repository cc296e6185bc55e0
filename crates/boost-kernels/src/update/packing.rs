//! Bit-packed per-sample bin indices.
//!
//! Bin indices of `n` samples are packed `items_per_pack` to a `u64` word,
//! each in a field of `64 / items_per_pack` bits. Within a word the first
//! sample sits in the highest used field. Only the first word may be partial:
//! it holds `(n - 1) % items_per_pack + 1` samples, every later word is full.
//!
//! ```
//! use boost_kernels::update::{pack_bins, PackedBins};
//!
//! let bins = [3, 0, 2, 1, 1];
//! let words = pack_bins(&bins, 4).unwrap();
//! assert_eq!(words.len(), 2);
//! let unpacked: Vec<usize> = PackedBins::new(&words, 4, bins.len()).collect();
//! assert_eq!(unpacked, bins);
//! ```

use super::UpdateError;

/// Bits in one storage word.
pub const BITS_PER_WORD: usize = u64::BITS as usize;

/// Field width for `items_per_pack` items per word.
#[inline]
pub fn bits_per_item(items_per_pack: usize) -> usize {
    BITS_PER_WORD / items_per_pack
}

/// Mask selecting the low `bits` bits, for `bits` in `1..=64`.
#[inline]
pub fn low_mask(bits: usize) -> u64 {
    u64::MAX >> (BITS_PER_WORD - bits)
}

/// Most items per word whose fields can hold indices `0..n_bins`.
pub fn items_per_pack_for_bins(n_bins: usize) -> usize {
    let bits_needed = match n_bins {
        0 | 1 => 1,
        n => (usize::BITS - (n - 1).leading_zeros()) as usize,
    };
    BITS_PER_WORD / bits_needed.min(BITS_PER_WORD)
}

/// Words needed for `n_samples` samples.
#[inline]
pub fn packed_len(n_samples: usize, items_per_pack: usize) -> usize {
    n_samples.div_ceil(items_per_pack)
}

pub(crate) fn check_items_per_pack(items_per_pack: usize) -> Result<(), UpdateError> {
    if (1..=BITS_PER_WORD).contains(&items_per_pack) {
        Ok(())
    } else {
        Err(UpdateError::InvalidItemsPerPack(items_per_pack))
    }
}

/// Pack bin indices in the layout [`PackedBins`] reads.
pub fn pack_bins(bins: &[usize], items_per_pack: usize) -> Result<Vec<u64>, UpdateError> {
    check_items_per_pack(items_per_pack)?;
    let bits = bits_per_item(items_per_pack);
    let mask = low_mask(bits);
    if let Some(&bin) = bins.iter().find(|&&b| b as u64 > mask) {
        return Err(UpdateError::BinTooWide { bin, bits });
    }
    if bins.is_empty() {
        return Ok(Vec::new());
    }

    let pack_word = |items: &[usize]| {
        items.iter().fold(0u64, |word, &bin| {
            word.checked_shl(bits as u32).unwrap_or(0) | bin as u64
        })
    };

    let first = (bins.len() - 1) % items_per_pack + 1;
    let (head, rest) = bins.split_at(first);
    let mut words = Vec::with_capacity(packed_len(bins.len(), items_per_pack));
    words.push(pack_word(head));
    words.extend(rest.chunks(items_per_pack).map(pack_word));
    Ok(words)
}

/// Iterator over the bin index of each sample in packed storage.
#[derive(Debug, Clone)]
pub struct PackedBins<'a> {
    words: std::slice::Iter<'a, u64>,
    word: u64,
    shift: usize,
    next_start: usize,
    full_start: usize,
    bits: usize,
    mask: u64,
    word_done: bool,
    remaining: usize,
}

impl<'a> PackedBins<'a> {
    /// Read `n_samples` indices from `words`.
    ///
    /// `items_per_pack` must be in `1..=64`; iteration stops early if `words`
    /// runs out.
    pub fn new(words: &'a [u64], items_per_pack: usize, n_samples: usize) -> Self {
        let bits = bits_per_item(items_per_pack);
        let full_start = (items_per_pack - 1) * bits;
        let first_start = n_samples.saturating_sub(1) % items_per_pack * bits;
        Self {
            words: words.iter(),
            word: 0,
            shift: 0,
            next_start: first_start,
            full_start,
            bits,
            mask: low_mask(bits),
            word_done: true,
            remaining: n_samples,
        }
    }
}

impl Iterator for PackedBins<'_> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        if self.word_done {
            self.word = *self.words.next()?;
            self.shift = self.next_start;
            self.next_start = self.full_start;
            self.word_done = false;
        }
        let bin = ((self.word >> self.shift) & self.mask) as usize;
        if self.shift == 0 {
            self.word_done = true;
        } else {
            self.shift -= self.bits;
        }
        self.remaining -= 1;
        Some(bin)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let available = self.words.len() * (self.full_start / self.bits + 1)
            + if self.word_done { 0 } else { self.shift / self.bits + 1 };
        let n = self.remaining.min(available);
        (n, Some(n))
    }
}

impl ExactSizeIterator for PackedBins<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn masks_and_widths() {
        assert_eq!(bits_per_item(1), 64);
        assert_eq!(bits_per_item(3), 21);
        assert_eq!(bits_per_item(64), 1);
        assert_eq!(low_mask(1), 1);
        assert_eq!(low_mask(21), (1 << 21) - 1);
        assert_eq!(low_mask(64), u64::MAX);
    }

    #[rstest]
    #[case(1, 64)]
    #[case(2, 64)]
    #[case(3, 32)]
    #[case(4, 32)]
    #[case(5, 21)]
    #[case(256, 8)]
    #[case(257, 7)]
    #[case(1 << 20, 3)]
    fn items_for_bins(#[case] n_bins: usize, #[case] expected: usize) {
        assert_eq!(items_per_pack_for_bins(n_bins), expected);
    }

    #[test]
    fn layout_of_partial_first_word() {
        // 5 samples, 4 per word, 16-bit fields: first word holds 1 sample
        let words = pack_bins(&[7, 1, 2, 3, 4], 4).unwrap();
        assert_eq!(words, vec![7, 0x0001_0002_0003_0004]);
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    #[case(5)]
    #[case(8)]
    #[case(21)]
    #[case(64)]
    fn unpack_matches_packed(#[case] items: usize) {
        let mask = low_mask(bits_per_item(items)) as usize;
        for n in [1usize, items - 1, items, items + 1, 3 * items + 2] {
            if n == 0 {
                continue;
            }
            let bins: Vec<usize> = (0..n).map(|i| (i * 2_654_435_761) & mask).collect();
            let words = pack_bins(&bins, items).unwrap();
            assert_eq!(words.len(), packed_len(n, items));
            let iter = PackedBins::new(&words, items, n);
            assert_eq!(iter.len(), n);
            assert_eq!(iter.collect::<Vec<_>>(), bins, "{items} items, {n} samples");
        }
    }

    #[test]
    fn rejects_wide_bins() {
        assert!(matches!(
            pack_bins(&[0, 4], 32),
            Err(UpdateError::BinTooWide { bin: 4, bits: 2 })
        ));
        assert!(matches!(
            pack_bins(&[0], 0),
            Err(UpdateError::InvalidItemsPerPack(0))
        ));
        assert!(matches!(
            pack_bins(&[0], 65),
            Err(UpdateError::InvalidItemsPerPack(65))
        ));
    }
}

