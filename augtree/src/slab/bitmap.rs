//! Word-based bitmap used for both per-page liveness and the page table's
//! full-page bitmap (spec §4.1).

use smallvec::SmallVec;

const WORD_BITS: usize = 64;

/// A fixed-length bitmap over `total_bits` positions, backed by inline
/// storage for the common small-page case and spilling to the heap for
/// larger tiers.
#[derive(Debug, Clone)]
pub(crate) struct Bitmap {
    words: SmallVec<[u64; 1]>,
    total_bits: usize,
}

impl Bitmap {
    pub fn new(total_bits: usize) -> Self {
        let word_count = total_bits.div_ceil(WORD_BITS).max(1);
        Bitmap {
            words: SmallVec::from_elem(0u64, word_count),
            total_bits,
        }
    }

    pub fn get(&self, index: usize) -> bool {
        let (word, bit) = (index / WORD_BITS, index % WORD_BITS);
        self.words[word] & (1u64 << bit) != 0
    }

    pub fn set(&mut self, index: usize) {
        let (word, bit) = (index / WORD_BITS, index % WORD_BITS);
        self.words[word] |= 1u64 << bit;
    }

    pub fn clear(&mut self, index: usize) {
        let (word, bit) = (index / WORD_BITS, index % WORD_BITS);
        self.words[word] &= !(1u64 << bit);
    }

    /// Mask of valid bits in a given word (the last word may be partial).
    fn valid_mask(&self, word_index: usize) -> u64 {
        let word_start = word_index * WORD_BITS;
        let bits_in_word = self.total_bits.saturating_sub(word_start).min(WORD_BITS);
        if bits_in_word >= WORD_BITS {
            u64::MAX
        } else {
            (1u64 << bits_in_word) - 1
        }
    }

    /// Finds the first clear bit at or after `hint_word`, wrapping once to
    /// word zero. Mirrors `trailing_zero_count(~word)` from spec §4.1.
    pub fn find_first_zero(&self, hint_word: usize) -> Option<usize> {
        let n = self.words.len();
        if n == 0 {
            return None;
        }
        let hint_word = hint_word % n;
        for offset in 0..n {
            let w = (hint_word + offset) % n;
            let valid = self.valid_mask(w);
            let padded = self.words[w] | !valid;
            if padded != u64::MAX {
                let bit = (!padded).trailing_zeros() as usize;
                return Some(w * WORD_BITS + bit);
            }
        }
        None
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_first_zero_in_fresh_bitmap() {
        let bm = Bitmap::new(32);
        assert_eq!(bm.find_first_zero(0), Some(0));
    }

    #[test]
    fn skips_set_bits() {
        let mut bm = Bitmap::new(32);
        bm.set(0);
        bm.set(1);
        assert_eq!(bm.find_first_zero(0), Some(2));
    }

    #[test]
    fn respects_partial_last_word() {
        let bm = Bitmap::new(10);
        for i in 0..10 {
            assert!(!bm.get(i));
        }
        // bits 10..64 of the single word are padding and must read as occupied.
        let mut bm = bm;
        for i in 0..10 {
            bm.set(i);
        }
        assert_eq!(bm.find_first_zero(0), None);
    }

    #[test]
    fn wraps_once_from_hint() {
        let mut bm = Bitmap::new(128);
        for i in 0..64 {
            bm.set(i);
        }
        assert_eq!(bm.find_first_zero(0), Some(64));
        for i in 64..128 {
            bm.set(i);
        }
        assert_eq!(bm.find_first_zero(1), None);
    }
}
