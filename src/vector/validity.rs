const WORD_BITS: usize = u64::BITS as usize;

/// A validity bitmap, one bit per row, set when the row is not NULL.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Validity {
    words: Vec<u64>,
    len: usize,
}

impl Validity {
    /// A bitmap of `len` valid rows.
    pub fn all_valid(len: usize) -> Validity {
        Validity { words: vec![u64::MAX; len.div_ceil(WORD_BITS)], len }
    }

    /// Copies the first `len` rows of an engine validity mask. A null mask
    /// means every row is valid.
    ///
    /// # Safety
    ///
    /// A non-null `words` must point to at least `len.div_ceil(64)` words.
    pub unsafe fn from_raw(words: *const u64, len: usize) -> Validity {
        if words.is_null() {
            return Validity::all_valid(len);
        }
        let words = std::slice::from_raw_parts(words, len.div_ceil(WORD_BITS)).to_vec();
        Validity { words, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_valid(&self, row: usize) -> bool {
        row < self.len && (self.words[row / WORD_BITS] >> (row % WORD_BITS)) & 1 == 1
    }

    pub fn set(&mut self, row: usize, valid: bool) {
        let mask = 1u64 << (row % WORD_BITS);
        let word = &mut self.words[row / WORD_BITS];
        if valid {
            *word |= mask;
        } else {
            *word &= !mask;
        }
    }

    /// Word-wise AND with another bitmap of the same length; a row stays
    /// valid only if it is valid in both.
    pub fn and_assign(&mut self, other: &Validity) {
        debug_assert_eq!(self.len, other.len);
        for (word, other) in self.words.iter_mut().zip(other.words.iter()) {
            *word &= *other;
        }
    }

    pub fn count_valid(&self) -> usize {
        (0..self.len).filter(|row| self.is_valid(*row)).count()
    }
}
