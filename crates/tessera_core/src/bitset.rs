//! # Bitset
//!
//! Growable bit-indexed membership set.
//!
//! Used as the registry's liveness ledger and as the occupancy ledger of the
//! bitset-backed storages. Bits are packed 64 per `u64` word, so tracking
//! 1M slots costs ~122KB.
//!
//! ## Performance
//!
//! - Test / set: O(1) (set may grow the backing words)
//! - Intersection / union / difference: O(n/64)
//! - Iterate set bits: O(n/64 + set bits), lazily, in ascending order

use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Sub, SubAssign};

/// Bits per backing word.
const WORD_BITS: usize = 64;

/// Number of words needed to hold `bits` bits.
#[inline]
const fn words_for(bits: usize) -> usize {
    bits.div_ceil(WORD_BITS)
}

/// Dense, resizable set of bit positions.
///
/// Bits at or beyond [`len`](Self::len) read as `0`. Binary operations
/// produce a set of `max(lhs.len(), rhs.len())` bits, treating the missing
/// range of the shorter operand as zeros.
///
/// # Example
///
/// ```rust
/// use tessera_core::BitSet;
///
/// let mut bits = BitSet::new();
/// bits.set(3, true);
/// bits.set(70, true);
/// assert!(bits.test(70));
/// assert!(!bits.test(1_000));
/// assert_eq!(bits.iter_ones().collect::<Vec<_>>(), vec![3, 70]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct BitSet {
    /// Packed bits. Always exactly `words_for(len)` words; bits past `len`
    /// in the last word are kept at zero.
    words: Vec<u64>,
    /// Number of representable bits.
    len: usize,
}

impl BitSet {
    /// Creates an empty bitset with no representable bits.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            words: Vec::new(),
            len: 0,
        }
    }

    /// Creates an empty bitset with room for `bits` bits before reallocating.
    #[must_use]
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            words: Vec::with_capacity(words_for(bits)),
            len: 0,
        }
    }

    /// Creates a bitset of `len` bits, all cleared.
    #[must_use]
    pub fn with_len(len: usize) -> Self {
        Self {
            words: vec![0; words_for(len)],
            len,
        }
    }

    /// Returns the number of representable bits.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no bit is set.
    ///
    /// A cleared bitset is empty even though it keeps its length.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.any()
    }

    /// Returns `true` if at least one bit is set.
    #[must_use]
    pub fn any(&self) -> bool {
        self.words.iter().any(|word| *word != 0)
    }

    /// Returns the number of set bits.
    #[must_use]
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Tests bit `index`.
    ///
    /// Out-of-range indices read as `false`.
    #[inline]
    #[must_use]
    pub fn test(&self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        (self.words[index / WORD_BITS] >> (index % WORD_BITS)) & 1 == 1
    }

    /// Sets bit `index` to `value`, growing the bitset if needed.
    #[inline]
    pub fn set(&mut self, index: usize, value: bool) {
        if index >= self.len {
            self.resize(index + 1);
        }
        let mask = 1u64 << (index % WORD_BITS);
        let word = &mut self.words[index / WORD_BITS];
        if value {
            *word |= mask;
        } else {
            *word &= !mask;
        }
    }

    /// Resizes to `len` bits. New bits are cleared; truncated bits are lost.
    pub fn resize(&mut self, len: usize) {
        self.words.resize(words_for(len), 0);
        self.len = len;
        self.clear_tail();
    }

    /// Clears every bit, keeping the current length.
    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    /// Returns the lowest cleared bit below [`len`](Self::len), if any.
    #[must_use]
    pub fn first_zero(&self) -> Option<usize> {
        self.words
            .iter()
            .enumerate()
            .find(|(_, word)| **word != u64::MAX)
            .map(|(index, word)| index * WORD_BITS + word.trailing_ones() as usize)
            .filter(|bit| *bit < self.len)
    }

    /// Returns the lowest bit below [`len`](Self::len) that is cleared both
    /// here and in `other`.
    ///
    /// Bits of `other` beyond its length read as `0`. Nothing is allocated.
    #[must_use]
    pub fn first_zero_excluding(&self, other: &Self) -> Option<usize> {
        self.words
            .iter()
            .enumerate()
            .map(|(index, word)| (index, word | other.words.get(index).copied().unwrap_or(0)))
            .find(|(_, word)| *word != u64::MAX)
            .map(|(index, word)| index * WORD_BITS + word.trailing_ones() as usize)
            .filter(|bit| *bit < self.len)
    }

    /// Iterates set bit positions in ascending order.
    #[inline]
    #[must_use]
    pub fn iter_ones(&self) -> Ones<'_> {
        Ones {
            words: &self.words,
            cursor: Cursor::default(),
        }
    }

    /// Returns the bits set in `self` but not in `other`.
    #[must_use]
    pub fn and_not(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result -= other;
        result
    }

    /// Intersects in place. The result keeps `max(self.len(), other.len())` bits.
    pub fn intersect_with(&mut self, other: &Self) {
        self.grow_to(other.len);
        for (index, word) in self.words.iter_mut().enumerate() {
            *word &= other.words.get(index).copied().unwrap_or(0);
        }
    }

    /// Unions in place. The result keeps `max(self.len(), other.len())` bits.
    pub fn union_with(&mut self, other: &Self) {
        self.grow_to(other.len);
        for (word, other) in self.words.iter_mut().zip(&other.words) {
            *word |= *other;
        }
    }

    /// Clears every bit that is set in `other`.
    pub fn difference_with(&mut self, other: &Self) {
        self.grow_to(other.len);
        for (word, other) in self.words.iter_mut().zip(&other.words) {
            *word &= !*other;
        }
    }

    fn grow_to(&mut self, len: usize) {
        if len > self.len {
            self.resize(len);
        }
    }

    fn clear_tail(&mut self) {
        let used = self.len % WORD_BITS;
        if used != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << used) - 1;
            }
        }
    }
}

impl BitAnd for &BitSet {
    type Output = BitSet;

    fn bitand(self, rhs: Self) -> BitSet {
        let mut result = self.clone();
        result.intersect_with(rhs);
        result
    }
}

impl BitOr for &BitSet {
    type Output = BitSet;

    fn bitor(self, rhs: Self) -> BitSet {
        let mut result = self.clone();
        result.union_with(rhs);
        result
    }
}

impl Sub for &BitSet {
    type Output = BitSet;

    fn sub(self, rhs: Self) -> BitSet {
        self.and_not(rhs)
    }
}

impl BitAndAssign<&BitSet> for BitSet {
    fn bitand_assign(&mut self, rhs: &BitSet) {
        self.intersect_with(rhs);
    }
}

impl BitOrAssign<&BitSet> for BitSet {
    fn bitor_assign(&mut self, rhs: &BitSet) {
        self.union_with(rhs);
    }
}

impl SubAssign<&BitSet> for BitSet {
    fn sub_assign(&mut self, rhs: &BitSet) {
        self.difference_with(rhs);
    }
}

impl FromIterator<usize> for BitSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut bits = Self::new();
        bits.extend(iter);
        bits
    }
}

impl Extend<usize> for BitSet {
    fn extend<I: IntoIterator<Item = usize>>(&mut self, iter: I) {
        for index in iter {
            self.set(index, true);
        }
    }
}

impl<'a> IntoIterator for &'a BitSet {
    type Item = usize;
    type IntoIter = Ones<'a>;

    fn into_iter(self) -> Ones<'a> {
        self.iter_ones()
    }
}

impl IntoIterator for BitSet {
    type Item = usize;
    type IntoIter = IntoOnes;

    fn into_iter(self) -> IntoOnes {
        IntoOnes {
            words: self.words,
            cursor: Cursor::default(),
        }
    }
}

/// Scan position shared by the borrowing and owning iterators.
#[derive(Clone, Debug, Default)]
struct Cursor {
    /// Next word to load.
    next_word: usize,
    /// Bit offset of `current`.
    base: usize,
    /// Remaining set bits of the word being drained.
    current: u64,
}

impl Cursor {
    #[inline]
    fn advance(&mut self, words: &[u64]) -> Option<usize> {
        loop {
            if self.current != 0 {
                let bit = self.current.trailing_zeros() as usize;
                self.current &= self.current - 1;
                return Some(self.base + bit);
            }
            let word = *words.get(self.next_word)?;
            self.base = self.next_word * WORD_BITS;
            self.next_word += 1;
            self.current = word;
        }
    }
}

/// Ascending iterator over the set bits of a borrowed [`BitSet`].
#[derive(Clone, Debug)]
pub struct Ones<'a> {
    words: &'a [u64],
    cursor: Cursor,
}

impl Iterator for Ones<'_> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        self.cursor.advance(self.words)
    }
}

/// Ascending iterator over the set bits of an owned [`BitSet`].
#[derive(Clone, Debug)]
pub struct IntoOnes {
    words: Vec<u64>,
    cursor: Cursor,
}

impl Iterator for IntoOnes {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        self.cursor.advance(&self.words)
    }
}
