mod ops;

use std::mem;

/// The size of a block in 64bit words
#[cfg(not(feature = "wide-blocks"))]
pub const BLOCK_SIZE_IN_WORDS: usize = 2;

/// The size of a block in 64bit words
#[cfg(feature = "wide-blocks")]
pub const BLOCK_SIZE_IN_WORDS: usize = 16;

/// The number of bits represented by a block
pub const BLOCK_CAPACITY: usize = BLOCK_SIZE_IN_WORDS * 64;

/// A fixed size chunk of bits with a cached cardinality
///
/// Blocks are shared between bitsets through `Rc<Block>`. A block held by more than one
/// slot must not be written to; the bitset layer copies it before any write.
///
/// # Structure
/// Bits are stored little endian within `BLOCK_SIZE_IN_WORDS` 64bit words.
/// `domain` arguments give the number of logical bits in the block. Bits at or past the
/// domain are padding and are always kept at 0.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    words: [u64; BLOCK_SIZE_IN_WORDS],
    cardinality: usize,
}

impl Block {
    /// Create a block with every bit cleared
    pub fn zeroed() -> Self {
        Self {
            words: [0; BLOCK_SIZE_IN_WORDS],
            cardinality: 0,
        }
    }

    /// Create a block with the first `domain` bits set
    pub fn full(domain: usize) -> Self {
        assert!(domain <= BLOCK_CAPACITY);

        let mut block = Self::zeroed();
        ops::fill(&mut block.words, domain);
        block.cardinality = domain;

        block
    }

    /// Get the value of the bit at `index`
    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        debug_assert!(index < BLOCK_CAPACITY);

        let word = self.words[index >> 6];
        (word >> (index & 0x3F)) & 1 > 0
    }

    /// Set the bit at `index` and return true if it was previously unset
    pub fn insert(&mut self, index: usize) -> bool {
        debug_assert!(index < BLOCK_CAPACITY);

        let word_index = index >> 6;
        let bit_index = index & 0x3F;
        let word = self.words[word_index];
        let new_word = word | (1 << bit_index);

        self.words[word_index] = new_word;

        let increment = ((word ^ new_word) >> bit_index) as usize;
        self.cardinality += increment;

        increment > 0
    }

    /// Unset the bit at `index` and return true if it was previously set
    pub fn remove(&mut self, index: usize) -> bool {
        debug_assert!(index < BLOCK_CAPACITY);

        let word_index = index >> 6;
        let bit_index = index & 0x3F;
        let word = self.words[word_index];
        let new_word = word & !(1 << bit_index);

        self.words[word_index] = new_word;

        let decrement = ((word ^ new_word) >> bit_index) as usize;
        self.cardinality -= decrement;

        decrement > 0
    }

    /// Flip the bit at `index` and return its new value
    pub fn toggle(&mut self, index: usize) -> bool {
        debug_assert!(index < BLOCK_CAPACITY);

        let word_index = index >> 6;
        let mask = 1 << (index & 0x3F);
        let new_word = self.words[word_index] ^ mask;

        self.words[word_index] = new_word;

        if new_word & mask == 0 {
            self.cardinality -= 1;

            false
        }
        else {
            self.cardinality += 1;

            true
        }
    }

    /// Union `other` into this block and return the new cardinality
    pub fn union_with(&mut self, other: &Block) -> usize {
        self.cardinality = ops::or(&mut self.words, &other.words);
        self.cardinality
    }

    /// Intersect this block with `other` and return the new cardinality
    pub fn intersect_with(&mut self, other: &Block) -> usize {
        self.cardinality = ops::and(&mut self.words, &other.words);
        self.cardinality
    }

    /// Remove the bits of `other` from this block and return the new cardinality
    pub fn difference_with(&mut self, other: &Block) -> usize {
        self.cardinality = ops::and_not(&mut self.words, &other.words);
        self.cardinality
    }

    /// Flip the first `domain` bits of the block, leaving the padding cleared
    pub fn invert(&mut self, domain: usize) {
        assert!(domain <= BLOCK_CAPACITY);
        debug_assert!(self.cardinality <= domain);

        ops::invert(&mut self.words);
        ops::clear_from(&mut self.words, domain);

        self.cardinality = domain - self.cardinality;
    }

    /// Check if every bit in the first `domain` bits is set
    #[inline]
    pub fn is_full(&self, domain: usize) -> bool {
        self.cardinality == domain
    }

    /// The number of set bits in the block
    #[inline]
    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    /// Get the words of the block
    #[inline]
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// The number of bytes allocated for a block
    #[inline]
    pub const fn allocation_size() -> usize {
        mem::size_of::<Block>()
    }

    /// Check the cached cardinality and the padding against the words
    #[cfg(test)]
    pub fn assert_valid(&self, domain: usize) {
        assert_eq!(self.cardinality, ops::cardinality(&self.words), "stale cardinality");

        let mut trimmed = self.words;
        ops::clear_from(&mut trimmed, domain);

        assert_eq!(trimmed, self.words, "padding bits are set");
    }
}
