//! Bit-packed palette indices for one 16×16×16 volume.
//!
//! Indices are stored least-significant-bit first in `u32` words. A cell never
//! spans two words: widths that do not divide 32 (3, 5 and 6 bits) leave the
//! top bits of every word unused and need one extra trailing word so that all
//! 4096 cells fit.

/// Number of cells in a paletted storage (16³).
pub const STORAGE_CELLS: usize = 4096;

/// The widths a paletted storage may use for its indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BitsPerIndex {
    /// Uniform storage: one palette entry, no backing words.
    Zero,
    One,
    Two,
    Three,
    Four,
    Five,
    Six,
    Eight,
    Sixteen,
}

impl BitsPerIndex {
    /// Every width, in ascending order.
    pub const ALL: [BitsPerIndex; 9] = [
        BitsPerIndex::Zero,
        BitsPerIndex::One,
        BitsPerIndex::Two,
        BitsPerIndex::Three,
        BitsPerIndex::Four,
        BitsPerIndex::Five,
        BitsPerIndex::Six,
        BitsPerIndex::Eight,
        BitsPerIndex::Sixteen,
    ];

    /// Returns the width in bits.
    pub fn bits(self) -> u8 {
        match self {
            BitsPerIndex::Zero => 0,
            BitsPerIndex::One => 1,
            BitsPerIndex::Two => 2,
            BitsPerIndex::Three => 3,
            BitsPerIndex::Four => 4,
            BitsPerIndex::Five => 5,
            BitsPerIndex::Six => 6,
            BitsPerIndex::Eight => 8,
            BitsPerIndex::Sixteen => 16,
        }
    }

    /// Parses a width in bits, returning `None` for widths outside the set.
    pub fn from_bits(bits: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.bits() == bits)
    }

    /// Returns the smallest width able to address `len` palette entries.
    pub fn for_palette_len(len: usize) -> Self {
        match len {
            0..=1 => BitsPerIndex::Zero,
            2 => BitsPerIndex::One,
            3..=4 => BitsPerIndex::Two,
            5..=8 => BitsPerIndex::Three,
            9..=16 => BitsPerIndex::Four,
            17..=32 => BitsPerIndex::Five,
            33..=64 => BitsPerIndex::Six,
            65..=256 => BitsPerIndex::Eight,
            _ => BitsPerIndex::Sixteen,
        }
    }

    /// Largest palette this width can address.
    pub fn max_palette_len(self) -> usize {
        1usize << self.bits()
    }

    /// Number of indices that fit into one `u32` word (0 for [`BitsPerIndex::Zero`]).
    pub fn indices_per_word(self) -> usize {
        match self.bits() {
            0 => 0,
            bits => 32 / bits as usize,
        }
    }

    /// Returns `true` for widths that leave unused bits at the top of each word.
    pub fn is_padded(self) -> bool {
        matches!(
            self,
            BitsPerIndex::Three | BitsPerIndex::Five | BitsPerIndex::Six
        )
    }

    /// Number of `u32` words needed to hold all 4096 indices.
    pub fn word_count(self) -> usize {
        match self.indices_per_word() {
            0 => 0,
            per_word => STORAGE_CELLS / per_word + usize::from(self.is_padded()),
        }
    }
}

/// A fixed array of 4096 palette indices packed at a single width.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackedIndices {
    words: Vec<u32>,
    bits: BitsPerIndex,
}

impl PackedIndices {
    /// Creates an array of zero indices at the given width.
    pub fn new(bits: BitsPerIndex) -> Self {
        Self {
            words: vec![0; bits.word_count()],
            bits,
        }
    }

    /// Wraps raw words read from a serialized storage.
    ///
    /// Returns `None` if the word count does not match the width.
    pub fn from_words(bits: BitsPerIndex, words: Vec<u32>) -> Option<Self> {
        (words.len() == bits.word_count()).then_some(Self { words, bits })
    }

    /// Returns the index stored in cell `cell`.
    ///
    /// # Panics
    ///
    /// Panics if `cell >= 4096`.
    pub fn get(&self, cell: usize) -> u16 {
        assert!(cell < STORAGE_CELLS, "cell {cell} out of range");
        if self.bits == BitsPerIndex::Zero {
            return 0;
        }
        let (word, shift) = self.locate(cell);
        ((self.words[word] >> shift) & self.mask()) as u16
    }

    /// Stores `index` into cell `cell`.
    ///
    /// # Panics
    ///
    /// Panics if `cell >= 4096`. Values wider than the current width are a
    /// contract violation and are caught in debug builds.
    pub fn set(&mut self, cell: usize, index: u16) {
        assert!(cell < STORAGE_CELLS, "cell {cell} out of range");
        if self.bits == BitsPerIndex::Zero {
            debug_assert_eq!(index, 0, "zero-width storage can only hold index 0");
            return;
        }
        debug_assert!(
            u32::from(index) <= self.mask(),
            "index {index} exceeds {}-bit capacity",
            self.bits.bits()
        );
        let (word, shift) = self.locate(cell);
        let mask = self.mask() << shift;
        self.words[word] = (self.words[word] & !mask) | ((u32::from(index) << shift) & mask);
    }

    /// Returns a copy of this array re-packed at another width.
    ///
    /// Every index must fit the new width.
    pub fn resized(&self, bits: BitsPerIndex) -> Self {
        let mut resized = Self::new(bits);
        if self.bits != BitsPerIndex::Zero && bits != BitsPerIndex::Zero {
            for cell in 0..STORAGE_CELLS {
                resized.set(cell, self.get(cell));
            }
        }
        resized
    }

    /// Returns the current width.
    pub fn bits(&self) -> BitsPerIndex {
        self.bits
    }

    /// Returns the raw backing words.
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Size of the backing storage in bytes.
    pub fn storage_bytes(&self) -> usize {
        self.words.len() * 4
    }

    fn mask(&self) -> u32 {
        (1u32 << self.bits.bits()) - 1
    }

    fn locate(&self, cell: usize) -> (usize, u32) {
        let per_word = self.bits.indices_per_word();
        let word = cell / per_word;
        let shift = (cell % per_word) as u32 * u32::from(self.bits.bits());
        (word, shift)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
