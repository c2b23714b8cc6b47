//! Append-only palette mapping small indices to 32-bit values.
//!
//! A palette holds the distinct block runtime IDs (or biome IDs) referenced by
//! one [`PalettedStorage`](crate::PalettedStorage). It never deduplicates on
//! [`add`](Palette::add): callers look the value up with
//! [`index_of`](Palette::index_of) first.

use crate::bit_packed::BitsPerIndex;

/// Largest number of entries a palette may hold (the 16-bit index space).
pub const MAX_PALETTE_LEN: usize = 1 << 16;

/// Ordered list of distinct values, indexed by `u16`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    values: Vec<u32>,
}

impl Palette {
    /// Creates a single-entry palette.
    pub fn new(value: u32) -> Self {
        Self {
            values: vec![value],
        }
    }

    /// Creates a palette from decoded values. The list must not be empty.
    pub fn from_values(values: Vec<u32>) -> Self {
        debug_assert!(!values.is_empty(), "a palette needs at least one value");
        Self { values }
    }

    /// Appends `value` and returns its index.
    ///
    /// # Panics
    ///
    /// Panics if the palette already holds [`MAX_PALETTE_LEN`] entries.
    pub fn add(&mut self, value: u32) -> u16 {
        assert!(
            self.values.len() < MAX_PALETTE_LEN,
            "palette is full ({MAX_PALETTE_LEN} entries)"
        );
        self.values.push(value);
        (self.values.len() - 1) as u16
    }

    /// Returns the index of `value`, or `None` if it is not present.
    pub fn index_of(&self, value: u32) -> Option<u16> {
        self.values
            .iter()
            .position(|&v| v == value)
            .map(|i| i as u16)
    }

    /// Returns the value at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is beyond the palette length.
    pub fn value(&self, index: u16) -> u32 {
        self.values[index as usize]
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always `false` for a well-formed palette.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Remaps every value in place, e.g. after runtime IDs are renumbered.
    pub fn replace(&mut self, mut f: impl FnMut(u32) -> u32) {
        for value in &mut self.values {
            *value = f(*value);
        }
    }

    /// The smallest index width covering the current length.
    pub fn bits_required(&self) -> BitsPerIndex {
        BitsPerIndex::for_palette_len(self.values.len())
    }

    /// The values in index order.
    pub fn values(&self) -> &[u32] {
        &self.values
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_returns_sequential_indices() {
        let mut palette = Palette::new(0);
        assert_eq!(palette.add(5), 1);
        assert_eq!(palette.add(9), 2);
        assert_eq!(palette.index_of(9), Some(2));
        assert_eq!(palette.index_of(0), Some(0));
        assert_eq!(palette.index_of(4), None);
        assert_eq!(palette.value(1), 5);
    }

    #[test]
    fn test_width_class_grows_with_len() {
        let mut palette = Palette::new(0);
        assert_eq!(palette.bits_required(), BitsPerIndex::Zero);
        for v in 1..16 {
            palette.add(v);
        }
        assert_eq!(palette.len(), 16);
        assert_eq!(palette.bits_required(), BitsPerIndex::Four);
        palette.add(16);
        assert_eq!(palette.bits_required(), BitsPerIndex::Five);
    }

    #[test]
    fn test_replace_remaps_all_values() {
        let mut palette = Palette::from_values(vec![1, 2, 3]);
        palette.replace(|v| v * 10);
        assert_eq!(palette.values(), &[10, 20, 30]);
    }

    #[test]
    #[should_panic]
    fn test_value_beyond_len_panics() {
        let palette = Palette::new(7);
        palette.value(1);
    }
}
