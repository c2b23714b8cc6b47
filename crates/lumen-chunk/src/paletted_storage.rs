//! Palette-compressed storage for one 16×16×16 volume.
//!
//! Each storage keeps a [`Palette`] of distinct values and a [`PackedIndices`]
//! array. The index width follows the palette length, so a storage filled
//! with a single value uses no backing words at all.

use thiserror::Error;

use crate::bit_packed::{BitsPerIndex, PackedIndices, STORAGE_CELLS};
use crate::palette::{MAX_PALETTE_LEN, Palette};

/// Converts local coordinates to a cell index (`x` slowest, `y` fastest).
///
/// Coordinates are masked into `[0, 16)`.
pub fn cell_index(x: u8, y: u8, z: u8) -> usize {
    (usize::from(x & 15) << 8) | (usize::from(z & 15) << 4) | usize::from(y & 15)
}

/// Errors raised when assembling a storage from decoded parts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StorageError {
    /// A zero-width storage was given more or less than one palette value.
    #[error("uniform storage needs exactly one palette value, got {0}")]
    UniformPaletteLen(usize),
    /// A cell references a palette entry that does not exist.
    #[error("cell {cell} references palette index {index}, palette has {len} entries")]
    IndexOutOfPalette {
        /// Offending cell.
        cell: usize,
        /// Index stored in the cell.
        index: u16,
        /// Palette length.
        len: usize,
    },
}

/// A 4096-cell grid of values, stored as bit-packed palette indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PalettedStorage {
    indices: PackedIndices,
    palette: Palette,
}

impl PalettedStorage {
    /// Creates a storage uniformly filled with `value` (zero backing words).
    pub fn new(value: u32) -> Self {
        Self {
            indices: PackedIndices::new(BitsPerIndex::Zero),
            palette: Palette::new(value),
        }
    }

    /// Assembles a storage from decoded indices and palette.
    ///
    /// Every cell is checked against the palette length. A width wider than
    /// the palette requires is accepted.
    pub fn from_raw(indices: PackedIndices, palette: Palette) -> Result<Self, StorageError> {
        if indices.bits() == BitsPerIndex::Zero {
            if palette.len() != 1 {
                return Err(StorageError::UniformPaletteLen(palette.len()));
            }
        } else {
            for cell in 0..STORAGE_CELLS {
                let index = indices.get(cell);
                if usize::from(index) >= palette.len() {
                    return Err(StorageError::IndexOutOfPalette {
                        cell,
                        index,
                        len: palette.len(),
                    });
                }
            }
        }
        Ok(Self { indices, palette })
    }

    /// Returns the value at `(x, y, z)`. Coordinates are masked into `[0, 16)`.
    pub fn at(&self, x: u8, y: u8, z: u8) -> u32 {
        self.palette
            .value(self.indices.get(cell_index(x, y, z)))
    }

    /// Sets the value at `(x, y, z)`. Coordinates are masked into `[0, 16)`.
    ///
    /// The value is added to the palette if needed. If that pushes the palette
    /// past the current width, every index is re-packed at the new width
    /// before the write. A full palette is compacted first; at most 4096
    /// entries are live, so there is always room afterwards.
    pub fn set(&mut self, x: u8, y: u8, z: u8, value: u32) {
        let index = match self.palette.index_of(value) {
            Some(index) => index,
            None => {
                if self.palette.len() >= MAX_PALETTE_LEN {
                    tracing::trace!("palette full, compacting before write");
                    self.compact();
                }
                let index = self.palette.add(value);
                let required = self.palette.bits_required();
                if required > self.indices.bits() {
                    self.resize(required);
                }
                index
            }
        };
        self.indices.set(cell_index(x, y, z), index);
    }

    /// Resets the storage to a uniform fill of `value`.
    pub fn fill(&mut self, value: u32) {
        self.indices = PackedIndices::new(BitsPerIndex::Zero);
        self.palette = Palette::new(value);
    }

    /// Removes palette entries no cell refers to and shrinks the index width.
    ///
    /// Scans all 4096 cells, so call it before serialization rather than
    /// during simulation.
    pub fn compact(&mut self) {
        let mut used = vec![false; self.palette.len()];
        for cell in 0..STORAGE_CELLS {
            used[usize::from(self.indices.get(cell))] = true;
        }

        let mut remap = vec![0u16; self.palette.len()];
        let mut values = Vec::with_capacity(used.iter().filter(|&&u| u).count());
        for (old, &is_used) in used.iter().enumerate() {
            if is_used {
                remap[old] = values.len() as u16;
                values.push(self.palette.value(old as u16));
            }
        }

        if values.len() == self.palette.len() {
            let bits = BitsPerIndex::for_palette_len(values.len());
            if bits < self.indices.bits() {
                self.indices = self.indices.resized(bits);
            }
            return;
        }

        let palette = Palette::from_values(values);
        let mut indices = PackedIndices::new(palette.bits_required());
        if indices.bits() != BitsPerIndex::Zero {
            for cell in 0..STORAGE_CELLS {
                let old = self.indices.get(cell);
                indices.set(cell, remap[usize::from(old)]);
            }
        }
        self.indices = indices;
        self.palette = palette;
    }

    /// Remaps every palette value, e.g. when runtime IDs are renumbered.
    pub fn replace_values(&mut self, f: impl FnMut(u32) -> u32) {
        self.palette.replace(f);
    }

    /// Returns `true` if the storage is a uniform fill of `value`.
    pub fn is_uniform(&self, value: u32) -> bool {
        self.palette.len() == 1 && self.palette.value(0) == value
    }

    /// Returns the current index width.
    pub fn bits_per_index(&self) -> BitsPerIndex {
        self.indices.bits()
    }

    /// Returns the raw index words.
    pub fn raw_indices(&self) -> &[u32] {
        self.indices.words()
    }

    /// Returns the palette.
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Size of the index storage in bytes.
    pub fn storage_bytes(&self) -> usize {
        self.indices.storage_bytes()
    }

    fn resize(&mut self, bits: BitsPerIndex) {
        assert!(
            bits.max_palette_len() >= self.palette.len(),
            "cannot resize to {bits:?} with {} palette entries",
            self.palette.len()
        );
        tracing::trace!(
            from = self.indices.bits().bits(),
            to = bits.bits(),
            "resizing paletted storage"
        );
        self.indices = self.indices.resized(bits);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
