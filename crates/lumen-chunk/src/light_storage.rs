//! Per-voxel light levels for one sub chunk, packed as 4-bit nibbles.
//!
//! Most sub chunks are either fully lit from the sky or completely dark, so
//! light arrays start out as a [`SharedLight`] tag and only allocate their
//! 2048 bytes on the first write that changes a level.

use crate::paletted_storage::cell_index;

/// Bytes in one nibble array (4096 cells, two per byte).
pub const LIGHT_BYTES: usize = 2048;

/// Brightest light level.
pub const MAX_LIGHT: u8 = 15;

/// Which of the two light channels a value belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LightType {
    /// Light emitted by blocks.
    Block,
    /// Light coming from the sky.
    Sky,
}

/// A uniform light level shared by many sub chunks without allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SharedLight {
    /// Every cell at level 15.
    Full,
    /// Every cell at level 0.
    Dark,
}

impl SharedLight {
    /// The level every cell holds.
    pub fn level(self) -> u8 {
        match self {
            SharedLight::Full => MAX_LIGHT,
            SharedLight::Dark => 0,
        }
    }
}

/// Nibble array of 4096 light levels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LightStorage {
    /// Uniform level, no backing bytes.
    Shared(SharedLight),
    /// Private copy, one nibble per cell.
    Owned(Box<[u8; LIGHT_BYTES]>),
}

impl LightStorage {
    /// Returns the level at `(x, y, z)`. Coordinates are masked into `[0, 16)`.
    pub fn level(&self, x: u8, y: u8, z: u8) -> u8 {
        match self {
            LightStorage::Shared(shared) => shared.level(),
            LightStorage::Owned(bytes) => {
                let (byte, shift) = locate(cell_index(x, y, z));
                (bytes[byte] >> shift) & 0xF
            }
        }
    }

    /// Stores `level` (clamped to 15) at `(x, y, z)`.
    ///
    /// Writing the shared level into a shared array is a no-op; any other
    /// write first replaces the shared tag with an owned copy.
    pub fn set_level(&mut self, x: u8, y: u8, z: u8, level: u8) {
        let level = level.min(MAX_LIGHT);
        if let LightStorage::Shared(shared) = *self {
            if shared.level() == level {
                return;
            }
            let fill = shared.level() | (shared.level() << 4);
            *self = LightStorage::Owned(Box::new([fill; LIGHT_BYTES]));
        }
        if let LightStorage::Owned(bytes) = self {
            let (byte, shift) = locate(cell_index(x, y, z));
            bytes[byte] = (bytes[byte] & !(0xF << shift)) | (level << shift);
        }
    }

    /// Returns `true` if the array has no private allocation.
    pub fn is_shared(&self) -> bool {
        matches!(self, LightStorage::Shared(_))
    }

    /// Returns the raw nibble bytes, or `None` for a shared array.
    pub fn bytes(&self) -> Option<&[u8; LIGHT_BYTES]> {
        match self {
            LightStorage::Shared(_) => None,
            LightStorage::Owned(bytes) => Some(bytes),
        }
    }
}

impl Default for LightStorage {
    fn default() -> Self {
        LightStorage::Shared(SharedLight::Dark)
    }
}

fn locate(cell: usize) -> (usize, u32) {
    (cell >> 1, ((cell & 1) << 2) as u32)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_levels() {
        assert_eq!(LightStorage::Shared(SharedLight::Full).level(3, 4, 5), 15);
        assert_eq!(LightStorage::Shared(SharedLight::Dark).level(3, 4, 5), 0);
        assert_eq!(LightStorage::default(), LightStorage::Shared(SharedLight::Dark));
    }

    #[test]
    fn test_equal_write_keeps_storage_shared() {
        let mut light = LightStorage::Shared(SharedLight::Full);
        light.set_level(0, 0, 0, 15);
        assert!(light.is_shared());
    }

    #[test]
    fn test_write_copies_shared_level_first() {
        let mut light = LightStorage::Shared(SharedLight::Full);
        light.set_level(1, 2, 3, 7);
        assert!(!light.is_shared());
        assert_eq!(light.level(1, 2, 3), 7);
        assert_eq!(light.level(1, 2, 4), 15);
        assert_eq!(light.level(15, 15, 15), 15);
    }

    #[test]
    fn test_adjacent_nibbles_are_independent() {
        let mut light = LightStorage::default();
        // y = 0 and y = 1 share one byte.
        light.set_level(0, 0, 0, 9);
        light.set_level(0, 1, 0, 4);
        assert_eq!(light.level(0, 0, 0), 9);
        assert_eq!(light.level(0, 1, 0), 4);
        let bytes = light.bytes().unwrap();
        assert_eq!(bytes[0], 0x49);
    }

    #[test]
    fn test_levels_are_clamped() {
        let mut light = LightStorage::default();
        light.set_level(2, 2, 2, 200);
        assert_eq!(light.level(2, 2, 2), 15);
    }
}
