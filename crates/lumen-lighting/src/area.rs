//! A square window of chunks borrowed for light propagation.
//!
//! The area is `width × width` chunks with the focus chunk in the middle.
//! Slots may be empty where a neighbour is not loaded; light never spreads
//! into an empty slot.

use lumen_chunk::{BlockRegistry, Chunk, LightType, MAX_LIGHT, WorldRange};
use thiserror::Error;

use crate::node::VoxelPos;

/// Errors raised when an area cannot be built.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LightAreaError {
    /// The width is zero or even, so there is no centre chunk.
    #[error("light area width must be odd, got {0}")]
    EvenWidth(usize),
    /// The slot count is not `width²`.
    #[error("light area of width {width} needs {expected} slots, got {got}")]
    SlotCount {
        width: usize,
        expected: usize,
        got: usize,
    },
    /// The centre slot is empty.
    #[error("focus chunk is not loaded")]
    MissingFocus,
    /// A neighbour spans a different world height than the focus chunk.
    #[error("chunk world range {found:?} differs from focus range {expected:?}")]
    RangeMismatch {
        expected: WorldRange,
        found: WorldRange,
    },
}

/// Exclusive borrows of a square of chunks, valid for one lighting pass.
pub struct LightArea<'a> {
    focus: &'a mut Chunk,
    /// Neighbour slots; the focus slot is always `None`.
    chunks: Vec<Option<&'a mut Chunk>>,
    width: usize,
    range: WorldRange,
}

impl<'a> LightArea<'a> {
    /// Builds an area from row-major slots (`dz * width + dx`).
    pub fn new(
        mut chunks: Vec<Option<&'a mut Chunk>>,
        width: usize,
    ) -> Result<Self, LightAreaError> {
        if width % 2 == 0 {
            return Err(LightAreaError::EvenWidth(width));
        }
        let expected = width * width;
        if chunks.len() != expected {
            return Err(LightAreaError::SlotCount {
                width,
                expected,
                got: chunks.len(),
            });
        }
        let focus = chunks[expected / 2]
            .take()
            .ok_or(LightAreaError::MissingFocus)?;
        let range = focus.range();
        for chunk in chunks.iter().flatten() {
            if chunk.range() != range {
                return Err(LightAreaError::RangeMismatch {
                    expected: range,
                    found: chunk.range(),
                });
            }
        }
        Ok(Self {
            focus,
            chunks,
            width,
            range,
        })
    }

    /// An area holding only `chunk`.
    pub fn single(chunk: &'a mut Chunk) -> Self {
        let range = chunk.range();
        Self {
            focus: chunk,
            chunks: vec![None],
            width: 1,
            range,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn range(&self) -> WorldRange {
        self.range
    }

    /// Area-local X and Z of the focus chunk's first column.
    pub fn focus_origin(&self) -> (i32, i32) {
        let origin = (self.width / 2) as i32 * 16;
        (origin, origin)
    }

    pub fn focus(&self) -> &Chunk {
        &*self.focus
    }

    pub fn focus_mut(&mut self) -> &mut Chunk {
        &mut *self.focus
    }

    fn focus_slot(&self) -> usize {
        self.width * self.width / 2
    }

    /// Slot index and in-chunk column for an area-local position.
    fn locate(&self, pos: VoxelPos) -> Option<(usize, u8, u8)> {
        let extent = (self.width * 16) as i32;
        if !(0..extent).contains(&pos.x) || !(0..extent).contains(&pos.z) {
            return None;
        }
        let slot = (pos.z >> 4) as usize * self.width + (pos.x >> 4) as usize;
        Some((slot, (pos.x & 15) as u8, (pos.z & 15) as u8))
    }

    fn chunk(&self, pos: VoxelPos) -> Option<(&Chunk, u8, u8)> {
        let (slot, x, z) = self.locate(pos)?;
        if slot == self.focus_slot() {
            return Some((&*self.focus, x, z));
        }
        self.chunks[slot].as_deref().map(|chunk| (chunk, x, z))
    }

    /// Returns `true` if `pos` lies in a loaded chunk and inside the world
    /// height.
    pub fn is_resident(&self, pos: VoxelPos) -> bool {
        self.range.contains(pos.y) && self.chunk(pos).is_some()
    }

    /// Returns `true` if `pos` lies in the focus chunk and inside the world
    /// height.
    pub fn in_focus(&self, pos: VoxelPos) -> bool {
        let (ox, oz) = self.focus_origin();
        self.range.contains(pos.y)
            && (ox..ox + 16).contains(&pos.x)
            && (oz..oz + 16).contains(&pos.z)
    }

    /// Light level at `pos`. Unloaded chunks are dark; above the world the
    /// sky is fully lit.
    pub fn light(&self, pos: VoxelPos, kind: LightType) -> u8 {
        match self.chunk(pos) {
            Some((chunk, x, z)) => chunk.light(kind, x, pos.y, z),
            None if kind == LightType::Sky && pos.y > i32::from(self.range.max) => MAX_LIGHT,
            None => 0,
        }
    }

    /// Stores a light level. Writes outside resident chunks are dropped.
    pub fn set_light(&mut self, pos: VoxelPos, kind: LightType, level: u8) {
        let Some((slot, x, z)) = self.locate(pos) else {
            return;
        };
        let chunk = if slot == self.focus_slot() {
            Some(&mut *self.focus)
        } else {
            self.chunks[slot].as_deref_mut()
        };
        if let Some(chunk) = chunk {
            chunk.set_light(kind, x, pos.y, z, level);
        }
    }

    /// Light absorbed by the voxel at `pos`: the highest filter over its layers.
    pub fn filter(&self, pos: VoxelPos, registry: &(impl BlockRegistry + ?Sized)) -> u8 {
        self.max_over_layers(pos, |rid| registry.light_filter(rid))
    }

    /// Light emitted by the voxel at `pos`: the highest emission over its layers.
    pub fn emission(&self, pos: VoxelPos, registry: &(impl BlockRegistry + ?Sized)) -> u8 {
        self.max_over_layers(pos, |rid| registry.light_emission(rid))
    }

    fn max_over_layers(&self, pos: VoxelPos, f: impl Fn(u32) -> u8) -> u8 {
        let Some((chunk, x, z)) = self.chunk(pos) else {
            return 0;
        };
        if !self.range.contains(pos.y) {
            return 0;
        }
        let sub = &chunk.sub()[chunk.sub_index(pos.y)];
        let y = (pos.y & 15) as u8;
        sub.layers()
            .iter()
            .map(|storage| f(storage.at(x, y, z)))
            .max()
            .unwrap_or(0)
            .min(MAX_LIGHT)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
