//! Central owner for all resident chunks, keyed by [`ChunkPos`].
//!
//! The [`ChunkManager`] keeps chunks in a slab and maps positions to slab
//! slots with an [`FxHashMap`](rustc_hash::FxHashMap), giving O(1) lookup,
//! insert, and removal. Slab slots also let [`ChunkManager::area_mut`] hand
//! out disjoint mutable borrows without scanning every loaded chunk.

use rustc_hash::FxHashMap;

use crate::chunk::Chunk;

/// Horizontal chunk-grid position (block coordinates divided by 16).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The chunk holding block column `(x, z)`.
    pub fn from_block(x: i32, z: i32) -> Self {
        Self { x: x >> 4, z: z >> 4 }
    }

    /// Returns the position offset by `(dx, dz)` chunks.
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            z: self.z + dz,
        }
    }
}

/// Owns all resident chunks and hands out access by [`ChunkPos`].
pub struct ChunkManager {
    slab: Vec<Option<(ChunkPos, Chunk)>>,
    index: FxHashMap<ChunkPos, usize>,
    free: Vec<usize>,
}

impl ChunkManager {
    /// Creates an empty chunk manager with no loaded chunks.
    pub fn new() -> Self {
        Self {
            slab: Vec::new(),
            index: FxHashMap::default(),
            free: Vec::new(),
        }
    }

    /// Inserts a chunk at the given position, replacing any chunk already
    /// there.
    pub fn load(&mut self, pos: ChunkPos, chunk: Chunk) {
        if let Some(&slot) = self.index.get(&pos) {
            self.slab[slot] = Some((pos, chunk));
            return;
        }
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slab[slot] = Some((pos, chunk));
                slot
            }
            None => {
                self.slab.push(Some((pos, chunk)));
                self.slab.len() - 1
            }
        };
        self.index.insert(pos, slot);
    }

    /// Removes and returns the chunk at the given position.
    pub fn unload(&mut self, pos: ChunkPos) -> Option<Chunk> {
        let slot = self.index.remove(&pos)?;
        self.free.push(slot);
        self.slab[slot].take().map(|(_, chunk)| chunk)
    }

    pub fn get(&self, pos: ChunkPos) -> Option<&Chunk> {
        let &slot = self.index.get(&pos)?;
        self.slab[slot].as_ref().map(|(_, chunk)| chunk)
    }

    pub fn get_mut(&mut self, pos: ChunkPos) -> Option<&mut Chunk> {
        let &slot = self.index.get(&pos)?;
        self.slab[slot].as_mut().map(|(_, chunk)| chunk)
    }

    /// Number of currently loaded chunks.
    pub fn loaded_count(&self) -> usize {
        self.index.len()
    }

    /// Iterates over all loaded `(position, chunk)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&ChunkPos, &Chunk)> {
        self.slab
            .iter()
            .filter_map(|entry| entry.as_ref().map(|(pos, chunk)| (pos, chunk)))
    }

    /// Mutable iteration over all loaded `(position, chunk)` pairs.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&ChunkPos, &mut Chunk)> {
        self.slab
            .iter_mut()
            .filter_map(|entry| entry.as_mut().map(|(pos, chunk)| (&*pos, chunk)))
    }

    /// Borrows the square of chunks within `radius` of `center`.
    ///
    /// The result has `(2 radius + 1)²` slots in row-major order: slot
    /// `dz * width + dx` holds the chunk at `center + (dx - radius, dz - radius)`,
    /// or `None` if it is not loaded. All borrows are disjoint. Cost depends on
    /// the area, not on the number of loaded chunks.
    pub fn area_mut(&mut self, center: ChunkPos, radius: i32) -> Vec<Option<&mut Chunk>> {
        let width = (2 * radius + 1) as usize;
        let mut slots: Vec<Option<&mut Chunk>> = (0..width * width).map(|_| None).collect();

        // (slab slot, area slot) for every loaded position, in slab order.
        let mut wanted = Vec::with_capacity(width * width);
        for dz in 0..width {
            for dx in 0..width {
                let pos = center.offset(dx as i32 - radius, dz as i32 - radius);
                if let Some(&slab_slot) = self.index.get(&pos) {
                    wanted.push((slab_slot, dz * width + dx));
                }
            }
        }
        wanted.sort_unstable();

        let mut rest: &mut [Option<(ChunkPos, Chunk)>] = &mut self.slab;
        let mut base = 0;
        for (slab_slot, area_slot) in wanted {
            let (_, tail) = std::mem::take(&mut rest).split_at_mut(slab_slot - base);
            let Some((entry, tail)) = tail.split_first_mut() else {
                break;
            };
            if let Some((_, chunk)) = entry {
                slots[area_slot] = Some(chunk);
            }
            rest = tail;
            base = slab_slot + 1;
        }
        slots
    }
}

impl Default for ChunkManager {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
