//! Chunk columns: a vertical stack of sub chunks spanning the world height.
//!
//! A [`Chunk`] covers 16×16 columns from [`WorldRange::min`] to
//! [`WorldRange::max`]. Sub chunk `i` holds the band
//! `[min + 16 i, min + 16 i + 15]`. Horizontal coordinates are local to the
//! chunk and masked into `[0, 16)`; Y is absolute.

use serde::{Deserialize, Serialize};

use crate::height_map::HeightMap;
use crate::light_storage::{LightType, MAX_LIGHT};
use crate::paletted_storage::PalettedStorage;
use crate::registry::BlockRegistry;
use crate::sub_chunk::SubChunk;

/// Inclusive vertical extent of a dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldRange {
    pub min: i16,
    pub max: i16,
}

impl WorldRange {
    /// Overworld height since the caves and cliffs update.
    pub const OVERWORLD: WorldRange = WorldRange { min: -64, max: 319 };
    pub const NETHER: WorldRange = WorldRange { min: 0, max: 127 };
    pub const END: WorldRange = WorldRange { min: 0, max: 255 };

    /// Creates a range. Both bounds should sit on a 16-block band edge.
    pub fn new(min: i16, max: i16) -> Self {
        debug_assert!(min < max, "empty world range {min}..={max}");
        Self { min, max }
    }

    /// Number of blocks from `min` to `max` inclusive.
    pub fn height(self) -> i32 {
        i32::from(self.max) - i32::from(self.min) + 1
    }

    /// Number of 16-block sub chunks in the range.
    pub fn sub_chunk_count(self) -> usize {
        ((self.height() + 15) >> 4) as usize
    }

    /// Returns `true` if `y` lies in the range.
    pub fn contains(self, y: i32) -> bool {
        (i32::from(self.min)..=i32::from(self.max)).contains(&y)
    }
}

impl Default for WorldRange {
    fn default() -> Self {
        WorldRange::OVERWORLD
    }
}

/// A 16-wide column of sub chunks with per-voxel biomes.
#[derive(Clone, Debug)]
pub struct Chunk {
    range: WorldRange,
    air: u32,
    sub: Vec<SubChunk>,
    biomes: Vec<PalettedStorage>,
    height_map: HeightMap,
    height_map_stale: bool,
}

impl Chunk {
    /// Creates an all-air chunk with biome 0 everywhere.
    pub fn new(air: u32, range: WorldRange) -> Self {
        let count = range.sub_chunk_count();
        Self {
            range,
            air,
            sub: (0..count).map(|_| SubChunk::new(air)).collect(),
            biomes: (0..count).map(|_| PalettedStorage::new(0)).collect(),
            height_map: HeightMap::new(range.min),
            height_map_stale: true,
        }
    }

    /// Assembles a chunk from decoded parts. Both vectors must match the
    /// range's sub chunk count.
    pub(crate) fn from_parts(
        air: u32,
        range: WorldRange,
        sub: Vec<SubChunk>,
        biomes: Vec<PalettedStorage>,
    ) -> Self {
        debug_assert_eq!(sub.len(), range.sub_chunk_count());
        debug_assert_eq!(biomes.len(), range.sub_chunk_count());
        Self {
            range,
            air,
            sub,
            biomes,
            height_map: HeightMap::new(range.min),
            height_map_stale: true,
        }
    }

    /// The vertical extent of this chunk.
    pub fn range(&self) -> WorldRange {
        self.range
    }

    /// The air runtime ID.
    pub fn air(&self) -> u32 {
        self.air
    }

    /// The sub chunk index holding absolute `y`. `y` must be in range.
    pub fn sub_index(&self, y: i32) -> usize {
        ((y - i32::from(self.range.min)) >> 4) as usize
    }

    /// The lowest absolute Y of sub chunk `index`.
    pub fn sub_y(&self, index: usize) -> i32 {
        index as i32 * 16 + i32::from(self.range.min)
    }

    /// All sub chunks, lowest first.
    pub fn sub(&self) -> &[SubChunk] {
        &self.sub
    }

    /// Mutable access to the sub chunks. Marks the height map stale.
    pub fn sub_mut(&mut self) -> &mut [SubChunk] {
        self.height_map_stale = true;
        &mut self.sub
    }

    /// Biome storages, one per sub chunk.
    pub fn biomes(&self) -> &[PalettedStorage] {
        &self.biomes
    }

    /// Block at `(x, y, z)` in `layer`. Out-of-range Y reads as air.
    pub fn block(&self, x: u8, y: i32, z: u8, layer: usize) -> u32 {
        if !self.range.contains(y) {
            return self.air;
        }
        self.sub[self.sub_index(y)].block(x, (y & 15) as u8, z, layer)
    }

    /// Sets the block at `(x, y, z)` in `layer`.
    ///
    /// Writing air into a missing layer is a no-op. Writes outside the world
    /// range are dropped with a warning.
    pub fn set_block(&mut self, x: u8, y: i32, z: u8, layer: usize, value: u32) {
        if !self.range.contains(y) {
            tracing::warn!(x, y, z, "block write outside world range ignored");
            return;
        }
        let index = self.sub_index(y);
        self.sub[index].set_block(x, (y & 15) as u8, z, layer, value);
        self.height_map_stale = true;
    }

    /// Biome at `(x, y, z)`. Out-of-range Y clamps to the nearest band.
    pub fn biome(&self, x: u8, y: i32, z: u8) -> u32 {
        let y = y.clamp(i32::from(self.range.min), i32::from(self.range.max));
        self.biomes[self.sub_index(y)].at(x, (y & 15) as u8, z)
    }

    /// Sets the biome at `(x, y, z)`. Out-of-range writes are dropped.
    pub fn set_biome(&mut self, x: u8, y: i32, z: u8, biome: u32) {
        if !self.range.contains(y) {
            tracing::warn!(x, y, z, "biome write outside world range ignored");
            return;
        }
        let index = self.sub_index(y);
        self.biomes[index].set(x, (y & 15) as u8, z, biome);
    }

    /// Light level of either channel.
    ///
    /// Above the world the sky is fully lit; below it everything is dark.
    pub fn light(&self, kind: LightType, x: u8, y: i32, z: u8) -> u8 {
        if y > i32::from(self.range.max) {
            return match kind {
                LightType::Sky => MAX_LIGHT,
                LightType::Block => 0,
            };
        }
        if y < i32::from(self.range.min) {
            return 0;
        }
        self.sub[self.sub_index(y)].light(kind, x, (y & 15) as u8, z)
    }

    /// Sets a light level. Out-of-range writes are dropped.
    pub fn set_light(&mut self, kind: LightType, x: u8, y: i32, z: u8, level: u8) {
        if !self.range.contains(y) {
            return;
        }
        let index = self.sub_index(y);
        self.sub[index].set_light(kind, x, (y & 15) as u8, z, level);
    }

    /// Block light at `(x, y, z)`.
    pub fn block_light(&self, x: u8, y: i32, z: u8) -> u8 {
        self.light(LightType::Block, x, y, z)
    }

    /// Sky light at `(x, y, z)`.
    pub fn sky_light(&self, x: u8, y: i32, z: u8) -> u8 {
        self.light(LightType::Sky, x, y, z)
    }

    /// Highest Y in column `(x, z)` holding a non-air block in any layer, or
    /// the world minimum if the column is empty.
    pub fn highest_block(&self, x: u8, z: u8) -> i32 {
        for (index, sub) in self.sub.iter().enumerate().rev() {
            if sub.is_empty() {
                continue;
            }
            for y in (0..16u8).rev() {
                let solid = (0..sub.layers().len()).any(|layer| sub.block(x, y, z, layer) != self.air);
                if solid {
                    return self.sub_y(index) + i32::from(y);
                }
            }
        }
        i32::from(self.range.min)
    }

    /// Highest Y in column `(x, z)` whose block fully blocks light, or the
    /// world minimum if there is none.
    pub fn highest_light_blocker(&self, x: u8, z: u8, registry: &(impl BlockRegistry + ?Sized)) -> i32 {
        for (index, sub) in self.sub.iter().enumerate().rev() {
            if sub.is_empty() {
                continue;
            }
            for y in (0..16u8).rev() {
                let filter = sub
                    .layers()
                    .iter()
                    .map(|storage| registry.light_filter(storage.at(x, y, z)))
                    .max()
                    .unwrap_or(0);
                if filter >= MAX_LIGHT {
                    return self.sub_y(index) + i32::from(y);
                }
            }
        }
        i32::from(self.range.min)
    }

    /// Per-column highest light blocker, recomputed after block changes.
    pub fn height_map(&mut self, registry: &(impl BlockRegistry + ?Sized)) -> &HeightMap {
        if self.height_map_stale {
            let mut map = HeightMap::new(self.range.min);
            for x in 0..16 {
                for z in 0..16 {
                    map.set(x, z, self.highest_light_blocker(x, z, registry) as i16);
                }
            }
            self.height_map = map;
            self.height_map_stale = false;
        }
        &self.height_map
    }

    /// Compacts every block layer and biome storage.
    pub fn compact(&mut self) {
        for sub in &mut self.sub {
            sub.compact();
        }
        for biomes in &mut self.biomes {
            biomes.compact();
        }
    }

    /// Index of the highest non-empty sub chunk, or `None` for an empty chunk.
    pub fn highest_sub_chunk(&self) -> Option<usize> {
        self.sub.iter().rposition(|sub| !sub.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{BlockDef, BlockState, BlockTable};

    fn table() -> (BlockTable, u32, u32) {
        let mut table = BlockTable::new();
        let stone = table
            .register(BlockDef::opaque(BlockState::new("minecraft:stone")))
            .unwrap();
        let glass = table
            .register(BlockDef::transparent(BlockState::new("minecraft:glass")))
            .unwrap();
        (table, stone, glass)
    }

    #[test]
    fn test_world_range_counts() {
        assert_eq!(WorldRange::OVERWORLD.height(), 384);
        assert_eq!(WorldRange::OVERWORLD.sub_chunk_count(), 24);
        assert_eq!(WorldRange::NETHER.sub_chunk_count(), 8);
        assert!(WorldRange::END.contains(255));
        assert!(!WorldRange::END.contains(256));
    }

    #[test]
    fn test_sub_index_and_sub_y() {
        let chunk = Chunk::new(0, WorldRange::OVERWORLD);
        assert_eq!(chunk.sub().len(), 24);
        assert_eq!(chunk.sub_index(-64), 0);
        assert_eq!(chunk.sub_index(-49), 0);
        assert_eq!(chunk.sub_index(-48), 1);
        assert_eq!(chunk.sub_index(319), 23);
        assert_eq!(chunk.sub_y(4), 0);
    }

    #[test]
    fn test_set_and_get_negative_y() {
        let mut chunk = Chunk::new(0, WorldRange::OVERWORLD);
        chunk.set_block(3, -60, 7, 0, 5);
        assert_eq!(chunk.block(3, -60, 7, 0), 5);
        assert_eq!(chunk.block(3, -59, 7, 0), 0);
        assert_eq!(chunk.highest_block(3, 7), -60);
    }

    #[test]
    fn test_out_of_range_y_is_ignored() {
        let mut chunk = Chunk::new(0, WorldRange::NETHER);
        chunk.set_block(0, 128, 0, 0, 5);
        chunk.set_block(0, -1, 0, 0, 5);
        assert_eq!(chunk.block(0, 128, 0, 0), 0);
        assert_eq!(chunk.block(0, -1, 0, 0), 0);
        assert!(chunk.sub().iter().all(SubChunk::is_empty));
    }

    #[test]
    fn test_air_write_into_missing_layer_keeps_chunk_empty() {
        let mut chunk = Chunk::new(0, WorldRange::OVERWORLD);
        chunk.set_block(0, 0, 0, 1, 0);
        assert!(chunk.sub()[4].layers().is_empty());
        assert_eq!(chunk.highest_sub_chunk(), None);
    }

    #[test]
    fn test_light_outside_range() {
        let chunk = Chunk::new(0, WorldRange::OVERWORLD);
        assert_eq!(chunk.sky_light(0, 400, 0), 15);
        assert_eq!(chunk.sky_light(0, -100, 0), 0);
        assert_eq!(chunk.block_light(0, 400, 0), 0);
    }

    #[test]
    fn test_highest_light_blocker_skips_transparent() {
        let (table, stone, glass) = table();
        let mut chunk = Chunk::new(0, WorldRange::OVERWORLD);
        chunk.set_block(2, 10, 2, 0, stone);
        chunk.set_block(2, 20, 2, 0, glass);
        assert_eq!(chunk.highest_block(2, 2), 20);
        assert_eq!(chunk.highest_light_blocker(2, 2, &table), 10);
        assert_eq!(chunk.highest_light_blocker(5, 5, &table), -64);
    }

    #[test]
    fn test_height_map_recomputes_after_change() {
        let (table, stone, _) = table();
        let mut chunk = Chunk::new(0, WorldRange::OVERWORLD);
        chunk.set_block(1, 30, 1, 0, stone);
        assert_eq!(chunk.height_map(&table).at(1, 1), 30);
        chunk.set_block(1, 40, 1, 0, stone);
        assert_eq!(chunk.height_map(&table).at(1, 1), 40);
        assert_eq!(chunk.height_map(&table).at(0, 0), -64);
    }

    #[test]
    fn test_biomes_default_to_zero() {
        let mut chunk = Chunk::new(0, WorldRange::OVERWORLD);
        assert_eq!(chunk.biome(4, 100, 4), 0);
        chunk.set_biome(4, 100, 4, 7);
        assert_eq!(chunk.biome(4, 100, 4), 7);
        assert_eq!(chunk.biome(4, 101, 4), 0);
    }

    #[test]
    fn test_compact_shrinks_layers() {
        let mut chunk = Chunk::new(0, WorldRange::OVERWORLD);
        chunk.set_block(0, 0, 0, 0, 9);
        chunk.set_block(0, 0, 0, 0, 0);
        assert!(!chunk.sub()[4].is_empty());
        chunk.compact();
        assert!(chunk.sub()[4].is_empty());
    }
}
