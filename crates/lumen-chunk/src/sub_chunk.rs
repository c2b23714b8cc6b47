//! A 16×16×16 section of a chunk column.
//!
//! A sub chunk holds any number of block layers (layer 0 for regular blocks,
//! layer 1 for waterlogging and similar overlays) plus block and sky light.
//! Layers are created lazily on first write.

use crate::light_storage::{LightStorage, LightType, SharedLight};
use crate::paletted_storage::PalettedStorage;

/// One 16-block band of a [`Chunk`](crate::Chunk).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubChunk {
    air: u32,
    storages: Vec<PalettedStorage>,
    block_light: LightStorage,
    sky_light: LightStorage,
}

impl SubChunk {
    /// Creates an empty sub chunk with no layers and dark light.
    pub fn new(air: u32) -> Self {
        Self {
            air,
            storages: Vec::new(),
            block_light: LightStorage::default(),
            sky_light: LightStorage::default(),
        }
    }

    /// Creates a sub chunk from decoded layers.
    pub fn from_layers(air: u32, storages: Vec<PalettedStorage>) -> Self {
        Self {
            storages,
            ..Self::new(air)
        }
    }

    /// The air runtime ID this sub chunk was created with.
    pub fn air(&self) -> u32 {
        self.air
    }

    /// Returns `true` if the sub chunk has no layers, or a single layer that
    /// is uniformly air.
    pub fn is_empty(&self) -> bool {
        match self.storages.as_slice() {
            [] => true,
            [only] => only.is_uniform(self.air),
            _ => false,
        }
    }

    /// Grows the layer list so that at least `count` layers exist.
    ///
    /// New layers are uniform air storages.
    pub fn ensure_layers(&mut self, count: usize) {
        let air = self.air;
        if self.storages.len() < count {
            self.storages.resize_with(count, || PalettedStorage::new(air));
        }
    }

    /// Returns layer `n`, creating it and every layer below it if needed.
    pub fn layer(&mut self, n: usize) -> &mut PalettedStorage {
        self.ensure_layers(n + 1);
        &mut self.storages[n]
    }

    /// Returns the existing layers, lowest first.
    pub fn layers(&self) -> &[PalettedStorage] {
        &self.storages
    }

    /// Returns the block at local `(x, y, z)` in `layer`, or air if that layer
    /// does not exist.
    pub fn block(&self, x: u8, y: u8, z: u8, layer: usize) -> u32 {
        self.storages
            .get(layer)
            .map_or(self.air, |storage| storage.at(x, y, z))
    }

    /// Sets the block at local `(x, y, z)` in `layer`.
    ///
    /// Writing air into a layer that does not exist yet does nothing.
    pub fn set_block(&mut self, x: u8, y: u8, z: u8, layer: usize, value: u32) {
        if layer >= self.storages.len() && value == self.air {
            return;
        }
        self.layer(layer).set(x, y, z, value);
    }

    /// Compacts every layer and drops trailing layers that are all air.
    pub fn compact(&mut self) {
        for storage in &mut self.storages {
            storage.compact();
        }
        while self
            .storages
            .last()
            .is_some_and(|storage| storage.is_uniform(self.air))
        {
            self.storages.pop();
        }
    }

    /// Block light level at `(x, y, z)`.
    pub fn block_light(&self, x: u8, y: u8, z: u8) -> u8 {
        self.block_light.level(x, y, z)
    }

    /// Sky light level at `(x, y, z)`.
    pub fn sky_light(&self, x: u8, y: u8, z: u8) -> u8 {
        self.sky_light.level(x, y, z)
    }

    /// Sets the block light level at `(x, y, z)`.
    pub fn set_block_light(&mut self, x: u8, y: u8, z: u8, level: u8) {
        self.block_light.set_level(x, y, z, level);
    }

    /// Sets the sky light level at `(x, y, z)`.
    pub fn set_sky_light(&mut self, x: u8, y: u8, z: u8, level: u8) {
        self.sky_light.set_level(x, y, z, level);
    }

    /// Light level of either channel at `(x, y, z)`.
    pub fn light(&self, kind: LightType, x: u8, y: u8, z: u8) -> u8 {
        self.light_storage(kind).level(x, y, z)
    }

    /// Sets the light level of either channel at `(x, y, z)`.
    pub fn set_light(&mut self, kind: LightType, x: u8, y: u8, z: u8, level: u8) {
        match kind {
            LightType::Block => self.block_light.set_level(x, y, z, level),
            LightType::Sky => self.sky_light.set_level(x, y, z, level),
        }
    }

    /// Replaces a whole light channel with a shared uniform level.
    pub fn fill_light(&mut self, kind: LightType, level: SharedLight) {
        match kind {
            LightType::Block => self.block_light = LightStorage::Shared(level),
            LightType::Sky => self.sky_light = LightStorage::Shared(level),
        }
    }

    /// Resets both light channels to dark.
    pub fn reset_light(&mut self) {
        self.fill_light(LightType::Block, SharedLight::Dark);
        self.fill_light(LightType::Sky, SharedLight::Dark);
    }

    /// The storage backing one light channel.
    pub fn light_storage(&self, kind: LightType) -> &LightStorage {
        match kind {
            LightType::Block => &self.block_light,
            LightType::Sky => &self.sky_light,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const AIR: u32 = 0;
    const STONE: u32 = 1;
    const WATER: u32 = 2;

    #[test]
    fn test_new_sub_chunk_is_empty() {
        let sub = SubChunk::new(AIR);
        assert!(sub.is_empty());
        assert!(sub.layers().is_empty());
        assert_eq!(sub.block(3, 3, 3, 0), AIR);
        assert_eq!(sub.block(3, 3, 3, 5), AIR);
    }

    #[test]
    fn test_air_into_missing_layer_is_noop() {
        let mut sub = SubChunk::new(AIR);
        sub.set_block(1, 1, 1, 1, AIR);
        assert!(sub.layers().is_empty());
    }

    #[test]
    fn test_layer_grows_all_lower_layers() {
        let mut sub = SubChunk::new(AIR);
        sub.set_block(4, 5, 6, 1, WATER);
        assert_eq!(sub.layers().len(), 2);
        assert!(sub.layers()[0].is_uniform(AIR));
        assert_eq!(sub.block(4, 5, 6, 1), WATER);
        assert!(!sub.is_empty());
    }

    #[test]
    fn test_single_air_layer_counts_as_empty() {
        let mut sub = SubChunk::new(AIR);
        sub.ensure_layers(1);
        assert!(sub.is_empty());
        sub.ensure_layers(2);
        assert!(!sub.is_empty());
    }

    #[test]
    fn test_compact_drops_trailing_air_layers() {
        let mut sub = SubChunk::new(AIR);
        sub.set_block(0, 0, 0, 0, STONE);
        sub.set_block(0, 0, 0, 2, WATER);
        sub.set_block(0, 0, 0, 2, AIR);
        assert_eq!(sub.layers().len(), 3);
        sub.compact();
        assert_eq!(sub.layers().len(), 1);
        assert_eq!(sub.block(0, 0, 0, 0), STONE);
    }

    #[test]
    fn test_compact_keeps_inner_air_layer() {
        let mut sub = SubChunk::new(AIR);
        sub.set_block(2, 2, 2, 1, WATER);
        sub.compact();
        assert_eq!(sub.layers().len(), 2);
        assert_eq!(sub.block(2, 2, 2, 1), WATER);
    }

    #[test]
    fn test_light_channels_are_independent() {
        let mut sub = SubChunk::new(AIR);
        sub.fill_light(LightType::Sky, SharedLight::Full);
        sub.set_block_light(1, 2, 3, 12);
        assert_eq!(sub.sky_light(1, 2, 3), 15);
        assert_eq!(sub.block_light(1, 2, 3), 12);
        assert_eq!(sub.light(LightType::Block, 1, 2, 3), 12);
        assert!(sub.light_storage(LightType::Sky).is_shared());

        sub.reset_light();
        assert_eq!(sub.sky_light(1, 2, 3), 0);
        assert_eq!(sub.block_light(1, 2, 3), 0);
    }
}
