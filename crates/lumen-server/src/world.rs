//! Block palette and flat terrain for the spawn region.

use lumen_chunk::{
    BlockDef, BlockRegistry, BlockState, BlockTable, Chunk, ChunkManager, ChunkPos, WorldRange,
};
use lumen_config::WorldConfig;

use crate::error::ServerError;

/// Vanilla-named blocks the service knows about, with their light values.
const BLOCKS: &[(&str, u8, u8)] = &[
    ("minecraft:stone", 0, 15),
    ("minecraft:bedrock", 0, 15),
    ("minecraft:dirt", 0, 15),
    ("minecraft:grass", 0, 15),
    ("minecraft:sand", 0, 15),
    ("minecraft:glass", 0, 0),
    ("minecraft:leaves", 0, 1),
    ("minecraft:water", 0, 2),
    ("minecraft:torch", 14, 0),
    ("minecraft:glowstone", 15, 15),
];

pub fn block_table() -> Result<BlockTable, ServerError> {
    let mut table = BlockTable::new();
    for &(name, emission, filter) in BLOCKS {
        table.register(BlockDef {
            state: BlockState::new(name),
            emission,
            filter,
        })?;
    }
    Ok(table)
}

/// World height from the config.
pub fn world_range(world: &WorldConfig) -> WorldRange {
    WorldRange::new(world.min_y, world.max_y)
}

/// Builds one flat chunk: the configured bands from `min_y` up, with a torch
/// on the surface in the middle of the chunk.
pub fn flat_chunk(world: &WorldConfig, table: &BlockTable) -> Result<Chunk, ServerError> {
    let range = world_range(world);
    let mut chunk = Chunk::new(table.air(), range);
    let mut y = i32::from(range.min);
    for layer in &world.flat_layers {
        let rid = table
            .lookup_by_name(&layer.block)
            .ok_or_else(|| ServerError::UnknownBlock(layer.block.clone()))?;
        for _ in 0..layer.thickness {
            for x in 0..16 {
                for z in 0..16 {
                    chunk.set_block(x, y, z, 0, rid);
                }
            }
            y += 1;
        }
    }
    if let Some(torch) = table.lookup_by_name("minecraft:torch")
        && range.contains(y)
    {
        chunk.set_block(8, y, 8, 0, torch);
    }
    Ok(chunk)
}

/// Loads a flat chunk at every position within `spawn_radius` of the origin.
pub fn generate_spawn(
    manager: &mut ChunkManager,
    world: &WorldConfig,
    table: &BlockTable,
) -> Result<Vec<ChunkPos>, ServerError> {
    let template = flat_chunk(world, table)?;
    let radius = world.spawn_radius as i32;
    let mut positions = Vec::new();
    for z in -radius..=radius {
        for x in -radius..=radius {
            let pos = ChunkPos::new(x, z);
            manager.load(pos, template.clone());
            positions.push(pos);
        }
    }
    Ok(positions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_config::FlatLayer;

    #[test]
    fn test_flat_chunk_layers() {
        let table = block_table().unwrap();
        let world = WorldConfig::default();
        let chunk = flat_chunk(&world, &table).unwrap();
        let bedrock = table.lookup_by_name("minecraft:bedrock").unwrap();
        let grass = table.lookup_by_name("minecraft:grass").unwrap();
        let torch = table.lookup_by_name("minecraft:torch").unwrap();
        assert_eq!(chunk.block(0, -64, 0, 0), bedrock);
        assert_eq!(chunk.block(3, -61, 9, 0), grass);
        assert_eq!(chunk.block(8, -60, 8, 0), torch);
        assert_eq!(chunk.block(0, -60, 0, 0), table.air());
        assert_eq!(chunk.highest_sub_chunk(), Some(0));
    }

    #[test]
    fn test_unknown_layer_block_fails() {
        let table = block_table().unwrap();
        let world = WorldConfig {
            flat_layers: vec![FlatLayer::new("minecraft:cheese", 1)],
            ..WorldConfig::default()
        };
        assert!(matches!(
            flat_chunk(&world, &table),
            Err(ServerError::UnknownBlock(name)) if name == "minecraft:cheese"
        ));
    }

    #[test]
    fn test_generate_spawn_square() {
        let table = block_table().unwrap();
        let world = WorldConfig {
            spawn_radius: 1,
            ..WorldConfig::default()
        };
        let mut manager = ChunkManager::new();
        let positions = generate_spawn(&mut manager, &world, &table).unwrap();
        assert_eq!(positions.len(), 9);
        assert_eq!(manager.loaded_count(), 9);
        assert!(manager.get(ChunkPos::new(-1, 1)).is_some());
    }
}
