//! Lighting chunks held by a [`ChunkManager`].

use lumen_chunk::{BlockRegistry, ChunkManager, ChunkPos};

use crate::area::{LightArea, LightAreaError};
use crate::engine::{LightStats, fill, spread};

/// Relights the chunk at `pos` and the loaded chunks of the `width × width`
/// area around it.
///
/// Every loaded chunk in the area is filled from scratch before any light
/// crosses a border, so light left behind by a removed emitter cannot flow
/// back in from a neighbour. Each of those chunks then spreads over the area
/// centred on it, which also pulls in light from chunks further out.
pub fn relight(
    manager: &mut ChunkManager,
    pos: ChunkPos,
    width: usize,
    registry: &(impl BlockRegistry + ?Sized),
) -> Result<LightStats, LightAreaError> {
    if width % 2 == 0 {
        return Err(LightAreaError::EvenWidth(width));
    }
    let range = manager
        .get(pos)
        .ok_or(LightAreaError::MissingFocus)?
        .range();
    let radius = (width / 2) as i32;
    let mut affected = Vec::with_capacity(width * width);
    for dz in -radius..=radius {
        for dx in -radius..=radius {
            let p = pos.offset(dx, dz);
            if let Some(chunk) = manager.get(p) {
                // Checked up front so a bad area leaves all light untouched.
                if chunk.range() != range {
                    return Err(LightAreaError::RangeMismatch {
                        expected: range,
                        found: chunk.range(),
                    });
                }
                affected.push(p);
            }
        }
    }

    let mut stats = LightStats::default();
    for &p in &affected {
        if let Some(chunk) = manager.get_mut(p) {
            stats += fill(&mut LightArea::single(chunk), registry);
        }
    }
    for &p in &affected {
        let mut area = LightArea::new(manager.area_mut(p, radius), width)?;
        stats += spread(&mut area, registry);
    }
    tracing::debug!(
        x = pos.x,
        z = pos.z,
        chunks = affected.len(),
        seeded = stats.seeded,
        visited = stats.visited,
        "relit chunk"
    );
    Ok(stats)
}

/// Lights every loaded chunk: each is filled on its own first, then each
/// spreads into its neighbours.
pub fn light_all(
    manager: &mut ChunkManager,
    width: usize,
    registry: &(impl BlockRegistry + ?Sized),
) -> Result<LightStats, LightAreaError> {
    if width % 2 == 0 {
        return Err(LightAreaError::EvenWidth(width));
    }
    let mut positions: Vec<ChunkPos> = manager.iter().map(|(pos, _)| *pos).collect();
    positions.sort();

    let mut stats = LightStats::default();
    for &pos in &positions {
        if let Some(chunk) = manager.get_mut(pos) {
            stats += fill(&mut LightArea::single(chunk), registry);
        }
    }
    let radius = (width / 2) as i32;
    for &pos in &positions {
        let mut area = LightArea::new(manager.area_mut(pos, radius), width)?;
        stats += spread(&mut area, registry);
    }
    tracing::debug!(
        chunks = positions.len(),
        seeded = stats.seeded,
        visited = stats.visited,
        "lit loaded chunks"
    );
    Ok(stats)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
