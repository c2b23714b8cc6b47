//! Breadth-first light propagation over a [`LightArea`].
//!
//! [`fill`] computes the focus chunk's own light from scratch: sky light falls
//! down every column and block light spreads from emitters, both confined to
//! the focus chunk. [`spread`] then lets light cross the focus chunk's four
//! horizontal faces in both directions; it assumes the neighbours have been
//! filled already.
//!
//! Every step into a voxel costs `filter + 1` levels, so after propagation
//! two adjacent voxels `p` and `q` satisfy `light(q) >= light(p) - filter(q) - 1`.

use std::collections::VecDeque;
use std::ops::AddAssign;

use lumen_chunk::{BlockRegistry, Chunk, LightType, MAX_LIGHT, SharedLight};

use crate::area::LightArea;
use crate::node::{LightNode, NEIGHBORS_6, VoxelPos};

/// Counters from one lighting pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LightStats {
    /// Nodes queued before propagation started.
    pub seeded: usize,
    /// Nodes that raised a stored level.
    pub visited: usize,
}

impl AddAssign for LightStats {
    fn add_assign(&mut self, other: Self) {
        self.seeded += other.seeded;
        self.visited += other.visited;
    }
}

/// Recomputes the focus chunk's block and sky light.
pub fn fill(area: &mut LightArea<'_>, registry: &(impl BlockRegistry + ?Sized)) -> LightStats {
    reset_light(area.focus_mut());
    let mut queue = VecDeque::new();
    seed_sky(area, registry, &mut queue);
    seed_block(area, registry, &mut queue);
    let seeded = queue.len();
    let visited = propagate(area, registry, &mut queue, true);
    LightStats { seeded, visited }
}

/// Propagates light across the focus chunk's borders into and out of its
/// resident neighbours.
pub fn spread(area: &mut LightArea<'_>, registry: &(impl BlockRegistry + ?Sized)) -> LightStats {
    let mut queue = VecDeque::new();
    let (ox, oz) = area.focus_origin();
    let range = area.range();
    for i in 0..16 {
        // (inside, outside) column pairs across the west, east, north and south faces.
        let faces = [
            ((ox, oz + i), (ox - 1, oz + i)),
            ((ox + 15, oz + i), (ox + 16, oz + i)),
            ((ox + i, oz), (ox + i, oz - 1)),
            ((ox + i, oz + 15), (ox + i, oz + 16)),
        ];
        for ((px, pz), (qx, qz)) in faces {
            if !area.is_resident(VoxelPos::new(qx, i32::from(range.min), qz)) {
                continue;
            }
            for y in i32::from(range.min)..=i32::from(range.max) {
                let p = VoxelPos::new(px, y, pz);
                let q = VoxelPos::new(qx, y, qz);
                for kind in [LightType::Block, LightType::Sky] {
                    seed_edge(area, registry, &mut queue, p, q, kind);
                    seed_edge(area, registry, &mut queue, q, p, kind);
                }
            }
        }
    }
    let seeded = queue.len();
    let visited = propagate(area, registry, &mut queue, false);
    LightStats { seeded, visited }
}

/// Top sub chunks above the highest block see the open sky; everything else
/// starts dark.
fn reset_light(chunk: &mut Chunk) {
    let open_from = chunk.highest_sub_chunk().map_or(0, |i| i + 1);
    for (index, sub) in chunk.sub_mut().iter_mut().enumerate() {
        sub.fill_light(LightType::Block, SharedLight::Dark);
        let sky = if index >= open_from {
            SharedLight::Full
        } else {
            SharedLight::Dark
        };
        sub.fill_light(LightType::Sky, sky);
    }
}

/// Lowest Y of the open span at the top of a column: one above the first
/// filtering voxel found walking down from `top`, or the world minimum.
fn open_bottom(
    area: &LightArea<'_>,
    registry: &(impl BlockRegistry + ?Sized),
    x: i32,
    z: i32,
    top: i32,
    min: i32,
) -> i32 {
    (min..=top)
        .rev()
        .find(|&y| area.filter(VoxelPos::new(x, y, z), registry) > 0)
        .map_or(min, |y| y + 1)
}

fn seed_sky(
    area: &mut LightArea<'_>,
    registry: &(impl BlockRegistry + ?Sized),
    queue: &mut VecDeque<LightNode>,
) {
    let top = {
        let chunk = area.focus();
        match chunk.highest_sub_chunk() {
            Some(index) => chunk.sub_y(index) + 15,
            // Every sub chunk is already fully lit.
            None => return,
        }
    };
    let (ox, oz) = area.focus_origin();
    let min = i32::from(area.range().min);

    let mut bottom = [[min; 16]; 16];
    for (x, row) in bottom.iter_mut().enumerate() {
        for (z, b) in row.iter_mut().enumerate() {
            *b = open_bottom(area, registry, ox + x as i32, oz + z as i32, top, min);
        }
    }

    for x in 0..16usize {
        for z in 0..16usize {
            let b = bottom[x][z];
            let mut highest_neighbour = i32::MIN;
            if x > 0 {
                highest_neighbour = highest_neighbour.max(bottom[x - 1][z]);
            }
            if x < 15 {
                highest_neighbour = highest_neighbour.max(bottom[x + 1][z]);
            }
            if z > 0 {
                highest_neighbour = highest_neighbour.max(bottom[x][z - 1]);
            }
            if z < 15 {
                highest_neighbour = highest_neighbour.max(bottom[x][z + 1]);
            }
            // Voxels an open neighbour column cannot reach by itself need nodes.
            let span_top = b.max(highest_neighbour - 1);
            let pos = |y| VoxelPos::new(ox + x as i32, y, oz + z as i32);

            if b > top {
                // The column is closed right at `top`; light enters from the
                // lit sub chunk above.
                let level = MAX_LIGHT.saturating_sub(area.filter(pos(top), registry) + 1);
                if level > 0 {
                    queue.push_back(LightNode::new(pos(top), LightType::Sky, level));
                }
            }
            for y in b..=span_top.min(top) {
                queue.push_back(LightNode::new(pos(y), LightType::Sky, MAX_LIGHT));
            }
            for y in (span_top + 1)..=top {
                area.set_light(pos(y), LightType::Sky, MAX_LIGHT);
            }
        }
    }
}

fn seed_block(
    area: &LightArea<'_>,
    registry: &(impl BlockRegistry + ?Sized),
    queue: &mut VecDeque<LightNode>,
) {
    let (ox, oz) = area.focus_origin();
    let chunk = area.focus();
    for (index, sub) in chunk.sub().iter().enumerate() {
        if sub.is_empty() {
            continue;
        }
        let base_y = chunk.sub_y(index);
        for storage in sub.layers() {
            let emits = storage
                .palette()
                .values()
                .iter()
                .any(|&rid| registry.light_emission(rid) > 0);
            if !emits {
                continue;
            }
            for x in 0..16u8 {
                for y in 0..16u8 {
                    for z in 0..16u8 {
                        let level = registry.light_emission(storage.at(x, y, z)).min(MAX_LIGHT);
                        if level > 0 {
                            let pos = VoxelPos::new(
                                ox + i32::from(x),
                                base_y + i32::from(y),
                                oz + i32::from(z),
                            );
                            queue.push_back(LightNode::new(pos, LightType::Block, level));
                        }
                    }
                }
            }
        }
    }
}

fn seed_edge(
    area: &LightArea<'_>,
    registry: &(impl BlockRegistry + ?Sized),
    queue: &mut VecDeque<LightNode>,
    from: VoxelPos,
    to: VoxelPos,
    kind: LightType,
) {
    let source = area.light(from, kind);
    if source == 0 {
        return;
    }
    if let Some(level) = source.checked_sub(area.filter(to, registry) + 1) {
        if level > area.light(to, kind) {
            queue.push_back(LightNode::new(to, kind, level));
        }
    }
}

/// Drains `queue`, returning how many nodes raised a stored level.
fn propagate(
    area: &mut LightArea<'_>,
    registry: &(impl BlockRegistry + ?Sized),
    queue: &mut VecDeque<LightNode>,
    focus_only: bool,
) -> usize {
    let mut visited = 0;
    while let Some(node) = queue.pop_front() {
        if area.light(node.pos, node.kind) >= node.level {
            continue;
        }
        area.set_light(node.pos, node.kind, node.level);
        visited += 1;

        for offset in NEIGHBORS_6 {
            let next = node.pos.offset(offset);
            let inside = if focus_only {
                area.in_focus(next)
            } else {
                area.is_resident(next)
            };
            if !inside {
                continue;
            }
            let Some(level) = node.level.checked_sub(area.filter(next, registry) + 1) else {
                continue;
            };
            if level > area.light(next, node.kind) {
                queue.push_back(LightNode::new(next, node.kind, level));
            }
        }
    }
    visited
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_chunk::{BlockDef, BlockState, BlockTable, WorldRange};
    use std::ops::{Range, RangeInclusive};

    struct Blocks {
        table: BlockTable,
        stone: u32,
        glass: u32,
        water: u32,
        torch: u32,
    }

    fn blocks() -> Blocks {
        let mut table = BlockTable::new();
        let stone = table
            .register(BlockDef::opaque(BlockState::new("minecraft:stone")))
            .unwrap();
        let glass = table
            .register(BlockDef::transparent(BlockState::new("minecraft:glass")))
            .unwrap();
        let water = table
            .register(BlockDef {
                state: BlockState::new("minecraft:water"),
                emission: 0,
                filter: 2,
            })
            .unwrap();
        let torch = table
            .register(BlockDef {
                state: BlockState::new("minecraft:torch"),
                emission: 14,
                filter: 0,
            })
            .unwrap();
        Blocks {
            table,
            stone,
            glass,
            water,
            torch,
        }
    }

    fn torch_on_floor(b: &Blocks) -> Chunk {
        let mut chunk = Chunk::new(0, WorldRange::END);
        for x in 0..16 {
            for z in 0..16 {
                for y in 8..=10 {
                    chunk.set_block(x, y, z, 0, b.stone);
                }
            }
        }
        chunk.set_block(8, 11, 8, 0, b.torch);
        chunk
    }

    /// Fills pseudo-random blocks into the lower part of a chunk.
    fn scrambled(b: &Blocks, seed: u32) -> Chunk {
        let mut chunk = Chunk::new(0, WorldRange::OVERWORLD);
        let mut state = seed;
        let palette = [0, 0, 0, b.stone, b.stone, b.glass, b.water, b.torch];
        for x in 0..16 {
            for z in 0..16 {
                for y in 0..48 {
                    state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                    let block = palette[((state >> 16) % palette.len() as u32) as usize];
                    chunk.set_block(x, y, z, 0, block);
                }
            }
        }
        chunk
    }

    fn assert_decay_bound(
        area: &LightArea<'_>,
        table: &BlockTable,
        x: Range<i32>,
        z: Range<i32>,
        y: RangeInclusive<i32>,
    ) {
        for px in x.clone() {
            for pz in z.clone() {
                for py in y.clone() {
                    let p = VoxelPos::new(px, py, pz);
                    for kind in [LightType::Block, LightType::Sky] {
                        let lp = area.light(p, kind);
                        assert!(lp <= MAX_LIGHT);
                        for offset in NEIGHBORS_6 {
                            let q = p.offset(offset);
                            if !area.is_resident(q) {
                                continue;
                            }
                            let lq = area.light(q, kind);
                            let fq = area.filter(q, table);
                            assert!(
                                u32::from(lq) + u32::from(fq) + 1 >= u32::from(lp),
                                "{kind:?} {p:?}={lp} -> {q:?}={lq} (filter {fq})"
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_empty_chunk_is_fully_sky_lit() {
        let b = blocks();
        let mut chunk = Chunk::new(0, WorldRange::OVERWORLD);
        let stats = fill(&mut LightArea::single(&mut chunk), &b.table);
        assert_eq!(stats.visited, 0);
        assert_eq!(chunk.sky_light(3, -64, 3), 15);
        assert_eq!(chunk.sky_light(3, 319, 3), 15);
        assert_eq!(chunk.block_light(3, 0, 3), 0);
        assert!(chunk.sub().iter().all(|s| s.light_storage(LightType::Sky).is_shared()));
    }

    #[test]
    fn test_torch_on_stone_floor() {
        let b = blocks();
        let mut chunk = torch_on_floor(&b);
        fill(&mut LightArea::single(&mut chunk), &b.table);

        assert_eq!(chunk.block_light(8, 11, 8), 14);
        for (x, y, z) in [(7, 11, 8), (9, 11, 8), (8, 12, 8), (8, 11, 7), (8, 11, 9)] {
            assert_eq!(chunk.block_light(x, y, z), 13, "({x}, {y}, {z})");
        }
        assert_eq!(chunk.block_light(8, 13, 8), 12);
        assert_eq!(chunk.block_light(8, 10, 8), 0);
        for y in 0..8 {
            assert_eq!(chunk.block_light(8, y, 8), 0);
            assert_eq!(chunk.sky_light(8, y, 8), 0);
        }
        assert_eq!(chunk.sky_light(8, 11, 8), 15);
        assert_eq!(chunk.sky_light(0, 200, 0), 15);
    }

    #[test]
    fn test_light_leaks_under_partial_roof() {
        let b = blocks();
        let mut chunk = Chunk::new(0, WorldRange::OVERWORLD);
        for x in 0..8 {
            for z in 0..16 {
                chunk.set_block(x, 100, z, 0, b.stone);
            }
        }
        fill(&mut LightArea::single(&mut chunk), &b.table);
        assert_eq!(chunk.sky_light(8, 50, 8), 15);
        assert_eq!(chunk.sky_light(7, 50, 8), 14);
        assert_eq!(chunk.sky_light(4, 50, 8), 11);
        assert_eq!(chunk.sky_light(0, 50, 8), 7);
        assert_eq!(chunk.sky_light(0, 101, 8), 15);
        assert_eq!(chunk.sky_light(0, 100, 8), 0);
    }

    #[test]
    fn test_water_filters_sky_light() {
        let b = blocks();
        let mut chunk = Chunk::new(0, WorldRange::END);
        for x in 0..16 {
            for z in 0..16 {
                chunk.set_block(x, 0, z, 0, b.stone);
                for y in 1..=4 {
                    chunk.set_block(x, y, z, 0, b.water);
                }
            }
        }
        fill(&mut LightArea::single(&mut chunk), &b.table);
        assert_eq!(chunk.sky_light(5, 5, 5), 15);
        assert_eq!(chunk.sky_light(5, 4, 5), 12);
        assert_eq!(chunk.sky_light(5, 3, 5), 9);
        assert_eq!(chunk.sky_light(5, 1, 5), 3);
        assert_eq!(chunk.sky_light(5, 0, 5), 0);
    }

    #[test]
    fn test_roof_on_top_layer_blocks_sky() {
        let b = blocks();
        let mut chunk = Chunk::new(0, WorldRange::NETHER);
        for x in 0..16 {
            for z in 0..16 {
                chunk.set_block(x, 127, z, 0, b.stone);
            }
        }
        chunk.set_block(8, 126, 8, 0, b.glass);
        fill(&mut LightArea::single(&mut chunk), &b.table);
        assert_eq!(chunk.sky_light(8, 126, 8), 0);
        assert_eq!(chunk.sky_light(8, 128, 8), 15);
    }

    #[test]
    fn test_levels_respect_decay_bound() {
        let b = blocks();
        for seed in [1, 7, 42] {
            let mut chunk = scrambled(&b, seed);
            let mut area = LightArea::single(&mut chunk);
            fill(&mut area, &b.table);
            assert_decay_bound(&area, &b.table, 0..16, 0..16, -4..=60);
        }
    }

    #[test]
    fn test_spread_crosses_chunk_border() {
        let b = blocks();
        let mut west = torch_on_floor(&b);
        west.set_block(8, 11, 8, 0, 0);
        let mut focus = torch_on_floor(&b);
        focus.set_block(8, 11, 8, 0, 0);
        focus.set_block(1, 11, 8, 0, b.torch);

        fill(&mut LightArea::single(&mut west), &b.table);
        fill(&mut LightArea::single(&mut focus), &b.table);
        assert_eq!(west.block_light(15, 11, 8), 0);

        let mut slots: Vec<Option<&mut Chunk>> = (0..9).map(|_| None).collect();
        slots[4] = Some(&mut focus);
        slots[3] = Some(&mut west);
        let mut area = LightArea::new(slots, 3).unwrap();
        let stats = spread(&mut area, &b.table);
        assert!(stats.seeded > 0);
        assert_decay_bound(&area, &b.table, 0..48, 0..48, 8..=20);
        drop(area);

        // Torch at focus x = 1 is two steps from west x = 15.
        assert_eq!(west.block_light(15, 11, 8), 12);
        assert_eq!(west.block_light(14, 11, 8), 11);
        assert_eq!(west.sky_light(15, 11, 8), 15);
    }

    #[test]
    fn test_spread_without_neighbours_is_noop() {
        let b = blocks();
        let mut chunk = torch_on_floor(&b);
        let mut area = LightArea::single(&mut chunk);
        fill(&mut area, &b.table);
        assert_eq!(spread(&mut area, &b.table), LightStats::default());
    }

    #[test]
    fn test_fill_resets_previous_light() {
        let b = blocks();
        let mut chunk = torch_on_floor(&b);
        fill(&mut LightArea::single(&mut chunk), &b.table);
        chunk.set_block(8, 11, 8, 0, 0);
        fill(&mut LightArea::single(&mut chunk), &b.table);
        assert_eq!(chunk.block_light(8, 11, 8), 0);
        assert_eq!(chunk.block_light(9, 11, 8), 0);
    }
}
