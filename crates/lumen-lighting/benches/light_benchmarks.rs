use criterion::{Criterion, black_box, criterion_group, criterion_main};
use lumen_chunk::{BlockDef, BlockState, BlockTable, Chunk, ChunkManager, ChunkPos, WorldRange};
use lumen_lighting::{LightArea, fill, light_all};

fn blocks() -> (BlockTable, u32, u32) {
    let mut table = BlockTable::new();
    let stone = table
        .register(BlockDef::opaque(BlockState::new("minecraft:stone")))
        .unwrap();
    let torch = table
        .register(BlockDef {
            state: BlockState::new("minecraft:torch"),
            emission: 14,
            filter: 0,
        })
        .unwrap();
    (table, stone, torch)
}

fn terrain(stone: u32, torch: u32) -> Chunk {
    let mut chunk = Chunk::new(0, WorldRange::OVERWORLD);
    for x in 0..16u8 {
        for z in 0..16u8 {
            let height = 40 + i32::from((x ^ z) & 7);
            for y in -64..height {
                chunk.set_block(x, y, z, 0, stone);
            }
        }
    }
    chunk.set_block(4, 50, 4, 0, torch);
    chunk.set_block(11, 50, 11, 0, torch);
    chunk
}

fn bench_fill_chunk(c: &mut Criterion) {
    let (table, stone, torch) = blocks();
    let template = terrain(stone, torch);
    c.bench_function("fill_terrain_chunk", |bencher| {
        bencher.iter(|| {
            let mut chunk = template.clone();
            black_box(fill(&mut LightArea::single(&mut chunk), &table))
        })
    });
}

fn bench_light_all_3x3(c: &mut Criterion) {
    let (table, stone, torch) = blocks();
    let template = terrain(stone, torch);
    c.bench_function("light_all_3x3", |bencher| {
        bencher.iter(|| {
            let mut manager = ChunkManager::new();
            for x in -1..=1 {
                for z in -1..=1 {
                    manager.load(ChunkPos::new(x, z), template.clone());
                }
            }
            black_box(light_all(&mut manager, 3, &table).unwrap())
        })
    });
}

criterion_group!(benches, bench_fill_chunk, bench_light_all_3x3);
criterion_main!(benches);
