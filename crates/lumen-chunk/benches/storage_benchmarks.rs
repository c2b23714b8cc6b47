use criterion::{Criterion, black_box, criterion_group, criterion_main};
use lumen_chunk::encoding::{encode_network_chunk, encode_sub_chunk};
use lumen_chunk::*;

fn layered_chunk() -> Chunk {
    let mut chunk = Chunk::new(0, WorldRange::OVERWORLD);
    for x in 0..16 {
        for z in 0..16 {
            for y in -64..0 {
                chunk.set_block(x, y, z, 0, 1 + ((x as u32 + y as u32 + z as u32) % 12));
            }
        }
    }
    chunk.compact();
    chunk
}

fn bench_storage_fill(c: &mut Criterion) {
    c.bench_function("storage_fill_4096", |bencher| {
        bencher.iter(|| {
            let mut storage = PalettedStorage::new(0);
            for cell in 0..STORAGE_CELLS {
                let (x, y, z) = ((cell >> 8) as u8, (cell & 15) as u8, ((cell >> 4) & 15) as u8);
                storage.set(x, y, z, black_box((cell % 40) as u32));
            }
            black_box(storage)
        })
    });
}

fn bench_storage_read(c: &mut Criterion) {
    let mut storage = PalettedStorage::new(0);
    for cell in 0..STORAGE_CELLS {
        storage.set((cell >> 8) as u8, (cell & 15) as u8, ((cell >> 4) & 15) as u8, (cell % 9) as u32);
    }
    c.bench_function("storage_read_4096", |bencher| {
        bencher.iter(|| {
            let mut sum = 0u32;
            for x in 0..16 {
                for y in 0..16 {
                    for z in 0..16 {
                        sum = sum.wrapping_add(storage.at(x, y, z));
                    }
                }
            }
            black_box(sum)
        })
    });
}

fn bench_compact(c: &mut Criterion) {
    let mut storage = PalettedStorage::new(0);
    for v in 0..200u32 {
        storage.set(0, 0, 0, v);
    }
    c.bench_function("storage_compact", |bencher| {
        bencher.iter(|| {
            let mut s = storage.clone();
            s.compact();
            black_box(s)
        })
    });
}

fn bench_network_encode(c: &mut Criterion) {
    let chunk = layered_chunk();
    c.bench_function("network_encode_chunk", |bencher| {
        bencher.iter(|| black_box(encode_network_chunk(black_box(&chunk))))
    });
}

fn bench_network_sub_chunk(c: &mut Criterion) {
    let chunk = layered_chunk();
    let sub = &chunk.sub()[0];
    c.bench_function("network_encode_sub_chunk", |bencher| {
        bencher.iter(|| {
            let mut buf = Vec::new();
            let _ = encode_sub_chunk(&NetworkEncoding, &mut buf, sub, 0, chunk.range());
            black_box(buf)
        })
    });
}

criterion_group!(
    benches,
    bench_storage_fill,
    bench_storage_read,
    bench_compact,
    bench_network_encode,
    bench_network_sub_chunk,
);
criterion_main!(benches);
