//! World service binary.
//!
//! Generates a flat spawn region, lights it, saves it into an in-memory chunk
//! database, reads it back, and encodes every chunk for the network.
//! Configuration is loaded from `config.ron` and can be overridden via CLI
//! flags, e.g. `cargo run -p lumen-server -- --dimension nether --spawn-radius 4`.

mod error;
mod world;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use lumen_chunk::encoding::{decode_network_chunk, encode_network_chunk};
use lumen_chunk::{
    BlockRegistry, BlockTable, ChunkKey, ChunkManager, ChunkPos, Column, ColumnStore, MemoryStore,
};
use lumen_config::{CliArgs, Config};
use lumen_lighting::light_all;
use tracing::{info, warn};

use crate::error::ServerError;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config_dir = args
        .config
        .clone()
        .or_else(|| dirs::config_dir().map(|dir| dir.join("lumen")))
        .unwrap_or_else(|| PathBuf::from(".lumen"));

    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    if let Err(e) = config.apply_cli_overrides(&args) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    let log_dir = config_dir.join("logs");
    lumen_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> Result<(), ServerError> {
    config.validate()?;
    let table = world::block_table()?;
    let range = world::world_range(&config.world);
    let dimension = config.world.dimension.id();
    info!(
        dimension = ?config.world.dimension,
        min_y = range.min,
        max_y = range.max,
        blocks = table.len(),
        "starting world service"
    );

    let mut manager = ChunkManager::new();
    let positions = world::generate_spawn(&mut manager, &config.world, &table)?;
    let width = config.lighting.area_width as usize;
    let stats = light_all(&mut manager, width, &table)?;
    info!(
        chunks = positions.len(),
        seeded = stats.seeded,
        visited = stats.visited,
        "lit spawn region"
    );

    let mut store = ColumnStore::new(MemoryStore::new(), range)
        .with_compaction(config.storage.compact_before_save);
    for &pos in &positions {
        let Some(chunk) = manager.unload(pos) else {
            continue;
        };
        let mut column = Column::new(chunk);
        store.save(ChunkKey::new(pos, dimension), &mut column, &table)?;
        manager.load(pos, column.chunk);
    }
    info!(
        records = store.store().len(),
        bytes = store.store().value_bytes(),
        "saved spawn region"
    );

    let mut reloaded = ChunkManager::new();
    for &pos in &positions {
        if let Some(column) = store.load(ChunkKey::new(pos, dimension), &table)? {
            reloaded.load(pos, column.chunk);
        }
    }
    if config.lighting.relight_on_load {
        light_all(&mut reloaded, width, &table)?;
    }

    if config.debug.verify_round_trip {
        verify_disk(&manager, &reloaded, &positions)?;
    }
    encode_region(config, &reloaded, &positions, &table)
}

/// Compares the network payloads of the generated and reloaded chunks.
fn verify_disk(
    generated: &ChunkManager,
    reloaded: &ChunkManager,
    positions: &[ChunkPos],
) -> Result<(), ServerError> {
    for &pos in positions {
        let matches = match (generated.get(pos), reloaded.get(pos)) {
            (Some(a), Some(b)) => encode_network_chunk(a)? == encode_network_chunk(b)?,
            _ => false,
        };
        if !matches {
            return Err(ServerError::RoundTrip {
                x: pos.x,
                z: pos.z,
                stage: "disk",
            });
        }
    }
    info!(chunks = positions.len(), "disk round trip verified");
    Ok(())
}

fn encode_region(
    config: &Config,
    manager: &ChunkManager,
    positions: &[ChunkPos],
    table: &BlockTable,
) -> Result<(), ServerError> {
    let mut sent = 0usize;
    let mut bytes = 0usize;
    for &pos in positions {
        let Some(chunk) = manager.get(pos) else {
            continue;
        };
        let packet = encode_network_chunk(chunk)?;
        if packet.sub_chunk_count > usize::from(config.network.max_sub_chunks) {
            warn!(
                x = pos.x,
                z = pos.z,
                sub_chunks = packet.sub_chunk_count,
                max = config.network.max_sub_chunks,
                "chunk exceeds network sub chunk limit, skipped"
            );
            continue;
        }
        if config.debug.verify_round_trip {
            let decoded = decode_network_chunk(
                &packet.payload,
                packet.sub_chunk_count,
                table.air(),
                chunk.range(),
            )?;
            if encode_network_chunk(&decoded)? != packet {
                return Err(ServerError::RoundTrip {
                    x: pos.x,
                    z: pos.z,
                    stage: "network",
                });
            }
        }
        sent += 1;
        bytes += packet.payload.len();
    }
    info!(chunks = sent, bytes, "encoded network chunks");
    Ok(())
}
