//! Chunk records in a Bedrock-layout key-value store.
//!
//! Every chunk is spread over several keys that share a prefix:
//!
//! ```text
//! x (i32 LE) | z (i32 LE) | [dimension (i32 LE), if not the overworld] | tag [| sub chunk Y]
//! ```
//!
//! The store itself is a collaborator behind [`ChunkStore`]; [`MemoryStore`]
//! keeps everything in a hash map.

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::chunk::{Chunk, WorldRange};
use crate::chunk_manager::ChunkPos;
use crate::encoding::{
    DecodeError, DiskEncoding, EncodeError, decode_biomes, decode_sub_chunk, encode_biomes,
    encode_sub_chunk,
};
use crate::nbt::{self, Compound, NbtError};
use crate::registry::BlockRegistry;
use crate::sub_chunk::SubChunk;

/// Chunk format version stored under [`TAG_VERSION`].
pub const CHUNK_VERSION: u8 = 40;

pub const TAG_DATA_3D: u8 = 0x2b;
pub const TAG_VERSION: u8 = 0x2c;
pub const TAG_SUB_CHUNK: u8 = 0x2f;
pub const TAG_BLOCK_ENTITY: u8 = 0x31;
pub const TAG_ENTITY: u8 = 0x32;
pub const TAG_FINALISATION: u8 = 0x36;

/// Bytes of height map in front of the biome storages in a Data3D record.
const HEIGHT_MAP_BYTES: usize = 512;

/// Errors raised while loading or saving columns.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key-value backend failed.
    #[error("store backend: {0}")]
    Backend(String),
    #[error("decoding chunk record: {0}")]
    Decode(#[from] DecodeError),
    #[error("encoding chunk record: {0}")]
    Encode(#[from] EncodeError),
    /// Block entity or entity records are not valid NBT.
    #[error("entity record: {0}")]
    Nbt(#[from] NbtError),
}

/// A byte-keyed store holding chunk records.
pub trait ChunkStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;
    fn delete(&mut self, key: &[u8]) -> Result<(), StoreError>;
}

/// In-memory [`ChunkStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: FxHashMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total bytes across all stored values.
    pub fn value_bytes(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

impl ChunkStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.entries.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Position and dimension of a chunk record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkKey {
    pub pos: ChunkPos,
    /// 0 overworld, 1 nether, 2 end.
    pub dimension: i32,
}

impl ChunkKey {
    pub fn new(pos: ChunkPos, dimension: i32) -> Self {
        Self { pos, dimension }
    }

    /// Key of the record with type `tag`.
    pub fn key(&self, tag: u8) -> Vec<u8> {
        let mut key = Vec::with_capacity(14);
        key.extend_from_slice(&self.pos.x.to_le_bytes());
        key.extend_from_slice(&self.pos.z.to_le_bytes());
        if self.dimension != 0 {
            key.extend_from_slice(&self.dimension.to_le_bytes());
        }
        key.push(tag);
        key
    }

    /// Key of the sub chunk with Y index `y_index`.
    pub fn sub_chunk_key(&self, y_index: i8) -> Vec<u8> {
        let mut key = self.key(TAG_SUB_CHUNK);
        key.push(y_index as u8);
        key
    }
}

/// Generation progress of a stored chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Finalisation {
    NeedsInstaticking,
    NeedsPopulation,
    Finalised,
}

impl Finalisation {
    pub fn to_i32(self) -> i32 {
        match self {
            Finalisation::NeedsInstaticking => 0,
            Finalisation::NeedsPopulation => 1,
            Finalisation::Finalised => 2,
        }
    }

    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Finalisation::NeedsInstaticking),
            1 => Some(Finalisation::NeedsPopulation),
            2 => Some(Finalisation::Finalised),
            _ => None,
        }
    }
}

/// Everything stored for one chunk position.
#[derive(Clone, Debug)]
pub struct Column {
    pub chunk: Chunk,
    pub block_entities: Vec<Compound>,
    pub entities: Vec<Compound>,
    pub finalisation: Finalisation,
}

impl Column {
    /// A finalised column with no entities.
    pub fn new(chunk: Chunk) -> Self {
        Self {
            chunk,
            block_entities: Vec::new(),
            entities: Vec::new(),
            finalisation: Finalisation::Finalised,
        }
    }
}

/// Loads and saves [`Column`]s through a [`ChunkStore`].
pub struct ColumnStore<S: ChunkStore> {
    store: S,
    range: WorldRange,
    compact_before_save: bool,
}

impl<S: ChunkStore> ColumnStore<S> {
    pub fn new(store: S, range: WorldRange) -> Self {
        Self {
            store,
            range,
            compact_before_save: true,
        }
    }

    /// Whether [`save`](Self::save) compacts the chunk before encoding.
    pub fn with_compaction(mut self, compact_before_save: bool) -> Self {
        self.compact_before_save = compact_before_save;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    fn y_index(&self, index: usize) -> i8 {
        (index as i32 + (i32::from(self.range.min) >> 4)) as i8
    }

    /// Loads the column at `key`, or `Ok(None)` if no chunk exists there.
    pub fn load(
        &self,
        key: ChunkKey,
        registry: &(impl BlockRegistry + ?Sized),
    ) -> Result<Option<Column>, StoreError> {
        if self.store.get(&key.key(TAG_VERSION))?.is_none() {
            return Ok(None);
        }
        let encoding = DiskEncoding::new(registry);
        let air = registry.air();
        let count = self.range.sub_chunk_count();

        let mut sub = Vec::with_capacity(count);
        for index in 0..count {
            let bytes = self.store.get(&key.sub_chunk_key(self.y_index(index)))?;
            let decoded = match bytes {
                Some(bytes) => decode_sub_chunk(&encoding, &mut Cursor::new(bytes.as_slice()), air)?.sub,
                None => SubChunk::new(air),
            };
            sub.push(decoded);
        }

        let biomes = match self.store.get(&key.key(TAG_DATA_3D))? {
            Some(bytes) if bytes.len() >= HEIGHT_MAP_BYTES => {
                let mut cursor = Cursor::new(&bytes[HEIGHT_MAP_BYTES..]);
                decode_biomes(&encoding, &mut cursor, count)?
            }
            Some(bytes) => {
                tracing::warn!(len = bytes.len(), "short Data3D record, using default biomes");
                decode_biomes(&encoding, &mut Cursor::new(&[][..]), count)?
            }
            None => decode_biomes(&encoding, &mut Cursor::new(&[][..]), count)?,
        };

        let block_entities = match self.store.get(&key.key(TAG_BLOCK_ENTITY))? {
            Some(bytes) => nbt::read_compounds(&bytes)?,
            None => Vec::new(),
        };
        let entities = match self.store.get(&key.key(TAG_ENTITY))? {
            Some(bytes) => nbt::read_compounds(&bytes)?,
            None => Vec::new(),
        };
        let finalisation = match self.store.get(&key.key(TAG_FINALISATION))? {
            Some(bytes) => {
                let value = Cursor::new(bytes.as_slice())
                    .read_i32::<LittleEndian>()
                    .map_err(DecodeError::from)?;
                Finalisation::from_i32(value).unwrap_or_else(|| {
                    tracing::warn!(value, "unknown finalisation state, treating as finalised");
                    Finalisation::Finalised
                })
            }
            None => Finalisation::Finalised,
        };

        Ok(Some(Column {
            chunk: Chunk::from_parts(air, self.range, sub, biomes),
            block_entities,
            entities,
            finalisation,
        }))
    }

    /// Writes every record of `column` under `key`.
    ///
    /// Empty sub chunks and empty entity lists delete their keys so stale
    /// records from an earlier save do not survive.
    pub fn save(
        &mut self,
        key: ChunkKey,
        column: &mut Column,
        registry: &(impl BlockRegistry + ?Sized),
    ) -> Result<(), StoreError> {
        if self.compact_before_save {
            column.chunk.compact();
        }
        let encoding = DiskEncoding::new(registry);
        let chunk = &column.chunk;

        // Everything is encoded before the first write, so a failed encode
        // leaves the previously saved column intact.
        let mut batch: Vec<(Vec<u8>, Option<Vec<u8>>)> = Vec::new();
        batch.push((key.key(TAG_VERSION), Some(vec![CHUNK_VERSION])));

        for (index, sub) in chunk.sub().iter().enumerate() {
            let sub_key = key.sub_chunk_key(self.y_index(index));
            if sub.is_empty() {
                batch.push((sub_key, None));
                continue;
            }
            let mut buf = Vec::new();
            encode_sub_chunk(&encoding, &mut buf, sub, index, chunk.range())?;
            batch.push((sub_key, Some(buf)));
        }

        let mut data = Vec::with_capacity(HEIGHT_MAP_BYTES);
        let min = i32::from(chunk.range().min);
        for x in 0..16 {
            for z in 0..16 {
                let height = chunk.highest_light_blocker(x, z, registry) - min;
                data.extend_from_slice(&(height as i16).to_le_bytes());
            }
        }
        encode_biomes(&encoding, &mut data, chunk.biomes())?;
        batch.push((key.key(TAG_DATA_3D), Some(data)));

        batch.push((key.key(TAG_BLOCK_ENTITY), encode_compounds(&column.block_entities)?));
        batch.push((key.key(TAG_ENTITY), encode_compounds(&column.entities)?));
        batch.push((
            key.key(TAG_FINALISATION),
            Some(column.finalisation.to_i32().to_le_bytes().to_vec()),
        ));

        for (record, value) in batch {
            match value {
                Some(value) => self.store.put(&record, &value)?,
                None => self.store.delete(&record)?,
            }
        }
        Ok(())
    }

    /// Removes every record of the column at `key`.
    pub fn delete(&mut self, key: ChunkKey) -> Result<(), StoreError> {
        for tag in [
            TAG_VERSION,
            TAG_DATA_3D,
            TAG_BLOCK_ENTITY,
            TAG_ENTITY,
            TAG_FINALISATION,
        ] {
            self.store.delete(&key.key(tag))?;
        }
        for index in 0..self.range.sub_chunk_count() {
            self.store.delete(&key.sub_chunk_key(self.y_index(index)))?;
        }
        Ok(())
    }
}

/// Concatenated NBT for a compound list, or `None` when the record should
/// be removed.
fn encode_compounds(compounds: &[Compound]) -> Result<Option<Vec<u8>>, StoreError> {
    if compounds.is_empty() {
        return Ok(None);
    }
    let mut buf = Vec::new();
    for compound in compounds {
        nbt::write_compound(&mut buf, "", compound)?;
    }
    Ok(Some(buf))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nbt::Tag;
    use crate::registry::{BlockDef, BlockState, BlockTable};

    fn table() -> (BlockTable, u32, u32) {
        let mut table = BlockTable::new();
        let stone = table
            .register(BlockDef::opaque(BlockState::new("minecraft:stone")))
            .unwrap();
        let water = table
            .register(BlockDef {
                state: BlockState::new("minecraft:water"),
                emission: 0,
                filter: 2,
            })
            .unwrap();
        (table, stone, water)
    }

    #[test]
    fn test_key_layout() {
        let overworld = ChunkKey::new(ChunkPos::new(1, -1), 0);
        assert_eq!(overworld.key(TAG_VERSION), [1, 0, 0, 0, 0xff, 0xff, 0xff, 0xff, 0x2c]);
        let nether = ChunkKey::new(ChunkPos::new(1, -1), 1);
        assert_eq!(
            nether.sub_chunk_key(-4),
            [1, 0, 0, 0, 0xff, 0xff, 0xff, 0xff, 1, 0, 0, 0, 0x2f, 0xfc]
        );
    }

    #[test]
    fn test_missing_version_means_no_chunk() {
        let (table, _, _) = table();
        let store = ColumnStore::new(MemoryStore::new(), WorldRange::OVERWORLD);
        let key = ChunkKey::new(ChunkPos::new(0, 0), 0);
        assert!(store.load(key, &table).unwrap().is_none());
    }

    #[test]
    fn test_column_round_trip() {
        let (table, stone, water) = table();
        let mut chunk = Chunk::new(0, WorldRange::OVERWORLD);
        for x in 0..16 {
            for z in 0..16 {
                chunk.set_block(x, -64, z, 0, stone);
                chunk.set_biome(x, 0, z, 4);
            }
        }
        chunk.set_block(3, 100, 3, 0, stone);
        chunk.set_block(3, 100, 3, 1, water);
        let mut column = Column::new(chunk);
        let mut sign = Compound::new();
        sign.insert("id".into(), Tag::String("Sign".into()));
        column.block_entities.push(sign.clone());
        column.finalisation = Finalisation::NeedsPopulation;

        let mut store = ColumnStore::new(MemoryStore::new(), WorldRange::OVERWORLD);
        let key = ChunkKey::new(ChunkPos::new(-3, 8), 0);
        store.save(key, &mut column, &table).unwrap();
        // Version, two sub chunks, Data3D, block entities, finalisation.
        assert_eq!(store.store().len(), 6);

        let loaded = store.load(key, &table).unwrap().expect("saved");
        assert_eq!(loaded.finalisation, Finalisation::NeedsPopulation);
        assert_eq!(loaded.block_entities, vec![sign]);
        assert!(loaded.entities.is_empty());
        for (a, b) in column.chunk.sub().iter().zip(loaded.chunk.sub()) {
            assert_eq!(a.layers(), b.layers());
        }
        assert_eq!(loaded.chunk.biomes(), column.chunk.biomes());
        assert_eq!(loaded.chunk.block(3, 100, 3, 1), water);
    }

    #[test]
    fn test_save_deletes_emptied_sub_chunks() {
        let (table, stone, _) = table();
        let mut chunk = Chunk::new(0, WorldRange::OVERWORLD);
        chunk.set_block(0, 50, 0, 0, stone);
        let mut column = Column::new(chunk);
        let mut store = ColumnStore::new(MemoryStore::new(), WorldRange::OVERWORLD);
        let key = ChunkKey::new(ChunkPos::new(0, 0), 0);
        store.save(key, &mut column, &table).unwrap();
        let sub_key = key.sub_chunk_key(3);
        assert!(store.store().get(&sub_key).unwrap().is_some());

        column.chunk.set_block(0, 50, 0, 0, 0);
        store.save(key, &mut column, &table).unwrap();
        assert!(store.store().get(&sub_key).unwrap().is_none());
    }

    #[test]
    fn test_failed_save_keeps_previous_records() {
        let (table, stone, water) = table();
        let mut chunk = Chunk::new(0, WorldRange::OVERWORLD);
        chunk.set_block(2, -64, 2, 0, stone);
        chunk.set_block(2, 100, 2, 0, stone);
        let mut column = Column::new(chunk);
        let mut store = ColumnStore::new(MemoryStore::new(), WorldRange::OVERWORLD);
        let key = ChunkKey::new(ChunkPos::new(4, 4), 0);
        store.save(key, &mut column, &table).unwrap();
        let before = store.store().value_bytes();

        // The lower sub chunk encodes fine, the upper one cannot.
        column.chunk.set_block(2, -64, 2, 0, water);
        column.chunk.set_block(2, 100, 2, 0, 999);
        assert!(matches!(
            store.save(key, &mut column, &table),
            Err(StoreError::Encode(EncodeError::UnknownRuntimeId(999)))
        ));
        assert_eq!(store.store().value_bytes(), before);

        let loaded = store.load(key, &table).unwrap().expect("saved");
        assert_eq!(loaded.chunk.block(2, -64, 2, 0), stone);
        assert_eq!(loaded.chunk.block(2, 100, 2, 0), stone);
    }

    #[test]
    fn test_delete_removes_everything() {
        let (table, stone, _) = table();
        let mut chunk = Chunk::new(0, WorldRange::NETHER);
        chunk.set_block(0, 0, 0, 0, stone);
        let mut column = Column::new(chunk);
        column.entities.push(Compound::new());
        let mut store = ColumnStore::new(MemoryStore::new(), WorldRange::NETHER);
        let key = ChunkKey::new(ChunkPos::new(2, 2), 1);
        store.save(key, &mut column, &table).unwrap();
        assert!(!store.store().is_empty());
        store.delete(key).unwrap();
        assert!(store.store().is_empty());
        assert!(store.load(key, &table).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_sub_chunk_is_an_error() {
        let (table, _, _) = table();
        let mut backend = MemoryStore::new();
        let key = ChunkKey::new(ChunkPos::new(0, 0), 0);
        backend.put(&key.key(TAG_VERSION), &[CHUNK_VERSION]).unwrap();
        backend.put(&key.sub_chunk_key(0), &[9, 1, 0, 0xff]).unwrap();
        let store = ColumnStore::new(backend, WorldRange::OVERWORLD);
        assert!(matches!(
            store.load(key, &table),
            Err(StoreError::Decode(DecodeError::EncodingMismatch { .. }))
        ));
    }
}
