//! Bedrock-compatible chunk storage: palette-compressed sub chunks, chunk
//! columns, light arrays, and the disk and network encodings.

pub mod bit_packed;
pub mod chunk;
pub mod chunk_manager;
pub mod encoding;
pub mod height_map;
pub mod legacy;
pub mod light_storage;
pub mod nbt;
pub mod palette;
pub mod paletted_storage;
pub mod registry;
pub mod store;
pub mod sub_chunk;
pub mod varint;

pub use bit_packed::{BitsPerIndex, PackedIndices, STORAGE_CELLS};
pub use chunk::{Chunk, WorldRange};
pub use chunk_manager::{ChunkManager, ChunkPos};
pub use encoding::{DecodeError, DiskEncoding, EncodeError, NetworkChunk, NetworkEncoding};
pub use height_map::HeightMap;
pub use light_storage::{LightStorage, LightType, MAX_LIGHT, SharedLight};
pub use palette::Palette;
pub use paletted_storage::{PalettedStorage, StorageError};
pub use registry::{
    BlockDef, BlockProperties, BlockRegistry, BlockState, BlockTable, PropertyValue,
    RegistryError,
};
pub use store::{ChunkKey, ChunkStore, Column, ColumnStore, Finalisation, MemoryStore, StoreError};
pub use sub_chunk::SubChunk;
