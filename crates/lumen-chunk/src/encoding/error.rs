use std::io;

use thiserror::Error;

use crate::nbt::NbtError;
use crate::paletted_storage::StorageError;

/// Errors raised while decoding sub chunks, biomes or whole chunks.
///
/// Decoders build fresh values and only hand them back on success, so an
/// error never leaves a caller's chunk half-written.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The input ended before the structure was complete.
    #[error("chunk data truncated: {0}")]
    Truncated(#[from] io::Error),
    /// The sub chunk version byte is not one this decoder understands.
    #[error("unsupported sub chunk version {0}")]
    UnsupportedSubChunkVersion(u8),
    /// A storage header names a width outside {0,1,2,3,4,5,6,8,16}.
    #[error("invalid bits per index {0}")]
    InvalidBitsPerIndex(u8),
    /// A storage was written by the other encoding.
    #[error("storage network flag is {found}, expected {expected}")]
    EncodingMismatch { found: u8, expected: u8 },
    /// A palette length prefix is zero, negative or too large for the width.
    #[error("invalid palette length {len} for {bits}-bit storage")]
    InvalidPaletteLength { len: i64, bits: u8 },
    /// A cell references a palette entry that does not exist.
    #[error("invalid palette index: {0}")]
    InvalidPaletteIndex(#[from] StorageError),
    /// The first biome storage uses the "same as previous" marker.
    #[error("biome storage refers to a previous storage that does not exist")]
    MissingPreviousBiomes,
    /// A disk palette entry is not valid NBT.
    #[error("palette entry: {0}")]
    Nbt(#[from] NbtError),
    /// A varint runs past five bytes.
    #[error("varint exceeds 5 bytes")]
    VarIntTooLong,
    /// A network palette holds a negative runtime ID.
    #[error("invalid runtime id {0}")]
    InvalidRuntimeId(i32),
    /// A sub chunk's Y index lies outside the world range.
    #[error("sub chunk index {index} outside world range of {count} sub chunks")]
    SubChunkOutOfRange { index: i32, count: usize },
}

/// Errors raised while encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// A disk palette holds a runtime ID the registry does not know.
    #[error("runtime id {0} is not registered")]
    UnknownRuntimeId(u32),
    /// More layers than the one-byte layer count can describe.
    #[error("sub chunk has {0} layers, at most 255 can be encoded")]
    TooManyLayers(usize),
    /// A palette value does not fit a signed 32-bit varint.
    #[error("palette value {0} does not fit a signed varint")]
    ValueTooLarge(u32),
    /// A palette entry could not be written as NBT.
    #[error("palette entry: {0}")]
    Nbt(#[from] NbtError),
}
