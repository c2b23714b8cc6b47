//! Disk and network serialization of sub chunks and biome storages.
//!
//! Both encodings share one layout and differ only in the storage header's
//! network flag and in how palettes are written:
//!
//! ```text
//! sub chunk : version(9) | layer count | sub chunk Y (i8) | layer*
//! layer     : (bits << 1) | flag | word* (u32 LE) | palette
//! palette   : [count, if bits != 0] value*
//! ```
//!
//! Storages are written as they are; call [`Chunk::compact`](crate::Chunk::compact)
//! first to get the smallest output.

mod disk;
mod error;
mod network;

use std::io::{self, Cursor};

use byteorder::{LittleEndian, ReadBytesExt};

pub use disk::DiskEncoding;
pub use error::{DecodeError, EncodeError};
pub use network::{NetworkChunk, NetworkEncoding, decode_network_chunk, encode_network_chunk};

use crate::bit_packed::{BitsPerIndex, PackedIndices};
use crate::chunk::WorldRange;
use crate::palette::Palette;
use crate::paletted_storage::PalettedStorage;
use crate::sub_chunk::SubChunk;

/// Sub chunk version written by the encoders.
pub const SUB_CHUNK_VERSION: u8 = 9;

/// Width class in a biome storage header (`header >> 1`) meaning "repeat the
/// previous storage".
pub const BIOMES_SAME_AS_PREVIOUS: u8 = 0x7f;

/// What a palette holds, which decides how disk palettes are written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaletteKind {
    Blocks,
    Biomes,
}

/// One serialization flavour: disk or network.
pub trait Encoding {
    /// Low bit of every storage header.
    fn network_flag(&self) -> u8;

    /// Writes the palette of a storage with the given width.
    fn encode_palette(
        &self,
        buf: &mut Vec<u8>,
        palette: &Palette,
        bits: BitsPerIndex,
        kind: PaletteKind,
    ) -> Result<(), EncodeError>;

    /// Reads the palette of a storage with the given width.
    fn decode_palette(
        &self,
        cursor: &mut Cursor<&[u8]>,
        bits: BitsPerIndex,
        kind: PaletteKind,
    ) -> Result<Palette, DecodeError>;

    /// Decodes the pre-palette sub chunk versions (0 and 2 to 7).
    fn decode_legacy_sub_chunk(
        &self,
        _cursor: &mut Cursor<&[u8]>,
        version: u8,
        _air: u32,
    ) -> Result<SubChunk, DecodeError> {
        Err(DecodeError::UnsupportedSubChunkVersion(version))
    }
}

/// Checks a decoded palette length against the storage width.
pub(crate) fn check_palette_len(len: i64, bits: BitsPerIndex) -> Result<usize, DecodeError> {
    match usize::try_from(len) {
        Ok(n) if n >= 1 && n <= bits.max_palette_len() => Ok(n),
        _ => Err(DecodeError::InvalidPaletteLength {
            len,
            bits: bits.bits(),
        }),
    }
}

pub(crate) fn remaining(cursor: &Cursor<&[u8]>) -> usize {
    cursor.get_ref().len().saturating_sub(cursor.position() as usize)
}

fn truncated() -> DecodeError {
    DecodeError::Truncated(io::Error::from(io::ErrorKind::UnexpectedEof))
}

/// Writes one paletted storage.
pub fn encode_storage(
    encoding: &(impl Encoding + ?Sized),
    buf: &mut Vec<u8>,
    storage: &PalettedStorage,
    kind: PaletteKind,
) -> Result<(), EncodeError> {
    let bits = storage.bits_per_index();
    buf.push((bits.bits() << 1) | encoding.network_flag());
    buf.reserve(storage.storage_bytes());
    for word in storage.raw_indices() {
        buf.extend_from_slice(&word.to_le_bytes());
    }
    encoding.encode_palette(buf, storage.palette(), bits, kind)
}

/// Reads one paletted storage.
pub fn decode_storage(
    encoding: &(impl Encoding + ?Sized),
    cursor: &mut Cursor<&[u8]>,
    kind: PaletteKind,
) -> Result<PalettedStorage, DecodeError> {
    let header = cursor.read_u8()?;
    decode_storage_body(encoding, cursor, header, kind)
}

fn decode_storage_body(
    encoding: &(impl Encoding + ?Sized),
    cursor: &mut Cursor<&[u8]>,
    header: u8,
    kind: PaletteKind,
) -> Result<PalettedStorage, DecodeError> {
    let flag = header & 1;
    if flag != encoding.network_flag() {
        return Err(DecodeError::EncodingMismatch {
            found: flag,
            expected: encoding.network_flag(),
        });
    }
    let bits =
        BitsPerIndex::from_bits(header >> 1).ok_or(DecodeError::InvalidBitsPerIndex(header >> 1))?;

    let count = bits.word_count();
    if remaining(cursor) < count * 4 {
        return Err(truncated());
    }
    let mut words = Vec::with_capacity(count);
    for _ in 0..count {
        words.push(cursor.read_u32::<LittleEndian>()?);
    }
    let indices = PackedIndices::from_words(bits, words).ok_or_else(truncated)?;

    let palette = encoding.decode_palette(cursor, bits, kind)?;
    Ok(PalettedStorage::from_raw(indices, palette)?)
}

/// Writes sub chunk `index` of a chunk spanning `range`.
pub fn encode_sub_chunk(
    encoding: &(impl Encoding + ?Sized),
    buf: &mut Vec<u8>,
    sub: &SubChunk,
    index: usize,
    range: WorldRange,
) -> Result<(), EncodeError> {
    let layers = sub.layers();
    let count = u8::try_from(layers.len()).map_err(|_| EncodeError::TooManyLayers(layers.len()))?;
    let y = index as i32 + (i32::from(range.min) >> 4);
    buf.push(SUB_CHUNK_VERSION);
    buf.push(count);
    buf.push(y as i8 as u8);
    for storage in layers {
        encode_storage(encoding, buf, storage, PaletteKind::Blocks)?;
    }
    Ok(())
}

/// A decoded sub chunk with the Y index it carried, if its version has one.
#[derive(Debug)]
pub struct DecodedSubChunk {
    pub sub: SubChunk,
    pub y_index: Option<i8>,
}

/// Reads one sub chunk of any supported version.
pub fn decode_sub_chunk(
    encoding: &(impl Encoding + ?Sized),
    cursor: &mut Cursor<&[u8]>,
    air: u32,
) -> Result<DecodedSubChunk, DecodeError> {
    let version = cursor.read_u8()?;
    let (layer_count, y_index) = match version {
        1 => (1, None),
        8 => (cursor.read_u8()?, None),
        9 => (cursor.read_u8()?, Some(cursor.read_i8()?)),
        0 | 2..=7 => {
            let sub = encoding.decode_legacy_sub_chunk(cursor, version, air)?;
            return Ok(DecodedSubChunk { sub, y_index: None });
        }
        other => return Err(DecodeError::UnsupportedSubChunkVersion(other)),
    };
    let mut layers = Vec::with_capacity(usize::from(layer_count));
    for _ in 0..layer_count {
        layers.push(decode_storage(encoding, cursor, PaletteKind::Blocks)?);
    }
    Ok(DecodedSubChunk {
        sub: SubChunk::from_layers(air, layers),
        y_index,
    })
}

/// Writes biome storages, replacing repeats with the "same as previous" header.
pub fn encode_biomes(
    encoding: &(impl Encoding + ?Sized),
    buf: &mut Vec<u8>,
    biomes: &[PalettedStorage],
) -> Result<(), EncodeError> {
    let mut previous: Option<&PalettedStorage> = None;
    for storage in biomes {
        if previous == Some(storage) {
            buf.push((BIOMES_SAME_AS_PREVIOUS << 1) | encoding.network_flag());
        } else {
            encode_storage(encoding, buf, storage, PaletteKind::Biomes)?;
        }
        previous = Some(storage);
    }
    Ok(())
}

/// Reads `count` biome storages.
///
/// Input that ends early repeats the last decoded storage for the remaining
/// sub chunks; input with no storages at all yields biome 0 everywhere.
pub fn decode_biomes(
    encoding: &(impl Encoding + ?Sized),
    cursor: &mut Cursor<&[u8]>,
    count: usize,
) -> Result<Vec<PalettedStorage>, DecodeError> {
    let mut biomes: Vec<PalettedStorage> = Vec::with_capacity(count);
    while biomes.len() < count {
        if remaining(cursor) == 0 {
            let fill = biomes.last().cloned().unwrap_or_else(|| PalettedStorage::new(0));
            biomes.resize(count, fill);
            break;
        }
        let header = cursor.read_u8()?;
        let storage = if header >> 1 == BIOMES_SAME_AS_PREVIOUS {
            biomes.last().cloned().ok_or(DecodeError::MissingPreviousBiomes)?
        } else {
            decode_storage_body(encoding, cursor, header, PaletteKind::Biomes)?
        };
        biomes.push(storage);
    }
    Ok(biomes)
}

/// Converts a decoded Y index into a sub chunk index within `range`.
pub(crate) fn sub_index_for(y_index: i32, range: WorldRange) -> Result<usize, DecodeError> {
    let index = y_index - (i32::from(range.min) >> 4);
    let count = range.sub_chunk_count();
    match usize::try_from(index) {
        Ok(i) if i < count => Ok(i),
        _ => Err(DecodeError::SubChunkOutOfRange {
            index: y_index,
            count,
        }),
    }
}
