//! The encoding sent to clients in level chunk packets.
//!
//! Palettes hold runtime IDs directly as zigzag varints, so both ends must
//! agree on the runtime ID table.

use std::io::{self, Cursor};

use byteorder::ReadBytesExt;

use super::{
    DecodeError, EncodeError, Encoding, PaletteKind, check_palette_len, decode_biomes,
    decode_sub_chunk, encode_biomes, encode_sub_chunk, remaining, sub_index_for,
};
use crate::bit_packed::BitsPerIndex;
use crate::chunk::{Chunk, WorldRange};
use crate::palette::Palette;
use crate::sub_chunk::SubChunk;
use crate::varint::{read_var_i32, write_var_i32};

/// Network encoding. Stateless.
#[derive(Clone, Copy, Debug, Default)]
pub struct NetworkEncoding;

fn var_i32(cursor: &mut Cursor<&[u8]>) -> Result<i32, DecodeError> {
    read_var_i32(cursor).map_err(|err| match err.kind() {
        io::ErrorKind::InvalidData => DecodeError::VarIntTooLong,
        _ => DecodeError::Truncated(err),
    })
}

fn write_value(buf: &mut Vec<u8>, value: u32) -> Result<(), EncodeError> {
    let value = i32::try_from(value).map_err(|_| EncodeError::ValueTooLarge(value))?;
    write_var_i32(buf, value);
    Ok(())
}

impl Encoding for NetworkEncoding {
    fn network_flag(&self) -> u8 {
        1
    }

    fn encode_palette(
        &self,
        buf: &mut Vec<u8>,
        palette: &Palette,
        bits: BitsPerIndex,
        _kind: PaletteKind,
    ) -> Result<(), EncodeError> {
        if bits != BitsPerIndex::Zero {
            write_value(buf, palette.len() as u32)?;
        }
        for &value in palette.values() {
            write_value(buf, value)?;
        }
        Ok(())
    }

    fn decode_palette(
        &self,
        cursor: &mut Cursor<&[u8]>,
        bits: BitsPerIndex,
        _kind: PaletteKind,
    ) -> Result<Palette, DecodeError> {
        let len = if bits == BitsPerIndex::Zero {
            1
        } else {
            check_palette_len(i64::from(var_i32(cursor)?), bits)?
        };
        let mut values = Vec::with_capacity(len.min(remaining(cursor)));
        for _ in 0..len {
            let value = var_i32(cursor)?;
            let value = u32::try_from(value).map_err(|_| DecodeError::InvalidRuntimeId(value))?;
            values.push(value);
        }
        Ok(Palette::from_values(values))
    }
}

/// A serialized chunk ready for a level chunk packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkChunk {
    pub payload: Vec<u8>,
    /// Number of sub chunks at the start of the payload.
    pub sub_chunk_count: usize,
}

/// Encodes a chunk for the network.
///
/// Sub chunks are sent up to and including the highest non-empty one,
/// followed by every biome storage and a zero border-block byte.
pub fn encode_network_chunk(chunk: &Chunk) -> Result<NetworkChunk, EncodeError> {
    let sub_chunk_count = chunk.highest_sub_chunk().map_or(0, |i| i + 1);
    let mut payload = Vec::new();
    for (index, sub) in chunk.sub().iter().take(sub_chunk_count).enumerate() {
        encode_sub_chunk(&NetworkEncoding, &mut payload, sub, index, chunk.range())?;
    }
    encode_biomes(&NetworkEncoding, &mut payload, chunk.biomes())?;
    payload.push(0);
    Ok(NetworkChunk {
        payload,
        sub_chunk_count,
    })
}

/// Decodes a payload produced by [`encode_network_chunk`].
pub fn decode_network_chunk(
    payload: &[u8],
    sub_chunk_count: usize,
    air: u32,
    range: WorldRange,
) -> Result<Chunk, DecodeError> {
    let count = range.sub_chunk_count();
    if sub_chunk_count > count {
        return Err(DecodeError::SubChunkOutOfRange {
            index: sub_chunk_count as i32 - 1 + (i32::from(range.min) >> 4),
            count,
        });
    }
    let mut cursor = Cursor::new(payload);
    let mut sub: Vec<SubChunk> = (0..count).map(|_| SubChunk::new(air)).collect();
    for position in 0..sub_chunk_count {
        let decoded = decode_sub_chunk(&NetworkEncoding, &mut cursor, air)?;
        let index = match decoded.y_index {
            Some(y) => sub_index_for(i32::from(y), range)?,
            None => position,
        };
        sub[index] = decoded.sub;
    }
    let biomes = decode_biomes(&NetworkEncoding, &mut cursor, count)?;
    if remaining(&cursor) > 0 {
        // Border block count, always zero.
        cursor.read_u8()?;
    }
    Ok(Chunk::from_parts(air, range, sub, biomes))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
