//! The encoding used for world storage.
//!
//! Block palettes hold NBT block states so that saved worlds survive runtime
//! ID renumbering between versions. Biome palettes hold plain `u32` IDs.

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use super::{DecodeError, EncodeError, Encoding, PaletteKind, check_palette_len, remaining};
use crate::bit_packed::{BitsPerIndex, STORAGE_CELLS};
use crate::legacy::{LegacyResolver, legacy_state_by_name};
use crate::nbt::{self, Compound, Tag};
use crate::palette::Palette;
use crate::paletted_storage::PalettedStorage;
use crate::registry::{BlockRegistry, BlockState, CURRENT_BLOCK_VERSION, PropertyValue};
use crate::sub_chunk::SubChunk;

/// Disk encoding, resolving block states through `registry`.
pub struct DiskEncoding<'a, R: BlockRegistry + ?Sized> {
    registry: &'a R,
}

impl<'a, R: BlockRegistry + ?Sized> DiskEncoding<'a, R> {
    pub fn new(registry: &'a R) -> Self {
        Self { registry }
    }

    fn encode_block(&self, buf: &mut Vec<u8>, rid: u32) -> Result<(), EncodeError> {
        let state = self
            .registry
            .state_of(rid)
            .ok_or(EncodeError::UnknownRuntimeId(rid))?;
        let states: Compound = state
            .properties
            .iter()
            .map(|(key, value)| {
                let tag = match value {
                    PropertyValue::Byte(v) => Tag::Byte(*v as i8),
                    PropertyValue::Int(v) => Tag::Int(*v),
                    PropertyValue::String(v) => Tag::String(v.clone()),
                };
                (key.clone(), tag)
            })
            .collect();
        let mut entry = Compound::new();
        entry.insert("name".into(), Tag::String(state.name.clone()));
        entry.insert("states".into(), Tag::Compound(states));
        entry.insert("version".into(), Tag::Int(CURRENT_BLOCK_VERSION));
        nbt::write_compound(buf, "", &entry)?;
        Ok(())
    }

    fn decode_block(&self, entry: &Compound) -> u32 {
        let Some(name) = entry.get("name").and_then(Tag::as_str) else {
            tracing::warn!("palette entry without a name, using air");
            return self.registry.air();
        };
        let state = match entry.get("states").and_then(Tag::as_compound) {
            Some(states) => BlockState {
                name: name.to_string(),
                properties: states
                    .iter()
                    .filter_map(|(key, tag)| {
                        let value = match tag {
                            Tag::Byte(v) => PropertyValue::Byte(*v as u8),
                            Tag::Int(v) => PropertyValue::Int(*v),
                            Tag::String(v) => PropertyValue::String(v.clone()),
                            _ => return None,
                        };
                        Some((key.clone(), value))
                    })
                    .collect(),
            },
            None => entry
                .get("val")
                .and_then(Tag::as_i32)
                .and_then(|val| legacy_state_by_name(name, val as i16))
                .unwrap_or_else(|| BlockState::new(name)),
        };
        match self.registry.runtime_id(&state) {
            Some(rid) => rid,
            None => {
                tracing::warn!(name = %state.name, "unknown block state, using air");
                self.registry.air()
            }
        }
    }
}

impl<R: BlockRegistry + ?Sized> Encoding for DiskEncoding<'_, R> {
    fn network_flag(&self) -> u8 {
        0
    }

    fn encode_palette(
        &self,
        buf: &mut Vec<u8>,
        palette: &Palette,
        bits: BitsPerIndex,
        kind: PaletteKind,
    ) -> Result<(), EncodeError> {
        if bits != BitsPerIndex::Zero {
            buf.extend_from_slice(&(palette.len() as u32).to_le_bytes());
        }
        for &value in palette.values() {
            match kind {
                PaletteKind::Blocks => self.encode_block(buf, value)?,
                PaletteKind::Biomes => buf.extend_from_slice(&value.to_le_bytes()),
            }
        }
        Ok(())
    }

    fn decode_palette(
        &self,
        cursor: &mut Cursor<&[u8]>,
        bits: BitsPerIndex,
        kind: PaletteKind,
    ) -> Result<Palette, DecodeError> {
        let len = if bits == BitsPerIndex::Zero {
            1
        } else {
            check_palette_len(i64::from(cursor.read_u32::<LittleEndian>()?), bits)?
        };
        let mut values = Vec::with_capacity(len.min(remaining(cursor)));
        for _ in 0..len {
            let value = match kind {
                PaletteKind::Blocks => self.decode_block(&nbt::read_compound(cursor)?),
                PaletteKind::Biomes => cursor.read_u32::<LittleEndian>()?,
            };
            values.push(value);
        }
        Ok(Palette::from_values(values))
    }

    fn decode_legacy_sub_chunk(
        &self,
        cursor: &mut Cursor<&[u8]>,
        _version: u8,
        air: u32,
    ) -> Result<SubChunk, DecodeError> {
        let mut ids = vec![0u8; STORAGE_CELLS];
        cursor.read_exact(&mut ids)?;
        let mut meta = vec![0u8; STORAGE_CELLS / 2];
        cursor.read_exact(&mut meta)?;
        // Trailing light arrays, if present, are recomputed by the light engine.

        let mut resolver = LegacyResolver::new();
        let mut storage = PalettedStorage::new(air);
        for (cell, &id) in ids.iter().enumerate() {
            let data = (meta[cell >> 1] >> ((cell & 1) << 2)) & 0xF;
            let rid = resolver.resolve(id, data, self.registry);
            if rid != air {
                storage.set((cell >> 8) as u8, (cell & 15) as u8, ((cell >> 4) & 15) as u8, rid);
            }
        }
        storage.compact();
        Ok(SubChunk::from_layers(air, vec![storage]))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
