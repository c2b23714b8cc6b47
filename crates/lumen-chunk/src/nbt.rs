//! Little-endian named binary tags, as used in Bedrock world storage.
//!
//! Only the subset needed for chunk records is exposed: whole compounds are
//! written and read, nested to any depth up to [`MAX_DEPTH`].

use std::collections::BTreeMap;
use std::io::{self, Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use thiserror::Error;

/// Deepest nesting accepted when reading.
pub const MAX_DEPTH: usize = 512;

const TAG_END: u8 = 0;
const TAG_BYTE: u8 = 1;
const TAG_SHORT: u8 = 2;
const TAG_INT: u8 = 3;
const TAG_LONG: u8 = 4;
const TAG_FLOAT: u8 = 5;
const TAG_DOUBLE: u8 = 6;
const TAG_BYTE_ARRAY: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_LIST: u8 = 9;
const TAG_COMPOUND: u8 = 10;
const TAG_INT_ARRAY: u8 = 11;
const TAG_LONG_ARRAY: u8 = 12;

/// Named children of a compound tag, ordered by name.
pub type Compound = BTreeMap<String, Tag>;

/// A single tag payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Tag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<u8>),
    String(String),
    /// Homogeneous list. An empty list is written with element type end.
    List(Vec<Tag>),
    Compound(Compound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl Tag {
    fn id(&self) -> u8 {
        match self {
            Tag::Byte(_) => TAG_BYTE,
            Tag::Short(_) => TAG_SHORT,
            Tag::Int(_) => TAG_INT,
            Tag::Long(_) => TAG_LONG,
            Tag::Float(_) => TAG_FLOAT,
            Tag::Double(_) => TAG_DOUBLE,
            Tag::ByteArray(_) => TAG_BYTE_ARRAY,
            Tag::String(_) => TAG_STRING,
            Tag::List(_) => TAG_LIST,
            Tag::Compound(_) => TAG_COMPOUND,
            Tag::IntArray(_) => TAG_INT_ARRAY,
            Tag::LongArray(_) => TAG_LONG_ARRAY,
        }
    }

    /// The string payload, if this is a string tag.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Tag::String(s) => Some(s),
            _ => None,
        }
    }

    /// Any integer tag up to 32 bits, widened.
    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            Tag::Byte(v) => Some(i32::from(v)),
            Tag::Short(v) => Some(i32::from(v)),
            Tag::Int(v) => Some(v),
            _ => None,
        }
    }

    /// The children, if this is a compound tag.
    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Tag::Compound(c) => Some(c),
            _ => None,
        }
    }
}

/// Errors raised while reading or writing tags.
#[derive(Debug, Error)]
pub enum NbtError {
    /// The input ended early or the writer failed.
    #[error("nbt i/o: {0}")]
    Io(#[from] io::Error),
    /// The root tag is not a compound.
    #[error("expected root compound, found tag type {0}")]
    NotACompound(u8),
    /// A tag type outside 0..=12.
    #[error("unknown tag type {0}")]
    UnknownTag(u8),
    /// Nesting exceeds [`MAX_DEPTH`].
    #[error("nbt nested deeper than {MAX_DEPTH} levels")]
    TooDeep,
    /// A length prefix is negative or runs past the input.
    #[error("nbt length {len} exceeds remaining {remaining} bytes")]
    BadLength { len: i64, remaining: usize },
    /// A string is not valid UTF-8.
    #[error("nbt string is not utf-8")]
    InvalidString,
    /// A list mixes element types, or a string does not fit a u16 length.
    #[error("cannot encode tag: {0}")]
    Unencodable(&'static str),
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Writes `compound` as a named root compound.
pub fn write_compound(buf: &mut Vec<u8>, name: &str, compound: &Compound) -> Result<(), NbtError> {
    buf.write_u8(TAG_COMPOUND)?;
    write_string(buf, name)?;
    write_compound_payload(buf, compound)
}

fn write_string(buf: &mut Vec<u8>, s: &str) -> Result<(), NbtError> {
    let len = u16::try_from(s.len()).map_err(|_| NbtError::Unencodable("string too long"))?;
    buf.write_u16::<LittleEndian>(len)?;
    buf.extend_from_slice(s.as_bytes());
    Ok(())
}

fn write_len(buf: &mut Vec<u8>, len: usize) -> Result<(), NbtError> {
    let len = i32::try_from(len).map_err(|_| NbtError::Unencodable("array too long"))?;
    buf.write_i32::<LittleEndian>(len)?;
    Ok(())
}

fn write_compound_payload(buf: &mut Vec<u8>, compound: &Compound) -> Result<(), NbtError> {
    for (name, tag) in compound {
        buf.write_u8(tag.id())?;
        write_string(buf, name)?;
        write_payload(buf, tag)?;
    }
    buf.write_u8(TAG_END)?;
    Ok(())
}

fn write_payload(buf: &mut Vec<u8>, tag: &Tag) -> Result<(), NbtError> {
    match tag {
        Tag::Byte(v) => buf.write_i8(*v)?,
        Tag::Short(v) => buf.write_i16::<LittleEndian>(*v)?,
        Tag::Int(v) => buf.write_i32::<LittleEndian>(*v)?,
        Tag::Long(v) => buf.write_i64::<LittleEndian>(*v)?,
        Tag::Float(v) => buf.write_f32::<LittleEndian>(*v)?,
        Tag::Double(v) => buf.write_f64::<LittleEndian>(*v)?,
        Tag::ByteArray(bytes) => {
            write_len(buf, bytes.len())?;
            buf.extend_from_slice(bytes);
        }
        Tag::String(s) => write_string(buf, s)?,
        Tag::List(items) => {
            let element = items.first().map_or(TAG_END, Tag::id);
            if items.iter().any(|item| item.id() != element) {
                return Err(NbtError::Unencodable("list mixes tag types"));
            }
            buf.write_u8(element)?;
            write_len(buf, items.len())?;
            for item in items {
                write_payload(buf, item)?;
            }
        }
        Tag::Compound(c) => write_compound_payload(buf, c)?,
        Tag::IntArray(values) => {
            write_len(buf, values.len())?;
            for v in values {
                buf.write_i32::<LittleEndian>(*v)?;
            }
        }
        Tag::LongArray(values) => {
            write_len(buf, values.len())?;
            for v in values {
                buf.write_i64::<LittleEndian>(*v)?;
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Reads one named root compound, discarding its name.
pub fn read_compound(cursor: &mut Cursor<&[u8]>) -> Result<Compound, NbtError> {
    let id = cursor.read_u8()?;
    if id != TAG_COMPOUND {
        return Err(NbtError::NotACompound(id));
    }
    read_string(cursor)?;
    read_compound_payload(cursor, 0)
}

/// Reads back-to-back root compounds until the input is exhausted.
pub fn read_compounds(bytes: &[u8]) -> Result<Vec<Compound>, NbtError> {
    let mut cursor = Cursor::new(bytes);
    let mut out = Vec::new();
    while remaining(&cursor) > 0 {
        out.push(read_compound(&mut cursor)?);
    }
    Ok(out)
}

fn remaining(cursor: &Cursor<&[u8]>) -> usize {
    cursor.get_ref().len().saturating_sub(cursor.position() as usize)
}

/// Reads a length prefix and checks that `len * width` bytes remain.
fn read_len(cursor: &mut Cursor<&[u8]>, width: usize) -> Result<usize, NbtError> {
    let len = cursor.read_i32::<LittleEndian>()?;
    let left = remaining(cursor);
    match usize::try_from(len) {
        Ok(n) if n.saturating_mul(width) <= left => Ok(n),
        _ => Err(NbtError::BadLength {
            len: i64::from(len),
            remaining: left,
        }),
    }
}

fn read_bytes(cursor: &mut Cursor<&[u8]>, len: usize) -> Result<Vec<u8>, NbtError> {
    let mut bytes = vec![0; len];
    cursor.read_exact(&mut bytes)?;
    Ok(bytes)
}

fn read_string(cursor: &mut Cursor<&[u8]>) -> Result<String, NbtError> {
    let len = usize::from(cursor.read_u16::<LittleEndian>()?);
    let bytes = read_bytes(cursor, len)?;
    String::from_utf8(bytes).map_err(|_| NbtError::InvalidString)
}

fn read_compound_payload(cursor: &mut Cursor<&[u8]>, depth: usize) -> Result<Compound, NbtError> {
    if depth >= MAX_DEPTH {
        return Err(NbtError::TooDeep);
    }
    let mut compound = Compound::new();
    loop {
        let id = cursor.read_u8()?;
        if id == TAG_END {
            return Ok(compound);
        }
        let name = read_string(cursor)?;
        let tag = read_payload(cursor, id, depth + 1)?;
        compound.insert(name, tag);
    }
}

fn read_payload(cursor: &mut Cursor<&[u8]>, id: u8, depth: usize) -> Result<Tag, NbtError> {
    if depth >= MAX_DEPTH {
        return Err(NbtError::TooDeep);
    }
    let tag = match id {
        TAG_BYTE => Tag::Byte(cursor.read_i8()?),
        TAG_SHORT => Tag::Short(cursor.read_i16::<LittleEndian>()?),
        TAG_INT => Tag::Int(cursor.read_i32::<LittleEndian>()?),
        TAG_LONG => Tag::Long(cursor.read_i64::<LittleEndian>()?),
        TAG_FLOAT => Tag::Float(cursor.read_f32::<LittleEndian>()?),
        TAG_DOUBLE => Tag::Double(cursor.read_f64::<LittleEndian>()?),
        TAG_BYTE_ARRAY => {
            let len = read_len(cursor, 1)?;
            Tag::ByteArray(read_bytes(cursor, len)?)
        }
        TAG_STRING => Tag::String(read_string(cursor)?),
        TAG_LIST => {
            let element = cursor.read_u8()?;
            let len = read_len(cursor, if element == TAG_END { 0 } else { 1 })?;
            if element == TAG_END || len == 0 {
                Tag::List(Vec::new())
            } else {
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    items.push(read_payload(cursor, element, depth + 1)?);
                }
                Tag::List(items)
            }
        }
        TAG_COMPOUND => Tag::Compound(read_compound_payload(cursor, depth)?),
        TAG_INT_ARRAY => {
            let len = read_len(cursor, 4)?;
            let mut values = Vec::with_capacity(len);
            for _ in 0..len {
                values.push(cursor.read_i32::<LittleEndian>()?);
            }
            Tag::IntArray(values)
        }
        TAG_LONG_ARRAY => {
            let len = read_len(cursor, 8)?;
            let mut values = Vec::with_capacity(len);
            for _ in 0..len {
                values.push(cursor.read_i64::<LittleEndian>()?);
            }
            Tag::LongArray(values)
        }
        other => return Err(NbtError::UnknownTag(other)),
    };
    Ok(tag)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
