//! Variable-length integers used by the network chunk encoding.
//!
//! Seven payload bits per byte, least significant group first, with the high
//! bit set on every byte except the last. Signed values are zigzag encoded.

use std::io::{self, Read};

use byteorder::ReadBytesExt;

/// Longest encoding of a 32-bit value.
pub const MAX_VAR_U32_LEN: usize = 5;

/// Appends `value` as an unsigned varint.
pub fn write_var_u32(buf: &mut Vec<u8>, mut value: u32) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

/// Appends `value` as a zigzag signed varint.
pub fn write_var_i32(buf: &mut Vec<u8>, value: i32) {
    write_var_u32(buf, ((value << 1) ^ (value >> 31)) as u32);
}

/// Reads an unsigned varint.
///
/// Returns [`io::ErrorKind::InvalidData`] if the value runs past five bytes.
pub fn read_var_u32(reader: &mut impl Read) -> io::Result<u32> {
    let mut value = 0u32;
    for i in 0..MAX_VAR_U32_LEN {
        let byte = reader.read_u8()?;
        value |= u32::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(io::Error::new(io::ErrorKind::InvalidData, "varint exceeds 5 bytes"))
}

/// Reads a zigzag signed varint.
pub fn read_var_i32(reader: &mut impl Read) -> io::Result<i32> {
    let raw = read_var_u32(reader)?;
    Ok(((raw >> 1) as i32) ^ -((raw & 1) as i32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_known_encodings() {
        let mut buf = Vec::new();
        write_var_u32(&mut buf, 300);
        assert_eq!(buf, [0xAC, 0x02]);

        buf.clear();
        write_var_i32(&mut buf, -1);
        assert_eq!(buf, [0x01]);

        buf.clear();
        write_var_i32(&mut buf, 1);
        assert_eq!(buf, [0x02]);
    }

    #[test]
    fn test_extremes_read_back() {
        for value in [0, 1, -1, 63, -64, i32::MAX, i32::MIN] {
            let mut buf = Vec::new();
            write_var_i32(&mut buf, value);
            assert!(buf.len() <= MAX_VAR_U32_LEN);
            assert_eq!(read_var_i32(&mut Cursor::new(buf)).unwrap(), value);
        }
    }

    #[test]
    fn test_overlong_varint_rejected() {
        let bytes = [0x80u8; 6];
        let err = read_var_u32(&mut Cursor::new(&bytes[..])).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_truncated_varint_is_eof() {
        let err = read_var_u32(&mut Cursor::new(&[0x80u8][..])).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
