//! Low-level byte reading utilities.
//!
//! All readers operate on an advancing `&[u8]` and surface out-of-bounds
//! reads as [`ChmError::Parse`] tagged with the stream being decoded, so a
//! truncated field anywhere in a TOC/index/search stream turns into the
//! crate's fail-fast parse error instead of a panic.

use byteorder::{ByteOrder, LittleEndian};

use super::error::{ChmError, Result};

/// Split off the next `len` bytes, advancing the reader.
pub fn take<'a>(reader: &mut &'a [u8], len: usize, stream: &'static str) -> Result<&'a [u8]> {
    if reader.len() < len {
        return Err(ChmError::Parse {
            stream,
            detail: format!("needed {} bytes, only {} left", len, reader.len()),
        });
    }
    let (head, tail) = reader.split_at(len);
    *reader = tail;
    Ok(head)
}

/// Read a little-endian u16 and advance.
pub fn read_u16(reader: &mut &[u8], stream: &'static str) -> Result<u16> {
    Ok(LittleEndian::read_u16(take(reader, 2, stream)?))
}

/// Read a little-endian u32 and advance.
pub fn read_u32(reader: &mut &[u8], stream: &'static str) -> Result<u32> {
    Ok(LittleEndian::read_u32(take(reader, 4, stream)?))
}

/// Read a little-endian i32 and advance.
pub fn read_i32(reader: &mut &[u8], stream: &'static str) -> Result<i32> {
    Ok(LittleEndian::read_i32(take(reader, 4, stream)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_advances_and_bounds_checks() {
        let data = [1u8, 2, 3, 4];
        let mut reader = &data[..];
        assert_eq!(take(&mut reader, 3, "test").unwrap(), &[1, 2, 3]);
        assert_eq!(reader, &[4]);
        assert!(take(&mut reader, 2, "test").is_err());
    }

    #[test]
    fn numbers_are_little_endian() {
        let data = [0x34, 0x12, 0x78, 0x56, 0x34, 0x12];
        let mut reader = &data[..];
        assert_eq!(read_u16(&mut reader, "test").unwrap(), 0x1234);
        assert_eq!(read_u32(&mut reader, "test").unwrap(), 0x1234_5678);
        assert!(read_u16(&mut reader, "test").is_err());
    }
}
