//! Checked big-endian read/write primitives.
//!
//! `bytes::Buf` panics on underflow, so every read here verifies remaining
//! length first and reports [`ProtocolError::UnexpectedEof`] instead. Strings
//! are UTF-8 with an 8- or 16-bit length prefix and no terminator.

use bytes::{Buf, BufMut, Bytes};

use crate::errors::{ProtocolError, Result};

fn ensure(buf: &Bytes, needed: usize) -> Result<()> {
    if buf.remaining() < needed {
        return Err(ProtocolError::UnexpectedEof { needed, remaining: buf.remaining() });
    }
    Ok(())
}

/// Read one unsigned byte.
pub fn read_u8(buf: &mut Bytes) -> Result<u8> {
    ensure(buf, 1)?;
    Ok(buf.get_u8())
}

/// Read a big-endian u16.
pub fn read_u16(buf: &mut Bytes) -> Result<u16> {
    ensure(buf, 2)?;
    Ok(buf.get_u16())
}

/// Read a big-endian u32.
pub fn read_u32(buf: &mut Bytes) -> Result<u32> {
    ensure(buf, 4)?;
    Ok(buf.get_u32())
}

/// Read a big-endian u64.
pub fn read_u64(buf: &mut Bytes) -> Result<u64> {
    ensure(buf, 8)?;
    Ok(buf.get_u64())
}

/// Split off exactly `len` bytes without copying.
pub fn read_bytes(buf: &mut Bytes, len: usize) -> Result<Bytes> {
    ensure(buf, len)?;
    Ok(buf.split_to(len))
}

/// Read a fixed-size byte array.
pub fn read_array<const N: usize>(buf: &mut Bytes) -> Result<[u8; N]> {
    ensure(buf, N)?;
    let mut arr = [0u8; N];
    buf.copy_to_slice(&mut arr);
    Ok(arr)
}

/// Read a string with an 8-bit length prefix.
pub fn read_string8(buf: &mut Bytes) -> Result<String> {
    let len = usize::from(read_u8(buf)?);
    let raw = read_bytes(buf, len)?;
    String::from_utf8(raw.to_vec()).map_err(|_| ProtocolError::InvalidString)
}

/// Read a string with a 16-bit length prefix.
pub fn read_string16(buf: &mut Bytes) -> Result<String> {
    let len = usize::from(read_u16(buf)?);
    let raw = read_bytes(buf, len)?;
    String::from_utf8(raw.to_vec()).map_err(|_| ProtocolError::InvalidString)
}

/// Read a byte blob with a 16-bit length prefix.
pub fn read_bytes16(buf: &mut Bytes) -> Result<Bytes> {
    let len = usize::from(read_u16(buf)?);
    read_bytes(buf, len)
}

/// Write a string with an 8-bit length prefix.
pub fn write_string8(buf: &mut impl BufMut, s: &str) -> Result<()> {
    let len = s.len();
    if len > usize::from(u8::MAX) {
        return Err(ProtocolError::ValueTooLong { len, max: usize::from(u8::MAX) });
    }
    buf.put_u8(len as u8);
    buf.put_slice(s.as_bytes());
    Ok(())
}

/// Write a string with a 16-bit length prefix.
pub fn write_string16(buf: &mut impl BufMut, s: &str) -> Result<()> {
    write_bytes16(buf, s.as_bytes())
}

/// Write a byte blob with a 16-bit length prefix.
pub fn write_bytes16(buf: &mut impl BufMut, raw: &[u8]) -> Result<()> {
    let len = raw.len();
    if len > usize::from(u16::MAX) {
        return Err(ProtocolError::ValueTooLong { len, max: usize::from(u16::MAX) });
    }
    buf.put_u16(len as u16);
    buf.put_slice(raw);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_past_end_reports_eof() {
        let mut buf = Bytes::from_static(&[0x01]);
        assert_eq!(
            read_u16(&mut buf),
            Err(ProtocolError::UnexpectedEof { needed: 2, remaining: 1 })
        );
    }

    #[test]
    fn string8_round_trip() {
        let mut wire = Vec::new();
        write_string8(&mut wire, "chattingchuck").unwrap();

        let mut buf = Bytes::from(wire);
        assert_eq!(read_string8(&mut buf).unwrap(), "chattingchuck");
        assert!(buf.is_empty());
    }

    #[test]
    fn string8_rejects_oversized_value() {
        let long = "x".repeat(300);
        let mut wire = Vec::new();
        assert!(matches!(
            write_string8(&mut wire, &long),
            Err(ProtocolError::ValueTooLong { len: 300, .. })
        ));
    }

    #[test]
    fn string_rejects_invalid_utf8() {
        let mut buf = Bytes::from_static(&[0x02, 0xFF, 0xFE]);
        assert_eq!(read_string8(&mut buf), Err(ProtocolError::InvalidString));
    }
}
