//! LEB128 varints for the side tables persisted next to a compressed blob.
//!
//! Three things are ever written this way: curve uids (`u32`), lengths and
//! counts (`usize`) and the blob length prefix of a persisted sequence. All of
//! them go through one `u64` core; the narrow readers reject values that do not
//! fit. Nothing here panics on malformed input.

use std::io::Cursor;

use crate::error::CurveCodecError;

/// A `u64` never needs more than ten 7-bit groups.
const MAX_VARINT_BYTES: usize = 10;

//==================================================================================
// 1. Writers
//==================================================================================

pub fn write_u64(mut value: u64, buffer: &mut Vec<u8>) {
    while value >= 0x80 {
        buffer.push((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    buffer.push(value as u8);
}

pub fn write_u32(value: u32, buffer: &mut Vec<u8>) {
    write_u64(u64::from(value), buffer);
}

/// Writes a count or byte length.
pub fn write_len(len: usize, buffer: &mut Vec<u8>) {
    write_u64(len as u64, buffer);
}

//==================================================================================
// 2. Readers
//==================================================================================

/// Reads one varint and advances `cursor` past it.
pub fn read_u64(cursor: &mut Cursor<&[u8]>) -> Result<u64, CurveCodecError> {
    let start = cursor.position() as usize;
    let bytes = cursor.get_ref().get(start..).unwrap_or(&[]);

    let mut value = 0u64;
    for (i, &byte) in bytes.iter().take(MAX_VARINT_BYTES).enumerate() {
        let payload = u64::from(byte & 0x7F);
        let shift = 7 * i as u32;
        // The tenth group only has room for the top bit of a u64.
        if i == MAX_VARINT_BYTES - 1 && payload > 1 {
            return Err(overflow());
        }
        value |= payload << shift;
        if byte & 0x80 == 0 {
            cursor.set_position((start + i + 1) as u64);
            return Ok(value);
        }
    }

    if bytes.len() < MAX_VARINT_BYTES {
        Err(CurveCodecError::Leb128DecodeError("Unexpected end of buffer".to_string()))
    } else {
        Err(overflow())
    }
}

pub fn read_u32(cursor: &mut Cursor<&[u8]>) -> Result<u32, CurveCodecError> {
    u32::try_from(read_u64(cursor)?).map_err(|_| overflow())
}

/// Reads a count or byte length written by `write_len`.
pub fn read_len(cursor: &mut Cursor<&[u8]>) -> Result<usize, CurveCodecError> {
    usize::try_from(read_u64(cursor)?).map_err(|_| overflow())
}

fn overflow() -> CurveCodecError {
    CurveCodecError::Leb128DecodeError("Integer overflow during decoding".to_string())
}
