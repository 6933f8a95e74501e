//! This module contains the pure, stateless kernels for fixed-width bit-packing
//! and random-access unpacking.
//!
//! Quantized curve samples rarely need a byte-aligned width: a segment whose
//! range only needs 5 bits of resolution is packed at exactly 5 bits per sample,
//! LSB-first. Unlike a streaming unpacker, `read_one` extracts a single value by
//! index, which is what playback needs when it seeks to an arbitrary time.

use bitvec::prelude::*;
use num_traits::{PrimInt, ToPrimitive, Unsigned};

use crate::error::CurveCodecError;

/// The widest value this kernel packs or unpacks.
pub const MAX_BIT_WIDTH: u8 = 32;

//==================================================================================
// 1. Generic Core Logic (The "Engine")
//==================================================================================

/// Encodes a slice of unsigned integers into a compact bit vector.
fn encode_slice<T>(data: &[T], bit_width: u8) -> Result<BitVec<u8, Lsb0>, CurveCodecError>
where
    T: PrimInt + Unsigned + ToPrimitive,
{
    if bit_width == 0 || bit_width > MAX_BIT_WIDTH || bit_width as usize > std::mem::size_of::<T>() * 8 {
        return Err(CurveCodecError::BitpackEncodeError(0, bit_width));
    }

    let max_val = (1u64 << bit_width) - 1;
    let mut bit_vec = BitVec::<u8, Lsb0>::with_capacity(data.len() * bit_width as usize);

    for &val in data {
        let val_u64 = val.to_u64().ok_or(CurveCodecError::BitpackEncodeError(u64::MAX, bit_width))?;
        if val_u64 > max_val {
            return Err(CurveCodecError::BitpackEncodeError(val_u64, bit_width));
        }
        bit_vec.extend_from_bitslice(&val_u64.view_bits::<Lsb0>()[..bit_width as usize]);
    }

    Ok(bit_vec)
}

//==================================================================================
// 2. Public API
//==================================================================================

/// Number of bytes occupied by `num_values` values packed at `bit_width`.
pub fn packed_len(num_values: usize, bit_width: u8) -> usize {
    (num_values * bit_width as usize + 7) / 8
}

/// Packs `input_slice` at `bit_width` bits per value into `output_buf`.
/// The trailing partial byte, if any, is zero-padded.
pub fn encode<T>(input_slice: &[T], output_buf: &mut Vec<u8>, bit_width: u8) -> Result<(), CurveCodecError>
where
    T: PrimInt + Unsigned + ToPrimitive,
{
    output_buf.clear();
    let bit_vec = encode_slice(input_slice, bit_width)?;
    output_buf.extend_from_slice(bit_vec.as_raw_slice());
    Ok(())
}

/// Extracts the value at `index` from a buffer packed at `bit_width`.
pub fn read_one(input_bytes: &[u8], index: usize, bit_width: u8) -> Result<u32, CurveCodecError> {
    if bit_width == 0 {
        return Ok(0);
    }
    if bit_width > MAX_BIT_WIDTH {
        return Err(CurveCodecError::BitpackDecodeError);
    }

    let bits = BitSlice::<u8, Lsb0>::from_slice(input_bytes);
    let start = index * bit_width as usize;
    let end = start + bit_width as usize;
    if end > bits.len() {
        return Err(CurveCodecError::BitpackDecodeError);
    }

    // Manually reconstruct the integer from the bit chunk.
    let mut container = 0u64;
    for (i, bit) in bits[start..end].iter().by_vals().enumerate() {
        if bit {
            container |= 1 << i;
        }
    }
    u32::try_from(container).map_err(|_| CurveCodecError::BitpackDecodeError)
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
