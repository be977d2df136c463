// SWR - swr-format
// Module: LEB128 Codec
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Variable-length integer codec.
//!
//! Each encoded byte carries seven value bits; the high bit marks that another
//! byte follows. Decoding works on whatever bytes are currently available and
//! reports `Ok(None)` when they end before the final byte, leaving it to the
//! caller to retry once more input has arrived.

use swr_error::{codes, Error, ErrorCategory, Result};

/// Longest encoding of a 64-bit value
pub const MAX_LEB128_BYTES: usize = 10;

const CONTINUATION: u8 = 0x80;
const VALUE_BITS: u8 = 0x7F;
const SIGN_BIT: u8 = 0x40;

const fn max_bytes(bits: u32) -> usize {
    ((bits + 6) / 7) as usize
}

fn overflow(bits: u32, signed: bool, offset: u64) -> Error {
    let kind = if signed { 's' } else { 'u' };
    Error::new(
        ErrorCategory::Parse,
        codes::LEB128_OVERFLOW,
        format!("integer too large for {kind}{bits} at offset 0x{offset:x}"),
    )
}

/// Decode an unsigned integer of at most `bits` bits from the front of `bytes`.
///
/// Returns the value and the number of bytes it occupied, `Ok(None)` when
/// `bytes` ends inside the encoding, or an error for an over-long encoding.
/// `offset` is only used for error messages.
pub fn decode_unsigned(bytes: &[u8], bits: u32, offset: u64) -> Result<Option<(u64, usize)>> {
    let limit = max_bytes(bits);
    let mut result = 0u64;

    for (index, &byte) in bytes.iter().take(limit).enumerate() {
        let shift = 7 * index as u32;
        let low = byte & VALUE_BITS;

        if index + 1 == limit {
            let remaining = bits - shift;
            if byte & CONTINUATION != 0 || (remaining < 7 && low >> remaining != 0) {
                return Err(overflow(bits, false, offset));
            }
        }

        result |= u64::from(low) << shift;
        if byte & CONTINUATION == 0 {
            return Ok(Some((result, index + 1)));
        }
    }

    Ok(None)
}

/// Decode a two's-complement signed integer of at most `bits` bits.
///
/// Same contract as [`decode_unsigned`]; unused bits in the final byte must
/// repeat the sign bit.
pub fn decode_signed(bytes: &[u8], bits: u32, offset: u64) -> Result<Option<(i64, usize)>> {
    let limit = max_bytes(bits);
    let mut result = 0i64;

    for (index, &byte) in bytes.iter().take(limit).enumerate() {
        let shift = 7 * index as u32;
        let low = byte & VALUE_BITS;

        if index + 1 == limit {
            let remaining = bits - shift;
            if byte & CONTINUATION != 0 {
                return Err(overflow(bits, true, offset));
            }
            if remaining < 7 {
                let upper = low >> (remaining - 1);
                if upper != 0 && upper != VALUE_BITS >> (remaining - 1) {
                    return Err(overflow(bits, true, offset));
                }
            }
        }

        result |= i64::from(low) << shift;
        if byte & CONTINUATION == 0 {
            let consumed = shift + 7;
            if consumed < 64 && byte & SIGN_BIT != 0 {
                result |= -1i64 << consumed;
            }
            return Ok(Some((result, index + 1)));
        }
    }

    Ok(None)
}

/// Append the unsigned encoding of `value` to `out`.
pub fn write_unsigned_into(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value as u8) & VALUE_BITS;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | CONTINUATION);
    }
}

/// Append the signed encoding of `value` to `out`.
pub fn write_signed_into(out: &mut Vec<u8>, mut value: i64) {
    loop {
        let byte = (value as u8) & VALUE_BITS;
        value >>= 7;
        let done = (value == 0 && byte & SIGN_BIT == 0) || (value == -1 && byte & SIGN_BIT != 0);
        if done {
            out.push(byte);
            return;
        }
        out.push(byte | CONTINUATION);
    }
}

/// Encode `value` as an unsigned LEB128 integer.
#[must_use]
pub fn write_unsigned(value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAX_LEB128_BYTES);
    write_unsigned_into(&mut out, value);
    out
}

/// Encode `value` as a signed LEB128 integer.
#[must_use]
pub fn write_signed(value: i64) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAX_LEB128_BYTES);
    write_signed_into(&mut out, value);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_known_encodings() {
        assert_eq!(decode_unsigned(&[0x00], 32, 0).unwrap(), Some((0, 1)));
        assert_eq!(decode_unsigned(&[0xE5, 0x8E, 0x26], 32, 0).unwrap(), Some((624_485, 3)));
        assert_eq!(decode_signed(&[0x7F], 32, 0).unwrap(), Some((-1, 1)));
        assert_eq!(decode_signed(&[0xC0, 0xBB, 0x78], 32, 0).unwrap(), Some((-123_456, 3)));
    }

    #[test]
    fn test_trailing_zero_padding_is_accepted() {
        assert_eq!(decode_unsigned(&[0x83, 0x00], 32, 0).unwrap(), Some((3, 2)));
        assert_eq!(decode_signed(&[0xFF, 0x7F], 32, 0).unwrap(), Some((-1, 2)));
    }

    #[test]
    fn test_truncated_input_is_incomplete_not_error() {
        assert_eq!(decode_unsigned(&[], 32, 0).unwrap(), None);
        assert_eq!(decode_unsigned(&[0x80, 0x80], 32, 0).unwrap(), None);
        assert_eq!(decode_signed(&[0xFF], 64, 0).unwrap(), None);
    }

    #[test]
    fn test_overlong_encodings_are_rejected() {
        // Six bytes for a 32-bit value
        assert!(decode_unsigned(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x00], 32, 0).is_err());
        // Unused high bits set in the last byte of a u32
        assert!(decode_unsigned(&[0xFF, 0xFF, 0xFF, 0xFF, 0x1F], 32, 0).is_err());
        assert_eq!(
            decode_unsigned(&[0xFF, 0xFF, 0xFF, 0xFF, 0x0F], 32, 0).unwrap(),
            Some((u64::from(u32::MAX), 5))
        );
        // Unused bits of an i32 that disagree with the sign
        assert!(decode_signed(&[0xFF, 0xFF, 0xFF, 0xFF, 0x4F], 32, 0).is_err());
        // Eleven bytes for a 64-bit value
        let mut too_long = vec![0x80; 10];
        too_long.push(0x00);
        assert!(decode_unsigned(&too_long, 64, 0).is_err());
    }

    #[test]
    fn test_write_known_encodings() {
        assert_eq!(write_unsigned(624_485), vec![0xE5, 0x8E, 0x26]);
        assert_eq!(write_signed(-123_456), vec![0xC0, 0xBB, 0x78]);
        assert_eq!(write_signed(63), vec![0x3F]);
        assert_eq!(write_signed(64), vec![0xC0, 0x00]);
        assert_eq!(write_signed(-64), vec![0x40]);
    }
}
