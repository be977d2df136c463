// SWR - swr-runtime
// Module: String Extraction
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Reading host strings out of linear memory.
//!
//! A string is a byte span inside the memory area. Which text encoding the
//! bytes use is chosen per call site, since bindings to the same module may
//! expect different encodings.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use swr_error::{kinds, Error, Result};

use crate::memory::MemoryArea;

/// Text encoding of a string held in memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StringEncoding {
    /// UTF-8
    #[default]
    Utf8,
    /// UTF-16, little-endian code units
    Utf16,
    /// UTF-32, little-endian code points
    Utf32,
}

impl StringEncoding {
    /// Lower-case name, as accepted by [`FromStr`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "utf8",
            Self::Utf16 => "utf16",
            Self::Utf32 => "utf32",
        }
    }

    /// Decode `bytes` in this encoding.
    pub fn decode(self, bytes: &[u8]) -> Result<String> {
        match self {
            Self::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|e| kinds::invalid_encoding(self.name(), &e.to_string())),
            Self::Utf16 => {
                if bytes.len() % 2 != 0 {
                    return Err(kinds::invalid_encoding(self.name(), "odd byte length"));
                }
                let units = bytes
                    .chunks_exact(2)
                    .map(|unit| u16::from_le_bytes([unit[0], unit[1]]));
                char::decode_utf16(units)
                    .collect::<std::result::Result<String, _>>()
                    .map_err(|e| kinds::invalid_encoding(self.name(), &e.to_string()))
            }
            Self::Utf32 => {
                if bytes.len() % 4 != 0 {
                    return Err(kinds::invalid_encoding(
                        self.name(),
                        "byte length not a multiple of 4",
                    ));
                }
                bytes
                    .chunks_exact(4)
                    .map(|unit| {
                        let code = u32::from_le_bytes([unit[0], unit[1], unit[2], unit[3]]);
                        char::from_u32(code).ok_or_else(|| {
                            kinds::invalid_encoding(
                                self.name(),
                                &format!("invalid code point 0x{code:x}"),
                            )
                        })
                    })
                    .collect()
            }
        }
    }
}

impl fmt::Display for StringEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StringEncoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Self::Utf8),
            "utf16" | "utf-16" => Ok(Self::Utf16),
            "utf32" | "utf-32" => Ok(Self::Utf32),
            other => Err(Error::configuration_error(format!(
                "unknown string encoding `{other}`"
            ))),
        }
    }
}

/// Byte span of a string in linear memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringSpan {
    /// Address of the first byte
    pub offset: u32,
    /// Length in bytes
    pub length: u32,
}

impl StringSpan {
    /// Span packed into one `i64`: offset in the low 32 bits, length in the
    /// high 32 bits.
    #[must_use]
    pub fn from_packed(packed: i64) -> Self {
        let bits = packed as u64;
        Self {
            offset: bits as u32,
            length: (bits >> 32) as u32,
        }
    }

    /// Inverse of [`StringSpan::from_packed`].
    #[must_use]
    pub fn packed(self) -> i64 {
        ((u64::from(self.length) << 32) | u64::from(self.offset)) as i64
    }

    /// Decode the span out of `memory`.
    pub fn read(self, memory: &MemoryArea, encoding: StringEncoding) -> Result<String> {
        read_string(memory, self.offset, self.length, encoding)
    }
}

/// Decode `length` bytes at `offset` in `memory` as `encoding`.
pub fn read_string(
    memory: &MemoryArea,
    offset: u32,
    length: u32,
    encoding: StringEncoding,
) -> Result<String> {
    encoding.decode(memory.memory_view(offset, length)?)
}

#[cfg(test)]
mod tests {
    use swr_error::codes;

    use super::*;

    fn memory_with(offset: u32, bytes: &[u8]) -> MemoryArea {
        let mut memory = MemoryArea::new(1, 1).unwrap();
        memory.write_bytes(offset, bytes).unwrap();
        memory
    }

    #[test]
    fn test_utf8() {
        let memory = memory_with(8, "grüße".as_bytes());
        let length = "grüße".len() as u32;
        assert_eq!(read_string(&memory, 8, length, StringEncoding::Utf8).unwrap(), "grüße");
    }

    #[test]
    fn test_utf16_with_surrogate_pair() {
        let bytes: Vec<u8> = "a😀".encode_utf16().flat_map(u16::to_le_bytes).collect();
        let memory = memory_with(0, &bytes);
        let text = read_string(&memory, 0, bytes.len() as u32, StringEncoding::Utf16).unwrap();
        assert_eq!(text, "a😀");
    }

    #[test]
    fn test_utf32() {
        let bytes: Vec<u8> = "hé".chars().flat_map(|c| u32::from(c).to_le_bytes()).collect();
        let memory = memory_with(4, &bytes);
        assert_eq!(read_string(&memory, 4, 8, StringEncoding::Utf32).unwrap(), "hé");
    }

    #[test]
    fn test_same_bytes_differ_by_encoding() {
        let memory = memory_with(0, &[b'h', 0, b'i', 0]);
        assert_eq!(read_string(&memory, 0, 4, StringEncoding::Utf16).unwrap(), "hi");
        assert_eq!(read_string(&memory, 0, 4, StringEncoding::Utf8).unwrap(), "h\0i\0");
    }

    #[test]
    fn test_invalid_bytes_are_rejected() {
        let memory = memory_with(0, &[0xFF, 0xFE, 0x00, 0xD8, 0x00]);
        let error = read_string(&memory, 0, 2, StringEncoding::Utf8).unwrap_err();
        assert_eq!(error.code, codes::INVALID_ENCODING);
        // Lone high surrogate
        assert!(read_string(&memory, 2, 2, StringEncoding::Utf16).is_err());
        assert!(read_string(&memory, 0, 3, StringEncoding::Utf16).is_err());
        assert!(read_string(&memory, 0, 4, StringEncoding::Utf32).is_err());
    }

    #[test]
    fn test_span_outside_memory() {
        let memory = MemoryArea::new(1, 1).unwrap();
        let error = read_string(&memory, 65_530, 10, StringEncoding::Utf8).unwrap_err();
        assert_eq!(error.code, codes::MEMORY_OUT_OF_BOUNDS);
    }

    #[test]
    fn test_packed_span() {
        let span = StringSpan::from_packed((5i64 << 32) | 1024);
        assert_eq!(span, StringSpan { offset: 1024, length: 5 });
        assert_eq!(span.packed(), (5i64 << 32) | 1024);

        let high = StringSpan {
            offset: u32::MAX,
            length: u32::MAX,
        };
        assert_eq!(StringSpan::from_packed(high.packed()), high);
    }

    #[test]
    fn test_encoding_names() {
        assert_eq!("UTF-16".parse::<StringEncoding>().unwrap(), StringEncoding::Utf16);
        assert_eq!(StringEncoding::Utf32.to_string(), "utf32");
        assert!("latin1".parse::<StringEncoding>().is_err());
    }
}
