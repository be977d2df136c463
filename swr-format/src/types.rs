// SWR - swr-format
// Module: WebAssembly Types
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Value types, block types, limits and the composite types built from them.

use core::fmt;

use swr_error::{kinds, Result};

use crate::{binary, ready, ByteSource};

/// WebAssembly value types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// 32-bit integer
    I32,
    /// 64-bit integer
    I64,
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
    /// 128-bit vector
    V128,
    /// Function reference
    FuncRef,
    /// External reference
    ExternRef,
}

impl ValueType {
    /// Map a type byte to a value type.
    ///
    /// `offset` is the position of `byte`, used in the error message.
    pub fn from_byte(byte: u8, offset: u64) -> Result<Self> {
        Self::try_from_byte(byte).ok_or_else(|| kinds::invalid_value_type(byte, offset))
    }

    /// Map a type byte to a value type, `None` if it names none.
    #[must_use]
    pub const fn try_from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            binary::I32_TYPE => Self::I32,
            binary::I64_TYPE => Self::I64,
            binary::F32_TYPE => Self::F32,
            binary::F64_TYPE => Self::F64,
            binary::V128_TYPE => Self::V128,
            binary::FUNCREF_TYPE => Self::FuncRef,
            binary::EXTERNREF_TYPE => Self::ExternRef,
            _ => return None,
        })
    }

    /// Binary encoding of this type.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        match self {
            Self::I32 => binary::I32_TYPE,
            Self::I64 => binary::I64_TYPE,
            Self::F32 => binary::F32_TYPE,
            Self::F64 => binary::F64_TYPE,
            Self::V128 => binary::V128_TYPE,
            Self::FuncRef => binary::FUNCREF_TYPE,
            Self::ExternRef => binary::EXTERNREF_TYPE,
        }
    }

    /// Text format name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::V128 => "v128",
            Self::FuncRef => "funcref",
            Self::ExternRef => "externref",
        }
    }

    /// Whether this is one of the two reference types.
    #[must_use]
    pub const fn is_reference(self) -> bool {
        matches!(self, Self::FuncRef | Self::ExternRef)
    }

    /// Read a value type byte. Nothing is consumed on error.
    pub fn decode<S: ByteSource>(source: &mut S) -> Result<Option<Self>> {
        let byte = ready!(source.peek().first().copied());
        let value_type = Self::from_byte(byte, source.offset())?;
        source.skip(1);
        Ok(Some(value_type))
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Signature of a `block`, `loop` or `if`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    /// No parameters and no results
    Empty,
    /// No parameters and a single result
    Value(ValueType),
    /// Signature taken from the type section
    TypeIndex(u32),
}

impl BlockType {
    /// Read a block type.
    ///
    /// The encoding is either `0x40`, a value type byte, or a non-negative
    /// 33-bit signed LEB128 type index. Anything else is malformed.
    pub fn decode<S: ByteSource>(source: &mut S) -> Result<Option<Self>> {
        let byte = ready!(source.peek().first().copied());
        let offset = source.offset();

        if byte == binary::BLOCK_TYPE_EMPTY {
            source.skip(1);
            return Ok(Some(Self::Empty));
        }
        if let Some(value_type) = ValueType::try_from_byte(byte) {
            source.skip(1);
            return Ok(Some(Self::Value(value_type)));
        }

        let decoded = crate::leb128::decode_signed(source.peek(), 33, offset)?;
        let (index, len) = ready!(decoded);
        let index = u32::try_from(index).map_err(|_| kinds::invalid_block_type(byte, offset))?;
        source.skip(len);
        Ok(Some(Self::TypeIndex(index)))
    }
}

/// Size bounds of a memory (in pages) or table (in elements)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Limits {
    /// Initial size
    pub min: u32,
    /// Optional maximum size
    pub max: Option<u32>,
}

impl Limits {
    /// Read a flag byte, a minimum and, if flagged, a maximum.
    pub fn decode<S: ByteSource>(source: &mut S) -> Result<Option<Self>> {
        source.attempt(|r| {
            let offset = r.offset();
            let flag = ready!(r.read_byte());
            let min = ready!(r.read_var_u32()?);
            let max = match flag {
                binary::LIMITS_MIN_ONLY => None,
                binary::LIMITS_MIN_MAX => Some(ready!(r.read_var_u32()?)),
                _ => return Err(kinds::unexpected_element("limits flag", offset)),
            };
            Ok(Some(Self { min, max }))
        })
    }
}

/// Function signature
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FuncType {
    /// Parameter types in order
    pub params:  Box<[ValueType]>,
    /// Result types in order
    pub results: Box<[ValueType]>,
}

impl FuncType {
    /// Signature from parameter and result lists.
    #[must_use]
    pub fn new(params: impl Into<Box<[ValueType]>>, results: impl Into<Box<[ValueType]>>) -> Self {
        Self {
            params:  params.into(),
            results: results.into(),
        }
    }

    /// Read a `0x60` function type. The entry is consumed only when complete.
    pub fn decode<S: ByteSource>(source: &mut S) -> Result<Option<Self>> {
        source.attempt(|r| {
            let offset = r.offset();
            let form = ready!(r.read_byte());
            if form != binary::FUNC_TYPE_FORM {
                return Err(kinds::unexpected_element("function type form", offset));
            }
            let params = ready!(decode_value_types(r)?);
            let results = ready!(decode_value_types(r)?);
            Ok(Some(Self { params, results }))
        })
    }
}

impl fmt::Display for FuncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_list(f, &self.params)?;
        f.write_str(" -> ")?;
        write_list(f, &self.results)
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, types: &[ValueType]) -> fmt::Result {
    f.write_str("(")?;
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{ty}")?;
    }
    f.write_str(")")
}

fn decode_value_types<S: ByteSource>(source: &mut S) -> Result<Option<Box<[ValueType]>>> {
    let count = ready!(source.read_var_u32()?) as usize;
    // A count is not trusted for allocation until its bytes have arrived
    let mut types = Vec::with_capacity(count.min(source.available()));
    for _ in 0..count {
        types.push(ready!(ValueType::decode(source)?));
    }
    Ok(Some(types.into_boxed_slice()))
}

/// Table element type and size bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableType {
    /// Reference type stored in the table
    pub element: ValueType,
    /// Size bounds in elements
    pub limits:  Limits,
}

impl TableType {
    /// Read a reference type followed by limits.
    pub fn decode<S: ByteSource>(source: &mut S) -> Result<Option<Self>> {
        source.attempt(|r| {
            let offset = r.offset();
            let element = ready!(ValueType::decode(r)?);
            if !element.is_reference() {
                return Err(kinds::invalid_value_type(element.to_byte(), offset));
            }
            let limits = ready!(Limits::decode(r)?);
            Ok(Some(Self { element, limits }))
        })
    }
}

/// Global value type and mutability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlobalType {
    /// Type of the stored value
    pub value_type: ValueType,
    /// Whether `global.set` may change the value
    pub mutable:    bool,
}

impl GlobalType {
    /// Read a value type followed by a `0x00`/`0x01` mutability byte.
    pub fn decode<S: ByteSource>(source: &mut S) -> Result<Option<Self>> {
        source.attempt(|r| {
            let value_type = ready!(ValueType::decode(r)?);
            let offset = r.offset();
            let mutable = match ready!(r.read_byte()) {
                0x00 => false,
                0x01 => true,
                _ => return Err(kinds::unexpected_element("mutability flag", offset)),
            };
            Ok(Some(Self {
                value_type,
                mutable,
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChunkedStream, SliceReader};

    #[test]
    fn test_value_type_bytes() {
        for ty in [
            ValueType::I32,
            ValueType::I64,
            ValueType::F32,
            ValueType::F64,
            ValueType::V128,
            ValueType::FuncRef,
            ValueType::ExternRef,
        ] {
            assert_eq!(ValueType::from_byte(ty.to_byte(), 0).unwrap(), ty);
        }
        let error = ValueType::from_byte(0x12, 9).unwrap_err();
        assert!(error.is_parse_error());
    }

    #[test]
    fn test_block_type_forms() {
        let mut reader = SliceReader::new(&[0x40, 0x7C, 0x05]);
        assert_eq!(BlockType::decode(&mut reader).unwrap(), Some(BlockType::Empty));
        assert_eq!(
            BlockType::decode(&mut reader).unwrap(),
            Some(BlockType::Value(ValueType::F64))
        );
        assert_eq!(BlockType::decode(&mut reader).unwrap(), Some(BlockType::TypeIndex(5)));
    }

    #[test]
    fn test_negative_block_type_is_malformed() {
        // 0x7A names no value type and decodes to -6
        let mut reader = SliceReader::new(&[0x7A]);
        let error = BlockType::decode(&mut reader).unwrap_err();
        assert_eq!(error.code, swr_error::codes::INVALID_BLOCK_TYPE);
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_func_type_waits_for_all_results() {
        let mut stream = ChunkedStream::new();
        stream.push(&[0x60, 0x02, 0x7F, 0x7E, 0x01]);
        assert_eq!(FuncType::decode(&mut stream).unwrap(), None);
        assert_eq!(stream.offset(), 0);

        stream.push(&[0x7D]);
        let func = FuncType::decode(&mut stream).unwrap().unwrap();
        assert_eq!(func, FuncType::new(vec![ValueType::I32, ValueType::I64], vec![ValueType::F32]));
        assert_eq!(func.to_string(), "(i32, i64) -> (f32)");
    }

    #[test]
    fn test_limits_and_globals() {
        let mut reader = SliceReader::new(&[0x01, 0x02, 0x04, 0x00, 0x10, 0x7F, 0x01]);
        assert_eq!(
            Limits::decode(&mut reader).unwrap(),
            Some(Limits { min: 2, max: Some(4) })
        );
        assert_eq!(Limits::decode(&mut reader).unwrap(), Some(Limits { min: 16, max: None }));
        assert_eq!(
            GlobalType::decode(&mut reader).unwrap(),
            Some(GlobalType {
                value_type: ValueType::I32,
                mutable:    true,
            })
        );
    }

    #[test]
    fn test_table_requires_reference_type() {
        let mut reader = SliceReader::new(&[0x7F, 0x00, 0x01]);
        assert!(TableType::decode(&mut reader).is_err());

        let mut reader = SliceReader::new(&[0x70, 0x00, 0x01]);
        let table = TableType::decode(&mut reader).unwrap().unwrap();
        assert_eq!(table.element, ValueType::FuncRef);
        assert_eq!(table.limits.min, 1);
    }
}
