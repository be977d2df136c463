// SWR - swr-decoder
// Module: Entry Builders
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Builders for section entries that are decoded over several passes.
//!
//! Every builder keeps the fields it already decoded, so a `decode` call that
//! runs out of input (returning `Ok(false)`) can be repeated later and picks
//! up at the first missing field. `finalize` turns a complete builder into
//! the immutable entry.

use core::iter;

use swr_error::{codes, kinds, Error, ErrorCategory, Result};
use swr_format::{
    binary, ready,
    types::{GlobalType, Limits, TableType, ValueType},
    ByteSource, SliceReader,
};

use crate::{
    instructions::{decode_expression, Expression},
    limits::DecoderLimits,
    module::{
        CodeBody, CustomSection, DataSegment, Export, ExternalKind, Global, Import, ImportDesc,
        Name,
    },
    partial::{PartialBytes, PartialString, PartialValue, Pending},
};

/// Unwrap a `Some`, or report the builder as not ready yet.
macro_rules! step {
    ($e:expr) => {
        match $e {
            Some(value) => value,
            None => return Ok(false),
        }
    };
}

fn incomplete(what: &str) -> Error {
    Error::invalid_state(format!("{what} finalized before all of its fields were decoded"))
}

/// Global entry under construction
#[derive(Debug, Clone, Default)]
pub struct PartialGlobal {
    global_type: Option<GlobalType>,
    init:        Option<Expression>,
}

impl PartialGlobal {
    /// Decode the type, then the initializer expression.
    pub fn decode<S: ByteSource>(
        &mut self,
        source: &mut S,
        limits: &DecoderLimits,
    ) -> Result<bool> {
        if self.global_type.is_none() {
            self.global_type = Some(step!(GlobalType::decode(source)?));
        }
        if self.init.is_none() {
            self.init = Some(step!(decode_expression(source, limits)?));
        }
        Ok(true)
    }

    /// Freeze into a [`Global`].
    pub fn finalize(self) -> Result<Global> {
        match (self.global_type, self.init) {
            (Some(global_type), Some(init)) => Ok(Global { global_type, init }),
            _ => Err(incomplete("global")),
        }
    }
}

/// Data segment under construction
#[derive(Debug, Clone, Default)]
pub struct PartialData {
    flags:        Option<u32>,
    memory_index: Option<u32>,
    offset:       Option<Expression>,
    payload:      Pending<PartialBytes>,
    bytes:        Option<Box<[u8]>>,
}

impl PartialData {
    /// Decode flags, memory index, offset expression and payload in order.
    ///
    /// Flags `0` and `2` are active segments (memory 0 and an explicit
    /// memory); `1` is passive and has neither index nor offset.
    pub fn decode<S: ByteSource>(
        &mut self,
        source: &mut S,
        limits: &DecoderLimits,
    ) -> Result<bool> {
        let flags = match self.flags {
            Some(flags) => flags,
            None => {
                let offset = source.offset();
                let flags = step!(source.read_var_u32()?);
                if flags > binary::DATA_ACTIVE_EXPLICIT {
                    return Err(kinds::unexpected_element("data segment flags", offset));
                }
                self.flags = Some(flags);
                flags
            },
        };

        if self.memory_index.is_none() {
            self.memory_index = Some(if flags == binary::DATA_ACTIVE_EXPLICIT {
                step!(source.read_var_u32()?)
            } else {
                0
            });
        }
        if self.offset.is_none() {
            self.offset = Some(if flags == binary::DATA_PASSIVE {
                Expression::empty()
            } else {
                step!(decode_expression(source, limits)?)
            });
        }
        if self.bytes.is_none() {
            self.bytes = Some(step!(self.payload.decode(source, limits.max_payload_size)?));
        }
        Ok(true)
    }

    /// Freeze into a [`DataSegment`].
    pub fn finalize(self) -> Result<DataSegment> {
        match (self.flags, self.memory_index, self.offset, self.bytes) {
            (Some(flags), Some(memory_index), Some(offset), Some(bytes)) => Ok(DataSegment {
                memory_index,
                offset,
                bytes,
                passive: flags == binary::DATA_PASSIVE,
            }),
            _ => Err(incomplete("data segment")),
        }
    }
}

/// Local declarations of a function body
///
/// Stored as run-length `(count, type)` groups while decoding.
#[derive(Debug, Clone, Default)]
pub struct PartialLocals {
    group_count: Option<u32>,
    groups:      Vec<(u32, ValueType)>,
    total:       u64,
}

impl PartialLocals {
    /// Decode the group count and as many groups as are available.
    pub fn decode<S: ByteSource>(
        &mut self,
        source: &mut S,
        limits: &DecoderLimits,
    ) -> Result<bool> {
        let group_count = match self.group_count {
            Some(count) => count,
            None => {
                let count = step!(source.read_var_u32()?);
                self.group_count = Some(count);
                count
            },
        };

        while self.groups.len() < group_count as usize {
            let offset = source.offset();
            let group = source.attempt(|reader| {
                let count = ready!(reader.read_var_u32()?);
                let value_type = ready!(ValueType::decode(reader)?);
                Ok(Some((count, value_type)))
            })?;
            let (count, value_type) = step!(group);

            self.total += u64::from(count);
            if self.total > u64::from(limits.max_locals) {
                return Err(kinds::limit_exceeded(
                    "local count",
                    u64::from(limits.max_locals),
                    offset,
                ));
            }
            self.groups.push((count, value_type));
        }
        Ok(true)
    }

    /// Run-length groups decoded so far.
    #[must_use]
    pub fn groups(&self) -> &[(u32, ValueType)] {
        &self.groups
    }

    /// Expand the groups into one type per local slot, in declaration order.
    pub fn finalize(self) -> Result<Box<[ValueType]>> {
        match self.group_count {
            Some(count) if self.groups.len() == count as usize => Ok(self
                .groups
                .iter()
                .flat_map(|&(count, value_type)| iter::repeat(value_type).take(count as usize))
                .collect()),
            _ => Err(incomplete("local declarations")),
        }
    }
}

/// Function body under construction
///
/// The body bytes are buffered first; locals and instructions are decoded
/// once all of them are present.
#[derive(Debug, Clone, Default)]
pub struct PartialCode {
    size:        Option<u32>,
    body_offset: u64,
    body:        PartialBytes,
    decoded:     Option<(Box<[ValueType]>, Expression)>,
}

impl PartialCode {
    /// Decode the body size, buffer the body, then decode it.
    pub fn decode<S: ByteSource>(
        &mut self,
        source: &mut S,
        limits: &DecoderLimits,
    ) -> Result<bool> {
        let size = match self.size {
            Some(size) => size,
            None => {
                let offset = source.offset();
                let size = step!(source.read_var_u32()?);
                if size > limits.max_payload_size {
                    return Err(kinds::limit_exceeded(
                        "code body size",
                        u64::from(limits.max_payload_size),
                        offset,
                    ));
                }
                self.size = Some(size);
                self.body_offset = source.offset();
                self.body = PartialBytes::new(size as usize);
                size
            },
        };

        if self.decoded.is_none() {
            if !self.body.fill_from(source) {
                tracing::trace!(
                    remaining = self.body.bytes_remaining(),
                    "code body waiting for input"
                );
                return Ok(false);
            }
            let bytes = core::mem::take(&mut self.body).finalize()?;
            self.decoded = Some(decode_body(&bytes, self.body_offset, size, limits)?);
        }
        Ok(true)
    }

    /// Freeze into a [`CodeBody`].
    pub fn finalize(self) -> Result<CodeBody> {
        match (self.size, self.decoded) {
            (Some(size), Some((locals, body))) => Ok(CodeBody { size, locals, body }),
            _ => Err(incomplete("code body")),
        }
    }
}

fn decode_body(
    bytes: &[u8],
    base_offset: u64,
    size: u32,
    limits: &DecoderLimits,
) -> Result<(Box<[ValueType]>, Expression)> {
    let mut reader = SliceReader::with_base_offset(bytes, base_offset);

    let mut locals = PartialLocals::default();
    if !locals.decode(&mut reader, limits)? {
        return Err(kinds::unexpected_element("end of code body", reader.offset()));
    }
    let locals = locals.finalize()?;

    let end = base_offset + bytes.len() as u64;
    let body = decode_expression(&mut reader, limits)?
        .ok_or_else(|| kinds::unexpected_element("end of code body", end))?;

    if !reader.is_empty() {
        return Err(kinds::section_size_mismatch(
            binary::CODE_SECTION_ID,
            size,
            reader.position() as u64,
        ));
    }
    Ok((locals, body))
}

/// Import entry under construction
#[derive(Debug, Clone, Default)]
pub struct PartialImport {
    module_field: Pending<PartialString>,
    module:       Option<Name>,
    name_field:   Pending<PartialString>,
    name:         Option<Name>,
    desc:         Option<ImportDesc>,
}

impl PartialImport {
    /// Decode module name, field name and description in order.
    pub fn decode<S: ByteSource>(
        &mut self,
        source: &mut S,
        limits: &DecoderLimits,
    ) -> Result<bool> {
        if self.module.is_none() {
            self.module = Some(step!(self.module_field.decode(source, limits.max_payload_size)?));
        }
        if self.name.is_none() {
            self.name = Some(step!(self.name_field.decode(source, limits.max_payload_size)?));
        }
        if self.desc.is_none() {
            self.desc = Some(step!(decode_import_desc(source)?));
        }
        Ok(true)
    }

    /// Freeze into an [`Import`].
    pub fn finalize(self) -> Result<Import> {
        match (self.module, self.name, self.desc) {
            (Some(module), Some(name), Some(desc)) => Ok(Import { module, name, desc }),
            _ => Err(incomplete("import")),
        }
    }
}

fn decode_import_desc<S: ByteSource>(source: &mut S) -> Result<Option<ImportDesc>> {
    source.attempt(|reader| {
        let offset = reader.offset();
        let kind = ready!(reader.read_byte());
        let desc = match kind {
            binary::EXTERNAL_FUNCTION => ImportDesc::Function {
                type_index: ready!(reader.read_var_u32()?),
            },
            binary::EXTERNAL_TABLE => ImportDesc::Table(ready!(TableType::decode(reader)?)),
            binary::EXTERNAL_MEMORY => {
                let Limits { min, max } = ready!(Limits::decode(reader)?);
                ImportDesc::Memory {
                    min_pages: min,
                    max_pages: max,
                }
            },
            binary::EXTERNAL_GLOBAL => ImportDesc::Global(ready!(GlobalType::decode(reader)?)),
            binary::EXTERNAL_TAG => {
                // Tag attribute, always zero
                let _attribute = ready!(reader.read_byte());
                ImportDesc::Unknown {
                    kind,
                    type_index: ready!(reader.read_var_u32()?),
                }
            },
            _ => return Err(kinds::unexpected_element("import kind", offset)),
        };
        Ok(Some(desc))
    })
}

/// Export entry under construction
#[derive(Debug, Clone, Default)]
pub struct PartialExport {
    name_field: Pending<PartialString>,
    name:       Option<Name>,
    target:     Option<(ExternalKind, u32)>,
}

impl PartialExport {
    /// Decode the name, then kind and index.
    pub fn decode<S: ByteSource>(
        &mut self,
        source: &mut S,
        limits: &DecoderLimits,
    ) -> Result<bool> {
        if self.name.is_none() {
            self.name = Some(step!(self.name_field.decode(source, limits.max_payload_size)?));
        }
        if self.target.is_none() {
            let target = source.attempt(|reader| {
                let offset = reader.offset();
                let kind = ExternalKind::from_byte(ready!(reader.read_byte()), offset)?;
                let index = ready!(reader.read_var_u32()?);
                Ok(Some((kind, index)))
            })?;
            self.target = Some(step!(target));
        }
        Ok(true)
    }

    /// Freeze into an [`Export`].
    pub fn finalize(self) -> Result<Export> {
        match (self.name, self.target) {
            (Some(name), Some((kind, index))) => Ok(Export { name, kind, index }),
            _ => Err(incomplete("export")),
        }
    }
}

/// Custom section under construction
///
/// The payload is everything between the name and the end of the section.
#[derive(Debug, Clone, Default)]
pub struct PartialCustom {
    name_field: Pending<PartialString>,
    name:       Option<Name>,
    payload:    PartialBytes,
    bytes:      Option<Box<[u8]>>,
}

impl PartialCustom {
    /// Decode the name, then the payload up to `section_end`.
    pub fn decode<S: ByteSource>(
        &mut self,
        source: &mut S,
        section_end: u64,
        limits: &DecoderLimits,
    ) -> Result<bool> {
        if self.name.is_none() {
            let name = step!(self.name_field.decode(source, limits.max_payload_size)?);
            let offset = source.offset();
            let remaining = section_end.checked_sub(offset).ok_or_else(|| {
                Error::new(
                    ErrorCategory::Parse,
                    codes::SECTION_SIZE_MISMATCH,
                    format!(
                        "custom section name `{name}` runs past the section end at offset \
                         0x{section_end:x}"
                    ),
                )
            })?;
            if remaining > u64::from(limits.max_payload_size) {
                return Err(kinds::limit_exceeded(
                    "custom section payload",
                    u64::from(limits.max_payload_size),
                    offset,
                ));
            }
            self.payload = PartialBytes::new(remaining as usize);
            self.name = Some(name);
        }
        if self.bytes.is_none() {
            if !self.payload.fill_from(source) {
                return Ok(false);
            }
            self.bytes = Some(core::mem::take(&mut self.payload).finalize()?);
        }
        Ok(true)
    }

    /// Freeze into a [`CustomSection`].
    pub fn finalize(self) -> Result<CustomSection> {
        match (self.name, self.bytes) {
            (Some(name), Some(payload)) => Ok(CustomSection { name, payload }),
            _ => Err(incomplete("custom section")),
        }
    }
}

#[cfg(test)]
mod tests {
    use swr_format::ChunkedStream;

    use super::*;
    use crate::instructions::Instruction;

    fn limits() -> DecoderLimits {
        DecoderLimits::default()
    }

    #[test]
    fn test_locals_expand_run_length_groups() {
        // (3 x i32), (1 x f64)
        let mut reader = SliceReader::new(&[0x02, 0x03, 0x7F, 0x01, 0x7C]);
        let mut locals = PartialLocals::default();
        assert!(locals.decode(&mut reader, &limits()).unwrap());
        assert_eq!(locals.groups(), &[(3, ValueType::I32), (1, ValueType::F64)]);
        assert_eq!(
            &*locals.finalize().unwrap(),
            &[ValueType::I32, ValueType::I32, ValueType::I32, ValueType::F64]
        );
    }

    #[test]
    fn test_locals_limit() {
        let limits = DecoderLimits {
            max_locals: 10,
            ..DecoderLimits::default()
        };
        let mut reader = SliceReader::new(&[0x02, 0x08, 0x7F, 0x08, 0x7E]);
        let error = PartialLocals::default().decode(&mut reader, &limits).unwrap_err();
        assert_eq!(error.code, codes::LIMIT_EXCEEDED);
    }

    #[test]
    fn test_global_resumes_after_split() {
        let mut stream = ChunkedStream::new();
        let mut global = PartialGlobal::default();

        stream.push(&[0x7F, 0x00, 0x41]);
        assert!(!global.decode(&mut stream, &limits()).unwrap());
        // The type is kept, the expression has not consumed anything
        assert_eq!(stream.offset(), 2);

        stream.push(&[0x2A, 0x0B]);
        assert!(global.decode(&mut stream, &limits()).unwrap());
        let global = global.finalize().unwrap();
        assert!(!global.global_type.mutable);
        assert_eq!(&*global.init, &[Instruction::I32Const(42)]);
    }

    #[test]
    fn test_finalize_early_is_invalid_state() {
        let error = PartialGlobal::default().finalize().unwrap_err();
        assert!(error.is_runtime_error());
    }

    #[test]
    fn test_data_segment_encodings() {
        // Active, memory 0, offset i32.const 8, payload "hi"
        let mut reader = SliceReader::new(&[0x00, 0x41, 0x08, 0x0B, 0x02, b'h', b'i']);
        let mut data = PartialData::default();
        assert!(data.decode(&mut reader, &limits()).unwrap());
        let data = data.finalize().unwrap();
        assert_eq!(data.memory_index, 0);
        assert!(!data.passive);
        assert_eq!(&*data.offset, &[Instruction::I32Const(8)]);
        assert_eq!(&*data.bytes, b"hi");

        // Passive
        let mut reader = SliceReader::new(&[0x01, 0x01, 0xAA]);
        let mut data = PartialData::default();
        assert!(data.decode(&mut reader, &limits()).unwrap());
        let data = data.finalize().unwrap();
        assert!(data.passive);
        assert!(data.offset.is_empty());

        // Active, explicit memory 1
        let mut reader = SliceReader::new(&[0x02, 0x01, 0x41, 0x00, 0x0B, 0x00]);
        let mut data = PartialData::default();
        assert!(data.decode(&mut reader, &limits()).unwrap());
        assert_eq!(data.finalize().unwrap().memory_index, 1);

        let mut reader = SliceReader::new(&[0x03]);
        assert!(PartialData::default().decode(&mut reader, &limits()).is_err());
    }

    #[test]
    fn test_data_payload_split_across_chunks() {
        let mut stream = ChunkedStream::new();
        let mut data = PartialData::default();
        stream.push(&[0x01, 0x04, 1, 2]);
        assert!(!data.decode(&mut stream, &limits()).unwrap());
        stream.push(&[3]);
        assert!(!data.decode(&mut stream, &limits()).unwrap());
        stream.push(&[4, 0xFF]);
        assert!(data.decode(&mut stream, &limits()).unwrap());
        assert_eq!(&*data.finalize().unwrap().bytes, &[1, 2, 3, 4]);
        assert_eq!(stream.peek(), &[0xFF]);
    }

    #[test]
    fn test_code_body() {
        // size 7: one local group (1 x i64), local.get 0, drop, end
        let bytes = [0x07, 0x01, 0x01, 0x7E, 0x20, 0x00, 0x1A, 0x0B];
        let mut stream = ChunkedStream::new();
        let mut code = PartialCode::default();
        stream.push(&bytes[..3]);
        assert!(!code.decode(&mut stream, &limits()).unwrap());
        stream.push(&bytes[3..]);
        assert!(code.decode(&mut stream, &limits()).unwrap());

        let code = code.finalize().unwrap();
        assert_eq!(code.size, 7);
        assert_eq!(&*code.locals, &[ValueType::I64]);
        assert_eq!(&*code.body, &[Instruction::LocalGet(0), Instruction::Drop]);
    }

    #[test]
    fn test_code_body_with_trailing_bytes_is_malformed() {
        let mut reader = SliceReader::new(&[0x03, 0x00, 0x0B, 0x01]);
        let error = PartialCode::default().decode(&mut reader, &limits()).unwrap_err();
        assert_eq!(error.code, codes::SECTION_SIZE_MISMATCH);
    }

    #[test]
    fn test_code_body_missing_end_is_malformed() {
        let mut reader = SliceReader::new(&[0x02, 0x00, 0x01]);
        let error = PartialCode::default().decode(&mut reader, &limits()).unwrap_err();
        assert_eq!(error.code, codes::UNEXPECTED_ELEMENT);
    }

    #[test]
    fn test_imports() {
        let mut reader = SliceReader::new(&[
            0x03, b'e', b'n', b'v', 0x03, b'm', b'e', b'm', 0x02, 0x01, 0x01, 0x02, // memory 1..2
            0x03, b'e', b'n', b'v', 0x03, b't', b'a', b'g', 0x04, 0x00, 0x05, // tag type 5
        ]);
        let mut import = PartialImport::default();
        assert!(import.decode(&mut reader, &limits()).unwrap());
        let memory = import.finalize().unwrap();
        assert_eq!(memory.module, "env");
        assert_eq!(
            memory.desc,
            ImportDesc::Memory {
                min_pages: 1,
                max_pages: Some(2),
            }
        );

        let mut import = PartialImport::default();
        assert!(import.decode(&mut reader, &limits()).unwrap());
        assert_eq!(
            import.finalize().unwrap().desc,
            ImportDesc::Unknown {
                kind:       0x04,
                type_index: 5,
            }
        );
    }

    #[test]
    fn test_unknown_import_kind() {
        let mut reader = SliceReader::new(&[0x01, b'a', 0x01, b'b', 0x07, 0x00]);
        let error = PartialImport::default().decode(&mut reader, &limits()).unwrap_err();
        assert_eq!(error.code, codes::UNEXPECTED_ELEMENT);
    }

    #[test]
    fn test_export() {
        let mut reader = SliceReader::new(&[0x03, b'r', b'u', b'n', 0x00, 0x03]);
        let mut export = PartialExport::default();
        assert!(export.decode(&mut reader, &limits()).unwrap());
        let export = export.finalize().unwrap();
        assert_eq!(export.name, "run");
        assert_eq!(export.kind, ExternalKind::Function);
        assert_eq!(export.index, 3);
    }

    #[test]
    fn test_custom_section_payload_runs_to_section_end() {
        let bytes = [0x04, b'n', b'a', b'm', b'e', 1, 2, 3];
        let mut stream = ChunkedStream::new();
        let mut custom = PartialCustom::default();
        stream.push(&bytes[..6]);
        assert!(!custom.decode(&mut stream, bytes.len() as u64, &limits()).unwrap());
        stream.push(&bytes[6..]);
        assert!(custom.decode(&mut stream, bytes.len() as u64, &limits()).unwrap());
        let custom = custom.finalize().unwrap();
        assert_eq!(custom.name, "name");
        assert_eq!(&*custom.payload, &[1, 2, 3]);
    }
}
