// SWR - swr-decoder
// Module: Module Decoder
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Resumable module decoder.
//!
//! [`ModuleDecoder`] walks header, section headers and section entries as a
//! state machine. [`ModuleDecoder::advance`] runs as far as the bytes in the
//! source allow and returns; all progress lives in the decoder, so the same
//! call can be repeated after more bytes were added to the source.

use swr_error::{kinds, Result};
use swr_format::{
    binary, ready,
    types::{FuncType, Limits, TableType},
    ByteSource,
};
use tracing::{debug, trace, warn};

use crate::{
    builders::{
        PartialCode, PartialCustom, PartialData, PartialExport, PartialGlobal, PartialImport,
    },
    limits::DecoderLimits,
    module::{CodeBody, CustomSection, DataSegment, Export, Global, Import, Module},
};

/// Where decoding stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Stopped inside the header, a section header or a section
    NeedMoreInput,
    /// Every byte so far was consumed and the last section is complete; the
    /// module may end here
    SectionBoundary,
}

/// Position and declared size of the section being decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SectionBounds {
    id:    u8,
    start: u64,
    size:  u32,
}

impl SectionBounds {
    fn end(self) -> u64 {
        self.start + u64::from(self.size)
    }

    fn name(self) -> &'static str {
        binary::section_name(self.id).unwrap_or("unknown")
    }

    /// Fail if decoding has moved past the end of the section.
    fn check_within(self, offset: u64) -> Result<()> {
        if offset > self.end() {
            return Err(kinds::section_size_mismatch(
                self.id,
                self.size,
                offset - self.start,
            ));
        }
        Ok(())
    }
}

/// Builder for the next entry of a vector section
#[derive(Debug, Clone)]
enum EntryBuilder {
    Type,
    Import(PartialImport),
    Function,
    Table,
    Memory,
    Global(PartialGlobal),
    Export(PartialExport),
    Code(PartialCode),
    Data(PartialData),
}

impl EntryBuilder {
    fn for_section(id: u8) -> Option<Self> {
        Some(match id {
            binary::TYPE_SECTION_ID => Self::Type,
            binary::IMPORT_SECTION_ID => Self::Import(PartialImport::default()),
            binary::FUNCTION_SECTION_ID => Self::Function,
            binary::TABLE_SECTION_ID => Self::Table,
            binary::MEMORY_SECTION_ID => Self::Memory,
            binary::GLOBAL_SECTION_ID => Self::Global(PartialGlobal::default()),
            binary::EXPORT_SECTION_ID => Self::Export(PartialExport::default()),
            binary::CODE_SECTION_ID => Self::Code(PartialCode::default()),
            binary::DATA_SECTION_ID => Self::Data(PartialData::default()),
            _ => return None,
        })
    }

    /// Decode one entry into `parts`. Returns whether the entry completed.
    fn decode<S: ByteSource>(
        &mut self,
        source: &mut S,
        limits: &DecoderLimits,
        parts: &mut ModuleParts,
    ) -> Result<bool> {
        match self {
            Self::Type => Ok(push(&mut parts.types, FuncType::decode(source)?)),
            Self::Function => Ok(push(&mut parts.functions, source.read_var_u32()?)),
            Self::Table => Ok(push(&mut parts.tables, TableType::decode(source)?)),
            Self::Memory => Ok(push(&mut parts.memories, Limits::decode(source)?)),
            Self::Import(partial) => {
                if !partial.decode(source, limits)? {
                    return Ok(false);
                }
                parts.imports.push(core::mem::take(partial).finalize()?);
                Ok(true)
            },
            Self::Global(partial) => {
                if !partial.decode(source, limits)? {
                    return Ok(false);
                }
                parts.globals.push(core::mem::take(partial).finalize()?);
                Ok(true)
            },
            Self::Export(partial) => {
                if !partial.decode(source, limits)? {
                    return Ok(false);
                }
                parts.exports.push(core::mem::take(partial).finalize()?);
                Ok(true)
            },
            Self::Code(partial) => {
                if !partial.decode(source, limits)? {
                    return Ok(false);
                }
                parts.code.push(core::mem::take(partial).finalize()?);
                Ok(true)
            },
            Self::Data(partial) => {
                if !partial.decode(source, limits)? {
                    return Ok(false);
                }
                parts.data.push(core::mem::take(partial).finalize()?);
                Ok(true)
            },
        }
    }
}

fn push<T>(entries: &mut Vec<T>, entry: Option<T>) -> bool {
    match entry {
        Some(entry) => {
            entries.push(entry);
            true
        },
        None => false,
    }
}

/// Entries collected so far, frozen into a [`Module`] at the end
#[derive(Debug, Clone, Default)]
struct ModuleParts {
    types:           Vec<FuncType>,
    imports:         Vec<Import>,
    functions:       Vec<u32>,
    tables:          Vec<TableType>,
    memories:        Vec<Limits>,
    globals:         Vec<Global>,
    exports:         Vec<Export>,
    start:           Option<u32>,
    data_count:      Option<u32>,
    data:            Vec<DataSegment>,
    code:            Vec<CodeBody>,
    custom_sections: Vec<CustomSection>,
}

impl ModuleParts {
    fn freeze(self) -> Module {
        if self.code.len() != self.functions.len() {
            warn!(
                functions = self.functions.len(),
                bodies = self.code.len(),
                "function and code section counts differ"
            );
        }
        if let Some(count) = self.data_count {
            if count as usize != self.data.len() {
                warn!(
                    declared = count,
                    segments = self.data.len(),
                    "data count section disagrees with data section"
                );
            }
        }

        Module {
            types:           self.types.into(),
            imports:         self.imports.into(),
            functions:       self.functions.into(),
            tables:          self.tables.into(),
            memories:        self.memories.into(),
            globals:         self.globals.into(),
            exports:         self.exports.into(),
            start:           self.start,
            data_count:      self.data_count,
            data:            self.data.into(),
            code:            self.code.into(),
            custom_sections: self.custom_sections.into(),
        }
    }
}

#[derive(Debug, Clone)]
enum State {
    Header,
    SectionStart,
    EntryCount(SectionBounds),
    Entries {
        section:   SectionBounds,
        remaining: u32,
        builder:   EntryBuilder,
    },
    StartFunction(SectionBounds),
    DataCount(SectionBounds),
    Custom {
        section: SectionBounds,
        partial: PartialCustom,
    },
    Skip(SectionBounds),
    SectionEnd(SectionBounds),
}

impl State {
    fn describe(&self) -> &'static str {
        match self {
            Self::Header => "the module header",
            Self::SectionStart => "a section header",
            Self::EntryCount(section)
            | Self::Entries { section, .. }
            | Self::StartFunction(section)
            | Self::DataCount(section)
            | Self::Custom { section, .. }
            | Self::Skip(section)
            | Self::SectionEnd(section) => section.name(),
        }
    }
}

/// Resumable decoder for one module
#[derive(Debug, Clone)]
pub struct ModuleDecoder {
    limits: DecoderLimits,
    state:  State,
    parts:  ModuleParts,
}

impl Default for ModuleDecoder {
    fn default() -> Self {
        Self::new(DecoderLimits::default())
    }
}

impl ModuleDecoder {
    /// Decoder expecting a module header next.
    #[must_use]
    pub fn new(limits: DecoderLimits) -> Self {
        Self {
            limits,
            state: State::Header,
            parts: ModuleParts::default(),
        }
    }

    /// Limits this decoder enforces.
    #[must_use]
    pub fn limits(&self) -> &DecoderLimits {
        &self.limits
    }

    /// Whether the last section is complete and no further bytes are needed.
    #[must_use]
    pub fn is_at_boundary(&self) -> bool {
        matches!(self.state, State::SectionStart)
    }

    /// Decode as far as the bytes in `source` allow.
    pub fn advance<S: ByteSource>(&mut self, source: &mut S) -> Result<Status> {
        while self.step(source)? {}

        if self.is_at_boundary() && source.available() == 0 {
            Ok(Status::SectionBoundary)
        } else {
            trace!(
                offset = source.offset(),
                available = source.available(),
                inside = self.state.describe(),
                "waiting for more input"
            );
            Ok(Status::NeedMoreInput)
        }
    }

    /// Finish decoding once `source` is exhausted.
    ///
    /// Fails if the input ended inside the header, a section header or a
    /// section, or if `source` still holds bytes that were not decoded.
    pub fn finish<S: ByteSource>(self, source: &S) -> Result<Module> {
        if !self.is_at_boundary() || source.available() > 0 {
            return Err(kinds::truncated_module(self.state.describe(), source.offset()));
        }
        Ok(self.parts.freeze())
    }

    /// Run one state transition. Returns whether anything changed.
    fn step<S: ByteSource>(&mut self, source: &mut S) -> Result<bool> {
        match &mut self.state {
            State::Header => {
                let Some(header) = source.read_bytes(binary::HEADER_SIZE) else {
                    return Ok(false);
                };
                if !binary::is_valid_wasm_header(header) {
                    let mut magic = [0u8; 4];
                    let mut version = [0u8; 4];
                    magic.copy_from_slice(&header[..4]);
                    version.copy_from_slice(&header[4..binary::HEADER_SIZE]);
                    if magic != binary::WASM_MAGIC {
                        return Err(kinds::invalid_magic(magic));
                    }
                    return Err(kinds::invalid_version(version));
                }
                self.state = State::SectionStart;
            },
            State::SectionStart => {
                if source.available() == 0 {
                    return Ok(false);
                }
                let offset = source.offset();
                let header = source.attempt(|reader| {
                    let id = ready!(reader.read_byte());
                    let size = ready!(reader.read_var_u32()?);
                    Ok(Some((id, size, reader.offset())))
                })?;
                let Some((id, size, start)) = header else {
                    return Ok(false);
                };
                let section = SectionBounds { id, start, size };
                trace!(id, size, offset, "section header");

                self.state = match id {
                    binary::CUSTOM_SECTION_ID => State::Custom {
                        section,
                        partial: PartialCustom::default(),
                    },
                    binary::START_SECTION_ID => State::StartFunction(section),
                    binary::DATA_COUNT_SECTION_ID => State::DataCount(section),
                    binary::ELEMENT_SECTION_ID => State::Skip(section),
                    _ if EntryBuilder::for_section(id).is_some() => State::EntryCount(section),
                    _ => return Err(kinds::unknown_section(id, offset)),
                };
            },
            State::EntryCount(section) => {
                let section = *section;
                let Some(count) = source.read_var_u32()? else {
                    return Ok(false);
                };
                section.check_within(source.offset())?;
                self.state = match EntryBuilder::for_section(section.id) {
                    Some(builder) if count > 0 => State::Entries {
                        section,
                        remaining: count,
                        builder,
                    },
                    _ => State::SectionEnd(section),
                };
            },
            State::Entries {
                section,
                remaining,
                builder,
            } => {
                let section = *section;
                if !builder.decode(source, &self.limits, &mut self.parts)? {
                    section.check_within(source.offset())?;
                    return Ok(false);
                }
                section.check_within(source.offset())?;
                *remaining -= 1;
                trace!(section = section.name(), remaining = *remaining, "entry decoded");
                if *remaining == 0 {
                    self.state = State::SectionEnd(section);
                }
            },
            State::StartFunction(section) => {
                let section = *section;
                let Some(index) = source.read_var_u32()? else {
                    return Ok(false);
                };
                self.parts.start = Some(index);
                self.state = State::SectionEnd(section);
            },
            State::DataCount(section) => {
                let section = *section;
                let Some(count) = source.read_var_u32()? else {
                    return Ok(false);
                };
                self.parts.data_count = Some(count);
                self.state = State::SectionEnd(section);
            },
            State::Custom { section, partial } => {
                let section = *section;
                if !partial.decode(source, section.end(), &self.limits)? {
                    return Ok(false);
                }
                let custom = core::mem::take(partial).finalize()?;
                debug!(name = %custom.name, size = custom.payload.len(), "custom section");
                self.parts.custom_sections.push(custom);
                self.state = State::SectionEnd(section);
            },
            State::Skip(section) => {
                let section = *section;
                let missing = section.end().saturating_sub(source.offset());
                let take = usize::try_from(missing)
                    .unwrap_or(usize::MAX)
                    .min(source.available());
                if take > 0 {
                    source.skip(take);
                }
                if source.offset() < section.end() {
                    return Ok(take > 0);
                }
                self.state = State::SectionEnd(section);
            },
            State::SectionEnd(section) => {
                let section = *section;
                let offset = source.offset();
                if offset != section.end() {
                    return Err(kinds::section_size_mismatch(
                        section.id,
                        section.size,
                        offset - section.start,
                    ));
                }
                debug!(section = section.name(), size = section.size, "section complete");
                self.state = State::SectionStart;
            },
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use swr_error::codes;
    use swr_format::{ChunkedStream, SliceReader};

    use super::*;

    const HEADER: [u8; 8] = [0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00];

    fn module_bytes(sections: &[&[u8]]) -> Vec<u8> {
        let mut bytes = HEADER.to_vec();
        for section in sections {
            bytes.extend_from_slice(section);
        }
        bytes
    }

    fn decode(bytes: &[u8]) -> Result<Module> {
        let mut reader = SliceReader::new(bytes);
        let mut decoder = ModuleDecoder::default();
        decoder.advance(&mut reader)?;
        decoder.finish(&reader)
    }

    #[test]
    fn test_empty_module() {
        let module = decode(&HEADER).unwrap();
        assert_eq!(module, Module::default());
    }

    #[test]
    fn test_bad_header() {
        let error = decode(&[0x00, 0x61, 0x73, 0x6E, 0x01, 0x00, 0x00, 0x00]).unwrap_err();
        assert_eq!(error.code, codes::INVALID_MAGIC);
        let error = decode(&[0x00, 0x61, 0x73, 0x6D, 0x02, 0x00, 0x00, 0x00]).unwrap_err();
        assert_eq!(error.code, codes::INVALID_VERSION);
        let error = decode(&HEADER[..5]).unwrap_err();
        assert_eq!(error.code, codes::TRUNCATED_MODULE);
    }

    #[test]
    fn test_type_and_function_sections() {
        let bytes = module_bytes(&[
            // type: one (i32) -> (i32)
            &[0x01, 0x06, 0x01, 0x60, 0x01, 0x7F, 0x01, 0x7F],
            // function: one function of type 0
            &[0x03, 0x02, 0x01, 0x00],
            // code: locals 0, local.get 0, end
            &[0x0A, 0x06, 0x01, 0x04, 0x00, 0x20, 0x00, 0x0B],
        ]);
        let module = decode(&bytes).unwrap();
        assert_eq!(module.types.len(), 1);
        assert_eq!(module.function_type(0), Some(&module.types[0]));
        assert_eq!(module.code.len(), 1);
        assert_eq!(module.code[0].size, 4);
    }

    #[test]
    fn test_section_size_mismatch() {
        // Declares 5 bytes but the single function type uses 6
        let bytes = module_bytes(&[&[0x01, 0x05, 0x01, 0x60, 0x01, 0x7F, 0x01, 0x7F]]);
        let error = decode(&bytes).unwrap_err();
        assert_eq!(error.code, codes::SECTION_SIZE_MISMATCH);

        // Declares 3 bytes but only uses 2
        let bytes = module_bytes(&[&[0x03, 0x03, 0x01, 0x00, 0x00]]);
        let error = decode(&bytes).unwrap_err();
        assert_eq!(error.code, codes::SECTION_SIZE_MISMATCH);
    }

    #[test]
    fn test_unknown_section() {
        let bytes = module_bytes(&[&[0x0D, 0x00]]);
        let error = decode(&bytes).unwrap_err();
        assert_eq!(error.code, codes::UNKNOWN_SECTION);
    }

    #[test]
    fn test_element_section_is_skipped() {
        let bytes = module_bytes(&[&[0x09, 0x03, 0xAA, 0xBB, 0xCC], &[0x08, 0x01, 0x02]]);
        let module = decode(&bytes).unwrap();
        assert_eq!(module.start, Some(2));
    }

    #[test]
    fn test_truncated_section() {
        let bytes = module_bytes(&[&[0x03, 0x02, 0x01]]);
        let error = decode(&bytes).unwrap_err();
        assert_eq!(error.code, codes::TRUNCATED_MODULE);
        assert!(error.message.contains("function"));
    }

    #[test]
    fn test_status_reports_boundaries() {
        let bytes = module_bytes(&[&[0x08, 0x01, 0x00]]);
        let mut stream = ChunkedStream::new();
        let mut decoder = ModuleDecoder::default();

        stream.push(&bytes[..9]);
        assert_eq!(decoder.advance(&mut stream).unwrap(), Status::NeedMoreInput);
        stream.push(&bytes[9..]);
        assert_eq!(decoder.advance(&mut stream).unwrap(), Status::SectionBoundary);
        assert_eq!(decoder.finish(&stream).unwrap().start, Some(0));
    }
}
