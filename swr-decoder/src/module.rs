// SWR - swr-decoder
// Module: Module Metadata
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Completed module representation.
//!
//! Everything here is immutable once built: sequences are boxed slices and the
//! decoder hands a [`Module`] out only after the whole byte stream was read.

use core::{fmt, ops::Deref};

use swr_error::{kinds, Result};
use swr_format::{
    binary,
    types::{FuncType, GlobalType, Limits, TableType, ValueType},
};

use crate::instructions::Expression;

/// UTF-8 name, compared by content
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Name(Box<str>);

impl Name {
    /// Name from any string.
    #[must_use]
    pub fn new(name: impl Into<Box<str>>) -> Self {
        Self(name.into())
    }

    /// Validate `bytes` as UTF-8.
    pub fn from_utf8(bytes: &[u8]) -> Result<Self> {
        Ok(Self(core::str::from_utf8(bytes)?.into()))
    }

    /// The name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Name {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Name {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of an import or export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExternalKind {
    /// Function
    Function,
    /// Table
    Table,
    /// Linear memory
    Memory,
    /// Global
    Global,
    /// Exception tag
    Tag,
}

impl ExternalKind {
    /// Map a kind byte, failing for bytes outside `0x00..=0x04`.
    pub fn from_byte(byte: u8, offset: u64) -> Result<Self> {
        Ok(match byte {
            binary::EXTERNAL_FUNCTION => Self::Function,
            binary::EXTERNAL_TABLE => Self::Table,
            binary::EXTERNAL_MEMORY => Self::Memory,
            binary::EXTERNAL_GLOBAL => Self::Global,
            binary::EXTERNAL_TAG => Self::Tag,
            _ => return Err(kinds::unexpected_element("external kind", offset)),
        })
    }

    /// Text format keyword.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Function => "func",
            Self::Table => "table",
            Self::Memory => "memory",
            Self::Global => "global",
            Self::Tag => "tag",
        }
    }
}

impl fmt::Display for ExternalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What an import provides
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportDesc {
    /// Function with the given signature
    Function {
        /// Index into the type section
        type_index: u32,
    },
    /// Table
    Table(TableType),
    /// Linear memory with page bounds
    Memory {
        /// Initial size in pages
        min_pages: u32,
        /// Optional maximum size in pages
        max_pages: Option<u32>,
    },
    /// Global
    Global(GlobalType),
    /// Kind this decoder carries through without interpreting
    Unknown {
        /// Kind byte as it appeared in the module
        kind:       u8,
        /// Type index the import refers to
        type_index: u32,
    },
}

impl ImportDesc {
    /// Kind of definition this import adds to the index spaces.
    #[must_use]
    pub fn kind(&self) -> ExternalKind {
        match self {
            Self::Function { .. } => ExternalKind::Function,
            Self::Table(_) => ExternalKind::Table,
            Self::Memory { .. } => ExternalKind::Memory,
            Self::Global(_) => ExternalKind::Global,
            Self::Unknown { .. } => ExternalKind::Tag,
        }
    }
}

/// Imported definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Module namespace
    pub module: Name,
    /// Field name within the namespace
    pub name:   Name,
    /// What is imported
    pub desc:   ImportDesc,
}

/// Exported definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    /// Export name
    pub name:  Name,
    /// Kind of the exported definition
    pub kind:  ExternalKind,
    /// Index into the combined (imported then defined) space of `kind`
    pub index: u32,
}

/// Global defined by the module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Global {
    /// Value type and mutability
    pub global_type: GlobalType,
    /// Constant initializer expression
    pub init:        Expression,
}

/// Data segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSegment {
    /// Target memory, zero unless given explicitly
    pub memory_index: u32,
    /// Constant offset expression, empty for passive segments
    pub offset:       Expression,
    /// Raw payload
    pub bytes:        Box<[u8]>,
    /// Whether the segment is only copied by `memory.init`
    pub passive:      bool,
}

/// Function body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBody {
    /// Declared body size in bytes
    pub size:   u32,
    /// One entry per local slot, parameters excluded
    pub locals: Box<[ValueType]>,
    /// Decoded instructions
    pub body:   Expression,
}

/// Custom section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomSection {
    /// Section name
    pub name:    Name,
    /// Raw contents after the name
    pub payload: Box<[u8]>,
}

/// Decoded module
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Module {
    /// Function signatures
    pub types:           Box<[FuncType]>,
    /// Imports in declaration order
    pub imports:         Box<[Import]>,
    /// Type index of every defined function
    pub functions:       Box<[u32]>,
    /// Defined tables
    pub tables:          Box<[TableType]>,
    /// Defined memories
    pub memories:        Box<[Limits]>,
    /// Defined globals
    pub globals:         Box<[Global]>,
    /// Exports in declaration order
    pub exports:         Box<[Export]>,
    /// Start function index
    pub start:           Option<u32>,
    /// Data segment count announced ahead of the code section
    pub data_count:      Option<u32>,
    /// Data segments
    pub data:            Box<[DataSegment]>,
    /// Function bodies, parallel to `functions`
    pub code:            Box<[CodeBody]>,
    /// Custom sections in order of appearance
    pub custom_sections: Box<[CustomSection]>,
}

impl Module {
    /// Number of imports of `kind`.
    #[must_use]
    pub fn imported_count(&self, kind: ExternalKind) -> u32 {
        self.imports.iter().filter(|import| import.desc.kind() == kind).count() as u32
    }

    /// Export named `name`.
    #[must_use]
    pub fn export(&self, name: &str) -> Option<&Export> {
        self.exports.iter().find(|export| export.name == name)
    }

    /// Signature of the defined (not imported) function at `index`.
    #[must_use]
    pub fn function_type(&self, index: u32) -> Option<&FuncType> {
        let type_index = *self.functions.get(index as usize)?;
        self.types.get(type_index as usize)
    }

    /// Signature of any function in the combined index space.
    #[must_use]
    pub fn combined_function_type(&self, index: u32) -> Option<&FuncType> {
        let imported = self.imported_count(ExternalKind::Function);
        match index.checked_sub(imported) {
            Some(internal) => self.function_type(internal),
            None => {
                let type_index = self
                    .imports
                    .iter()
                    .filter_map(|import| match import.desc {
                        ImportDesc::Function { type_index } => Some(type_index),
                        _ => None,
                    })
                    .nth(index as usize)?;
                self.types.get(type_index as usize)
            }
        }
    }

    /// Internal index of the `kind` export named `name`.
    ///
    /// Imports of a kind are numbered before the module's own definitions, so
    /// the internal index is the export index minus the import count of that
    /// kind. Exports that re-export an import have no internal index.
    #[must_use]
    pub fn find_export_index(&self, name: &str, kind: ExternalKind) -> Option<u32> {
        let export = self
            .exports
            .iter()
            .find(|export| export.kind == kind && export.name == name)?;
        export.index.checked_sub(self.imported_count(kind))
    }

    /// Page bounds of memory 0, whether imported or defined.
    #[must_use]
    pub fn memory_limits(&self) -> Option<Limits> {
        let imported = self.imports.iter().find_map(|import| match import.desc {
            ImportDesc::Memory {
                min_pages,
                max_pages,
            } => Some(Limits {
                min: min_pages,
                max: max_pages,
            }),
            _ => None,
        });
        imported.or_else(|| self.memories.first().copied())
    }

    /// Custom section named `name`.
    #[must_use]
    pub fn custom_section(&self, name: &str) -> Option<&CustomSection> {
        self.custom_sections.iter().find(|section| section.name == name)
    }
}

/// Internal index of the `kind` export named `name` in `module`.
///
/// See [`Module::find_export_index`].
#[must_use]
pub fn find_export_index(module: &Module, name: &str, kind: ExternalKind) -> Option<u32> {
    module.find_export_index(name, kind)
}
