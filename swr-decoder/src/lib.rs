// SWR - swr-decoder
// Module: WebAssembly Module Decoder
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! WebAssembly module decoder for swr.
//!
//! Module bytes may arrive in chunks of any size, split anywhere: inside a
//! LEB128 integer, a name, or an instruction. Decoding never blocks. When the
//! available bytes run out the decoder keeps what it has in its builders and
//! reports [`Status::NeedMoreInput`]; feeding the next chunk resumes exactly
//! where it stopped. Whole-buffer and chunked decoding produce identical
//! [`Module`] values.
//!
//! ```
//! use swr_decoder::{decode_module, ExternalKind};
//!
//! let bytes = [
//!     0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00, // header
//!     0x05, 0x03, 0x01, 0x00, 0x01, // memory section: one memory, min 1
//!     0x07, 0x07, 0x01, 0x03, b'm', b'e', b'm', 0x02, 0x00, // export "mem"
//! ];
//! let module = decode_module(&bytes).unwrap();
//! assert_eq!(module.find_export_index("mem", ExternalKind::Memory), Some(0));
//! ```

pub mod builders;
pub mod decoder;
pub mod instructions;
pub mod limits;
pub mod module;
pub mod partial;
pub mod streaming;

pub use decoder::{ModuleDecoder, Status};
pub use instructions::{Block, BlockKind, Expression, Instruction};
pub use limits::DecoderLimits;
pub use module::{
    find_export_index, CodeBody, CustomSection, DataSegment, Export, ExternalKind, Global, Import,
    ImportDesc, Module, Name,
};
pub use streaming::{decode_module, decode_module_with_limits, StreamingDecoder};
pub use swr_error::{Error, Result};
pub use swr_format::types::{BlockType, FuncType, GlobalType, Limits, TableType, ValueType};
