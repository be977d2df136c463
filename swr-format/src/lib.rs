// SWR - swr-format
// Module: WebAssembly Binary Format Primitives
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! WebAssembly binary format primitives for swr.
//!
//! This crate contains the pieces of the module format that every decoder
//! shares:
//!
//! - [`binary`]: magic, version, section ids, type bytes and structural opcodes
//! - [`leb128`]: variable-length integer decoding and encoding
//! - [`reader`]: the [`ByteSource`] capability with a materialized buffer
//!   ([`SliceReader`]) and a live chunked stream ([`ChunkedStream`])
//! - [`types`]: value types, block types, limits and function signatures
//!
//! Reads never block and never consume a partial encoding. When the source
//! does not yet hold a complete value the read returns `None` and the source
//! stays where it was, so the caller can retry after more bytes arrive.

pub mod binary;
pub mod leb128;
pub mod reader;
pub mod types;

pub use reader::{ByteSource, ChunkedStream, SliceReader};
pub use swr_error::{Error, Result};
pub use types::{BlockType, FuncType, GlobalType, Limits, TableType, ValueType};
