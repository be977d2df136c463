// SWR - swr-runtime
// Module: WebAssembly Runtime Primitives
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

#![forbid(unsafe_code)]

//! Runtime primitives for modules decoded by `swr-decoder`.
//!
//! This crate provides what an execution layer needs around a decoded
//! [`swr_decoder::Module`]:
//!
//! - [`MemoryArea`]: page-granular linear memory with bounds-checked views
//! - [`Value`] and the [`WasmType`] family: exact mapping between WebAssembly
//!   numbers and host numbers
//! - [`read_string`]: strings decoded out of memory in a chosen encoding
//! - [`Instance`]: memory, globals and data segments set up from a module
//! - [`ExportBindings`]: typed handles to exported functions
//!
//! ```
//! use swr_runtime::{MemoryArea, GROW_FAILED};
//!
//! let mut memory = MemoryArea::new(1, 2).unwrap();
//! memory.get_memory_access(0, 2).unwrap().copy_from_slice(b"hi");
//! assert_eq!(memory.grow_memory(1), 2);
//! assert_eq!(memory.grow_memory(1), GROW_FAILED);
//! assert_eq!(memory.memory_view(0, 2).unwrap(), b"hi");
//! ```

pub mod binding;
pub mod config;
pub mod const_eval;
pub mod instance;
pub mod memory;
pub mod strings;
pub mod values;

pub use binding::{ExportBindings, Executor, StringFunc, TypedFunc};
pub use config::RuntimeConfig;
pub use instance::Instance;
pub use memory::{MemoryArea, GROW_FAILED};
pub use strings::{read_string, StringEncoding, StringSpan};
pub use swr_error::{Error, Result};
pub use values::{Value, WasmParams, WasmResults, WasmType};
