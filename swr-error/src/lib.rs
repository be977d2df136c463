// SWR - swr-error
// Module: SWR Error Handling
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! SWR Error handling library
//!
//! This library provides the error type shared by the decoder and the
//! runtime crates. Errors carry a category, a numeric code and a message.
//!
//! # Error Categories
//!
//! ## Parse Errors (1000-1099)
//! - Malformed module header
//! - Unknown opcodes and block types
//! - Section size mismatches
//! - Over-long variable-length integers
//!
//! ## Memory Errors (2000-2099)
//! - Out of range memory access
//! - Invalid memory limits
//!
//! ## Type Errors (3000-3099)
//! - Value type mismatches during marshalling
//! - Unsupported result arity
//! - Invalid string encodings
//!
//! ## Runtime Errors (4000-4099)
//! - Invalid builder state
//! - Missing exports
//! - Invalid configuration
//!
//! Incomplete input is deliberately absent from this list: decoders report it
//! through `Option`/status values, never through [`Error`].
//!
//! # Usage
//!
//! ```
//! use swr_error::{codes, kinds, Error, ErrorCategory};
//!
//! let error = Error::new(ErrorCategory::Parse, codes::PARSE_ERROR, "truncated header");
//! assert!(error.is_parse_error());
//!
//! let opcode = kinds::unknown_opcode(0xFF, 12);
//! assert_eq!(opcode.code, codes::UNKNOWN_OPCODE);
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Error codes for swr
pub mod codes;
/// Error and error handling types
pub mod errors;
/// Error kind constructors
pub mod kinds;

pub use errors::{Error, ErrorCategory};

/// A specialized `Result` type for SWR operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error conversion trait for converting to specific error categories
pub trait ToErrorCategory {
    /// Convert the error to a specific category
    fn to_category(&self) -> ErrorCategory;
}

impl ToErrorCategory for Error {
    fn to_category(&self) -> ErrorCategory {
        self.category
    }
}
