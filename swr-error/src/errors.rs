// SWR - swr-error
// Module: SWR Error Types
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

use std::{borrow::Cow, fmt};

use crate::codes;

/// `Error` categories for SWR operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorCategory {
    /// Malformed module bytes
    Parse         = 1,
    /// Structurally valid input that breaks a module-level rule
    Validation    = 2,
    /// Linear memory errors
    Memory        = 3,
    /// Value and signature errors
    Type          = 4,
    /// Runtime errors (general)
    Runtime       = 5,
    /// Resource errors (allocation, limits)
    Resource      = 6,
    /// Invalid host configuration
    Configuration = 7,
    /// I/O errors
    Io            = 8,
}

/// SWR `Error` type
///
/// Static messages are stored without allocation; messages describing
/// malformed input carry the offending offset or byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    /// `Error` category
    pub category: ErrorCategory,
    /// `Error` code
    pub code:     u16,
    /// `Error` message
    pub message:  Cow<'static, str>,
}

impl Error {
    /// Create a new error.
    #[must_use]
    pub fn new(category: ErrorCategory, code: u16, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            category,
            code,
            message: message.into(),
        }
    }

    /// Create a parse error
    #[must_use]
    pub fn parse_error(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorCategory::Parse, codes::PARSE_ERROR, message)
    }

    /// Create a memory error
    #[must_use]
    pub fn memory_error(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorCategory::Memory, codes::MEMORY_OUT_OF_BOUNDS, message)
    }

    /// Create a type error
    #[must_use]
    pub fn type_error(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorCategory::Type, codes::TYPE_MISMATCH, message)
    }

    /// Create a runtime invalid state error
    #[must_use]
    pub fn invalid_state(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorCategory::Runtime, codes::INVALID_STATE, message)
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration_error(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(
            ErrorCategory::Configuration,
            codes::INVALID_CONFIGURATION,
            message,
        )
    }

    /// Check if this is a parse error
    #[must_use]
    pub fn is_parse_error(&self) -> bool {
        self.category == ErrorCategory::Parse
    }

    /// Check if this is a memory error
    #[must_use]
    pub fn is_memory_error(&self) -> bool {
        self.category == ErrorCategory::Memory
    }

    /// Check if this is a type error
    #[must_use]
    pub fn is_type_error(&self) -> bool {
        self.category == ErrorCategory::Type
    }

    /// Check if this is a runtime error
    #[must_use]
    pub fn is_runtime_error(&self) -> bool {
        self.category == ErrorCategory::Runtime
    }

    /// Check if this is a resource error
    #[must_use]
    pub fn is_resource_error(&self) -> bool {
        self.category == ErrorCategory::Resource
    }

    /// Check if this is a configuration error
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        self.category == ErrorCategory::Configuration
    }

    /// Prefix the message with context, keeping category and code.
    #[must_use]
    pub fn context(self, context: &str) -> Self {
        Self {
            category: self.category,
            code:     self.code,
            message:  Cow::Owned(format!("{context}: {}", self.message)),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:?}][E{:04}] {}",
            self.category, self.code, self.message
        )
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::new(ErrorCategory::Io, codes::INVALID_STATE, error.to_string())
    }
}

impl From<core::str::Utf8Error> for Error {
    fn from(error: core::str::Utf8Error) -> Self {
        Self::new(
            ErrorCategory::Parse,
            codes::INVALID_UTF8,
            format!("invalid UTF-8: {error}"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_category_and_code() {
        let error = Error::parse_error("bad magic");
        assert_eq!(error.to_string(), "[Parse][E1000] bad magic");
    }

    #[test]
    fn test_context_keeps_code() {
        let error = Error::memory_error("out of range").context("data segment 2");
        assert_eq!(error.code, codes::MEMORY_OUT_OF_BOUNDS);
        assert_eq!(error.message, "data segment 2: out of range");
        assert!(error.is_memory_error());
    }
}
