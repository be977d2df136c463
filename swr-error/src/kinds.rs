// SWR - swr-error
// Module: SWR Error Kinds
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Constructors for the errors the decoder and runtime raise repeatedly.
//!
//! Offsets are absolute positions in the module byte stream.

use crate::{codes, Error, ErrorCategory};

/// Opcode byte not known to the instruction decoder.
#[must_use]
pub fn unknown_opcode(opcode: u8, offset: u64) -> Error {
    Error::new(
        ErrorCategory::Parse,
        codes::UNKNOWN_OPCODE,
        format!("unknown opcode 0x{opcode:02x} at offset 0x{offset:x}"),
    )
}

/// Opcode following the 0xFC prefix not known to the instruction decoder.
#[must_use]
pub fn unknown_prefixed_opcode(prefix: u8, opcode: u32, offset: u64) -> Error {
    Error::new(
        ErrorCategory::Parse,
        codes::UNKNOWN_OPCODE,
        format!("unknown opcode 0x{prefix:02x} {opcode} at offset 0x{offset:x}"),
    )
}

/// Block type byte that is neither empty, a value type nor a type index.
#[must_use]
pub fn invalid_block_type(byte: u8, offset: u64) -> Error {
    Error::new(
        ErrorCategory::Parse,
        codes::INVALID_BLOCK_TYPE,
        format!("invalid block type 0x{byte:02x} at offset 0x{offset:x}"),
    )
}

/// Value type byte not recognised.
#[must_use]
pub fn invalid_value_type(byte: u8, offset: u64) -> Error {
    Error::new(
        ErrorCategory::Parse,
        codes::INVALID_VALUE_TYPE,
        format!("invalid value type 0x{byte:02x} at offset 0x{offset:x}"),
    )
}

/// Section contents did not use exactly the declared number of bytes.
#[must_use]
pub fn section_size_mismatch(section_id: u8, declared: u32, actual: u64) -> Error {
    Error::new(
        ErrorCategory::Parse,
        codes::SECTION_SIZE_MISMATCH,
        format!(
            "section {section_id} declares {declared} bytes but its contents use {actual}"
        ),
    )
}

/// Structural element where the grammar does not allow one.
#[must_use]
pub fn unexpected_element(what: &str, offset: u64) -> Error {
    Error::new(
        ErrorCategory::Parse,
        codes::UNEXPECTED_ELEMENT,
        format!("unexpected {what} at offset 0x{offset:x}"),
    )
}

/// A configured decoder limit was exceeded.
#[must_use]
pub fn limit_exceeded(what: &str, limit: u64, offset: u64) -> Error {
    Error::new(
        ErrorCategory::Parse,
        codes::LIMIT_EXCEEDED,
        format!("{what} exceeds limit of {limit} at offset 0x{offset:x}"),
    )
}

/// Access of `length` bytes at `address` falls outside a memory of `size` bytes.
#[must_use]
pub fn out_of_bounds(address: u64, length: u64, size: usize) -> Error {
    Error::new(
        ErrorCategory::Memory,
        codes::MEMORY_OUT_OF_BOUNDS,
        format!("access of {length} bytes at address {address} exceeds memory size {size}"),
    )
}

/// Value type differs from the one the host side expects.
#[must_use]
pub fn type_mismatch(expected: &str, actual: &str) -> Error {
    Error::new(
        ErrorCategory::Type,
        codes::TYPE_MISMATCH,
        format!("type mismatch: expected {expected}, found {actual}"),
    )
}

/// Binding declares more results than a host binding can return.
#[must_use]
pub fn unsupported_arity(name: &str, arity: usize) -> Error {
    Error::new(
        ErrorCategory::Type,
        codes::UNSUPPORTED_ARITY,
        format!("export `{name}` returns {arity} values; at most one is supported"),
    )
}

/// Bytes are not valid in the requested text encoding.
#[must_use]
pub fn invalid_encoding(encoding: &str, detail: &str) -> Error {
    Error::new(
        ErrorCategory::Type,
        codes::INVALID_ENCODING,
        format!("invalid {encoding} string: {detail}"),
    )
}

/// Export not present in the module.
#[must_use]
pub fn export_not_found(name: &str) -> Error {
    Error::new(
        ErrorCategory::Runtime,
        codes::EXPORT_NOT_FOUND,
        format!("export `{name}` not found"),
    )
}

/// Index into one of the module's index spaces is out of range.
#[must_use]
pub fn invalid_index(space: &str, index: u32) -> Error {
    Error::new(
        ErrorCategory::Runtime,
        codes::INVALID_INDEX,
        format!("{space} index {index} out of range"),
    )
}

/// Module bytes do not start with `\0asm`.
#[must_use]
pub fn invalid_magic(found: [u8; 4]) -> Error {
    Error::new(
        ErrorCategory::Parse,
        codes::INVALID_MAGIC,
        format!("invalid magic number {found:02x?}"),
    )
}

/// Module declares a binary format version other than 1.
#[must_use]
pub fn invalid_version(found: [u8; 4]) -> Error {
    Error::new(
        ErrorCategory::Parse,
        codes::INVALID_VERSION,
        format!("unsupported binary version {}", u32::from_le_bytes(found)),
    )
}

/// Section id outside the known range.
#[must_use]
pub fn unknown_section(id: u8, offset: u64) -> Error {
    Error::new(
        ErrorCategory::Parse,
        codes::UNKNOWN_SECTION,
        format!("unknown section id {id} at offset 0x{offset:x}"),
    )
}

/// Input ended before the module was complete.
#[must_use]
pub fn truncated_module(inside: &str, offset: u64) -> Error {
    Error::new(
        ErrorCategory::Parse,
        codes::TRUNCATED_MODULE,
        format!("module ends inside {inside} at offset 0x{offset:x}"),
    )
}

/// Memory limits with a minimum above the maximum, or beyond the page cap.
#[must_use]
pub fn invalid_memory_limits(min: u32, max: u32) -> Error {
    Error::new(
        ErrorCategory::Memory,
        codes::INVALID_MEMORY_LIMITS,
        format!("invalid memory limits: minimum {min} pages, maximum {max} pages"),
    )
}

/// Operation needs a linear memory the module does not have.
#[must_use]
pub fn memory_not_found(index: u32) -> Error {
    Error::new(
        ErrorCategory::Memory,
        codes::MEMORY_NOT_FOUND,
        format!("memory {index} not found"),
    )
}

/// Instruction not allowed in a constant expression.
#[must_use]
pub fn non_constant_expression(instruction: &str) -> Error {
    Error::new(
        ErrorCategory::Type,
        codes::NON_CONSTANT_EXPRESSION,
        format!("`{instruction}` is not a constant instruction"),
    )
}

/// Host could not provide `bytes` bytes of backing storage.
#[must_use]
pub fn allocation_failed(what: &str, bytes: u64) -> Error {
    Error::new(
        ErrorCategory::Resource,
        codes::ALLOCATION_FAILED,
        format!("failed to allocate {bytes} bytes for {what}"),
    )
}
