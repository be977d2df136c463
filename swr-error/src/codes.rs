// SWR - swr-error
// Module: SWR Error Codes
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Error codes for SWR

// Parse error codes (1000-1099)
/// General parse error
pub const PARSE_ERROR: u16 = 1000;
/// Module does not start with the `\0asm` magic
pub const INVALID_MAGIC: u16 = 1001;
/// Module version is not 1
pub const INVALID_VERSION: u16 = 1002;
/// Unknown section id
pub const UNKNOWN_SECTION: u16 = 1003;
/// Declared section size disagrees with the bytes its contents used
pub const SECTION_SIZE_MISMATCH: u16 = 1004;
/// Opcode not recognised by the instruction decoder
pub const UNKNOWN_OPCODE: u16 = 1005;
/// Block type byte is neither empty, a value type, nor a type index
pub const INVALID_BLOCK_TYPE: u16 = 1006;
/// Value type byte not recognised
pub const INVALID_VALUE_TYPE: u16 = 1007;
/// Variable-length integer longer than its width allows
pub const LEB128_OVERFLOW: u16 = 1008;
/// Name or string payload is not valid UTF-8
pub const INVALID_UTF8: u16 = 1009;
/// Structural element appears where the grammar forbids it
pub const UNEXPECTED_ELEMENT: u16 = 1010;
/// Input ended inside a module entity
pub const TRUNCATED_MODULE: u16 = 1011;
/// A decoder limit was exceeded
pub const LIMIT_EXCEEDED: u16 = 1012;

// Memory error codes (2000-2099)
/// Memory access outside the current memory size
pub const MEMORY_OUT_OF_BOUNDS: u16 = 2000;
/// Memory limits are inconsistent (minimum above maximum)
pub const INVALID_MEMORY_LIMITS: u16 = 2001;
/// Module declares no memory
pub const MEMORY_NOT_FOUND: u16 = 2002;

// Type error codes (3000-3099)
/// Value does not have the expected type
pub const TYPE_MISMATCH: u16 = 3000;
/// Binding declares a result arity the host side cannot represent
pub const UNSUPPORTED_ARITY: u16 = 3001;
/// Bytes are not valid in the selected text encoding
pub const INVALID_ENCODING: u16 = 3002;
/// Constant expression uses a non-constant instruction
pub const NON_CONSTANT_EXPRESSION: u16 = 3003;

// Runtime error codes (4000-4099)
/// Operation called in a state that does not allow it
pub const INVALID_STATE: u16 = 4000;
/// Requested export does not exist
pub const EXPORT_NOT_FOUND: u16 = 4001;
/// Index refers to an entity that does not exist
pub const INVALID_INDEX: u16 = 4002;
/// Configuration value is invalid
pub const INVALID_CONFIGURATION: u16 = 4003;

// Resource error codes (5000-5099)
/// Host could not allocate the requested memory
pub const ALLOCATION_FAILED: u16 = 5000;
