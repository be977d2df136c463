// SWR - swr-format
// Module: Binary Format Constants
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Constants of the WebAssembly module binary format.

/// Magic bytes at the start of every module (`\0asm`)
pub const WASM_MAGIC: [u8; 4] = [0x00, 0x61, 0x73, 0x6D];

/// Binary format version 1
pub const WASM_VERSION: [u8; 4] = [0x01, 0x00, 0x00, 0x00];

/// Length of magic plus version
pub const HEADER_SIZE: usize = 8;

/// Size of one linear memory page in bytes (64 KiB)
pub const PAGE_SIZE: usize = 65536;

/// Largest page count addressable with 32-bit memory offsets
pub const MAX_PAGES: u32 = 65536;

// Section IDs
/// Custom section: a name and an opaque payload
pub const CUSTOM_SECTION_ID: u8 = 0x00;
/// Type section: function signatures
pub const TYPE_SECTION_ID: u8 = 0x01;
/// Import section
pub const IMPORT_SECTION_ID: u8 = 0x02;
/// Function section: a type index per defined function
pub const FUNCTION_SECTION_ID: u8 = 0x03;
/// Table section
pub const TABLE_SECTION_ID: u8 = 0x04;
/// Memory section
pub const MEMORY_SECTION_ID: u8 = 0x05;
/// Global section
pub const GLOBAL_SECTION_ID: u8 = 0x06;
/// Export section
pub const EXPORT_SECTION_ID: u8 = 0x07;
/// Start section
pub const START_SECTION_ID: u8 = 0x08;
/// Element section
pub const ELEMENT_SECTION_ID: u8 = 0x09;
/// Code section: locals and body per defined function
pub const CODE_SECTION_ID: u8 = 0x0A;
/// Data section
pub const DATA_SECTION_ID: u8 = 0x0B;
/// Data count section
pub const DATA_COUNT_SECTION_ID: u8 = 0x0C;

// Value types
/// `i32`
pub const I32_TYPE: u8 = 0x7F;
/// `i64`
pub const I64_TYPE: u8 = 0x7E;
/// `f32`
pub const F32_TYPE: u8 = 0x7D;
/// `f64`
pub const F64_TYPE: u8 = 0x7C;
/// `v128`
pub const V128_TYPE: u8 = 0x7B;
/// `funcref`
pub const FUNCREF_TYPE: u8 = 0x70;
/// `externref`
pub const EXTERNREF_TYPE: u8 = 0x6F;

/// Block type byte of a block that takes and yields nothing
pub const BLOCK_TYPE_EMPTY: u8 = 0x40;

/// Leading byte of a function type in the type section
pub const FUNC_TYPE_FORM: u8 = 0x60;

// External kinds used by imports and exports
/// Function import or export
pub const EXTERNAL_FUNCTION: u8 = 0x00;
/// Table import or export
pub const EXTERNAL_TABLE: u8 = 0x01;
/// Memory import or export
pub const EXTERNAL_MEMORY: u8 = 0x02;
/// Global import or export
pub const EXTERNAL_GLOBAL: u8 = 0x03;
/// Exception tag import or export
pub const EXTERNAL_TAG: u8 = 0x04;

// Limits flags
/// Limits with a minimum only
pub const LIMITS_MIN_ONLY: u8 = 0x00;
/// Limits with a minimum and a maximum
pub const LIMITS_MIN_MAX: u8 = 0x01;

// Data segment flags
/// Active segment for memory 0
pub const DATA_ACTIVE: u32 = 0x00;
/// Passive segment
pub const DATA_PASSIVE: u32 = 0x01;
/// Active segment with an explicit memory index
pub const DATA_ACTIVE_EXPLICIT: u32 = 0x02;

// Structural opcodes
/// `unreachable`
pub const UNREACHABLE: u8 = 0x00;
/// `nop`
pub const NOP: u8 = 0x01;
/// `block`
pub const BLOCK: u8 = 0x02;
/// `loop`
pub const LOOP: u8 = 0x03;
/// `if`
pub const IF: u8 = 0x04;
/// `else`
pub const ELSE: u8 = 0x05;
/// `end`
pub const END: u8 = 0x0B;
/// `br`
pub const BR: u8 = 0x0C;
/// `br_if`
pub const BR_IF: u8 = 0x0D;
/// `br_table`
pub const BR_TABLE: u8 = 0x0E;
/// `return`
pub const RETURN: u8 = 0x0F;
/// `call`
pub const CALL: u8 = 0x10;
/// `call_indirect`
pub const CALL_INDIRECT: u8 = 0x11;
/// `drop`
pub const DROP: u8 = 0x1A;
/// `select`
pub const SELECT: u8 = 0x1B;
/// `select` with a result type vector
pub const SELECT_TYPED: u8 = 0x1C;

// Variable instructions
/// `local.get`
pub const LOCAL_GET: u8 = 0x20;
/// `local.set`
pub const LOCAL_SET: u8 = 0x21;
/// `local.tee`
pub const LOCAL_TEE: u8 = 0x22;
/// `global.get`
pub const GLOBAL_GET: u8 = 0x23;
/// `global.set`
pub const GLOBAL_SET: u8 = 0x24;
/// `table.get`
pub const TABLE_GET: u8 = 0x25;
/// `table.set`
pub const TABLE_SET: u8 = 0x26;

// Memory size instructions
/// `memory.size`
pub const MEMORY_SIZE: u8 = 0x3F;
/// `memory.grow`
pub const MEMORY_GROW: u8 = 0x40;

// Numeric constants
/// `i32.const`
pub const I32_CONST: u8 = 0x41;
/// `i64.const`
pub const I64_CONST: u8 = 0x42;
/// `f32.const`
pub const F32_CONST: u8 = 0x43;
/// `f64.const`
pub const F64_CONST: u8 = 0x44;

// Reference instructions
/// `ref.null`
pub const REF_NULL: u8 = 0xD0;
/// `ref.is_null`
pub const REF_IS_NULL: u8 = 0xD1;
/// `ref.func`
pub const REF_FUNC: u8 = 0xD2;

/// Prefix for saturating truncation, bulk memory and table instructions
pub const MISC_PREFIX: u8 = 0xFC;

/// Returns the readable name of a section id, or `None` for unknown ids.
#[must_use]
pub const fn section_name(id: u8) -> Option<&'static str> {
    Some(match id {
        CUSTOM_SECTION_ID => "custom",
        TYPE_SECTION_ID => "type",
        IMPORT_SECTION_ID => "import",
        FUNCTION_SECTION_ID => "function",
        TABLE_SECTION_ID => "table",
        MEMORY_SECTION_ID => "memory",
        GLOBAL_SECTION_ID => "global",
        EXPORT_SECTION_ID => "export",
        START_SECTION_ID => "start",
        ELEMENT_SECTION_ID => "element",
        CODE_SECTION_ID => "code",
        DATA_SECTION_ID => "data",
        DATA_COUNT_SECTION_ID => "datacount",
        _ => return None,
    })
}

/// Check whether `bytes` begins with a version 1 module header.
#[must_use]
pub fn is_valid_wasm_header(bytes: &[u8]) -> bool {
    bytes.len() >= HEADER_SIZE
        && bytes[0..4] == WASM_MAGIC
        && bytes[4..HEADER_SIZE] == WASM_VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_detection() {
        assert!(is_valid_wasm_header(&[0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00]));
        assert!(!is_valid_wasm_header(&[0x00, 0x61, 0x73, 0x6D, 0x02, 0x00, 0x00, 0x00]));
        assert!(!is_valid_wasm_header(&[0x00, 0x61, 0x73]));
    }

    #[test]
    fn test_section_names() {
        assert_eq!(section_name(CODE_SECTION_ID), Some("code"));
        assert_eq!(section_name(DATA_COUNT_SECTION_ID), Some("datacount"));
        assert_eq!(section_name(0x0D), None);
    }
}
