//! Error constructor and conversion tests for the swr-error crate.

use swr_error::{codes, kinds, Error, ErrorCategory, ToErrorCategory};

#[test]
fn test_kind_constructors_set_category_and_code() {
    let cases = [
        (kinds::unknown_opcode(0xFF, 0x20), ErrorCategory::Parse, codes::UNKNOWN_OPCODE),
        (kinds::invalid_block_type(0x12, 3), ErrorCategory::Parse, codes::INVALID_BLOCK_TYPE),
        (
            kinds::section_size_mismatch(10, 5, 7),
            ErrorCategory::Parse,
            codes::SECTION_SIZE_MISMATCH,
        ),
        (
            kinds::out_of_bounds(65530, 10, 65536),
            ErrorCategory::Memory,
            codes::MEMORY_OUT_OF_BOUNDS,
        ),
        (kinds::unsupported_arity("pair", 2), ErrorCategory::Type, codes::UNSUPPORTED_ARITY),
        (kinds::export_not_found("main"), ErrorCategory::Runtime, codes::EXPORT_NOT_FOUND),
        (kinds::invalid_memory_limits(4, 2), ErrorCategory::Memory, codes::INVALID_MEMORY_LIMITS),
        (kinds::memory_not_found(0), ErrorCategory::Memory, codes::MEMORY_NOT_FOUND),
        (
            kinds::allocation_failed("linear memory", 1 << 32),
            ErrorCategory::Resource,
            codes::ALLOCATION_FAILED,
        ),
        (
            kinds::non_constant_expression("call"),
            ErrorCategory::Type,
            codes::NON_CONSTANT_EXPRESSION,
        ),
    ];

    for (error, category, code) in cases {
        assert_eq!(error.to_category(), category, "{error}");
        assert_eq!(error.code, code, "{error}");
    }
}

#[test]
fn test_messages_describe_the_failure() {
    let error = kinds::unknown_opcode(0xFF, 0x20);
    assert_eq!(error.message, "unknown opcode 0xff at offset 0x20");

    let error = kinds::section_size_mismatch(10, 5, 7);
    assert!(error.message.contains("declares 5 bytes"));
    assert!(error.message.contains("use 7"));
}

#[test]
fn test_errors_are_std_errors() {
    fn takes_std_error(_: &dyn std::error::Error) {}

    let error = Error::configuration_error("max_memory_pages must be positive");
    takes_std_error(&error);
    assert!(error.is_configuration_error());
}

#[test]
fn test_utf8_error_converts_to_parse_error() {
    let bytes = [0xC3_u8, 0x28];
    let utf8 = std::str::from_utf8(&bytes).unwrap_err();
    let error: Error = utf8.into();
    assert_eq!(error.code, codes::INVALID_UTF8);
    assert!(error.is_parse_error());
}
