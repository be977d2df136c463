// SWR - swr-decoder
// Module: Decoder Limits
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Bounds applied while decoding untrusted module bytes.

use serde::{Deserialize, Serialize};

/// Bounds on untrusted sizes in module input.
///
/// Exceeding any of them is reported as malformed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecoderLimits {
    /// Deepest nesting of `block`, `loop` and `if`
    pub max_block_depth:  u32,
    /// Most local slots a single function may declare
    pub max_locals:       u32,
    /// Largest length-prefixed field (name, data payload, code body)
    pub max_payload_size: u32,
}

impl Default for DecoderLimits {
    fn default() -> Self {
        Self {
            max_block_depth:  1024,
            max_locals:       50_000,
            max_payload_size: 64 * 1024 * 1024,
        }
    }
}
