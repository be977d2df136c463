// SWR - swr-decoder
// Module: Streaming Decoder
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Entry points for whole-buffer and chunked decoding.

use swr_error::Result;
use swr_format::{ChunkedStream, SliceReader};
use tracing::debug_span;

use crate::{
    decoder::{ModuleDecoder, Status},
    limits::DecoderLimits,
    module::Module,
};

/// Decode a complete module held in memory.
pub fn decode_module(bytes: &[u8]) -> Result<Module> {
    decode_module_with_limits(bytes, DecoderLimits::default())
}

/// Decode a complete module held in memory under `limits`.
pub fn decode_module_with_limits(bytes: &[u8], limits: DecoderLimits) -> Result<Module> {
    let _span = debug_span!("decode_module", size = bytes.len()).entered();
    let mut reader = SliceReader::new(bytes);
    let mut decoder = ModuleDecoder::new(limits);
    decoder.advance(&mut reader)?;
    decoder.finish(&reader)
}

/// Decoder fed with chunks as they arrive.
///
/// ```
/// use swr_decoder::StreamingDecoder;
///
/// let bytes = [0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00];
/// let mut decoder = StreamingDecoder::default();
/// for chunk in bytes.chunks(3) {
///     decoder.feed(chunk).unwrap();
/// }
/// let module = decoder.finish().unwrap();
/// assert!(module.exports.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StreamingDecoder {
    stream:  ChunkedStream,
    decoder: ModuleDecoder,
}

impl StreamingDecoder {
    /// Decoder that enforces `limits`.
    #[must_use]
    pub fn new(limits: DecoderLimits) -> Self {
        Self {
            stream:  ChunkedStream::new(),
            decoder: ModuleDecoder::new(limits),
        }
    }

    /// Add a chunk and decode as far as possible.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Status> {
        self.stream.push(chunk);
        self.decoder.advance(&mut self.stream)
    }

    /// Total bytes fed so far.
    #[must_use]
    pub fn bytes_received(&self) -> u64 {
        self.stream.total_received()
    }

    /// Complete the module after the last chunk.
    pub fn finish(self) -> Result<Module> {
        self.decoder.finish(&self.stream)
    }
}
