// SWR - swr-format
// Module: Byte Sources
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Byte sources that the decoders read from.
//!
//! [`ByteSource`] is the single capability every structural decoder is written
//! against. It has two implementations: [`SliceReader`] over a fully
//! materialized buffer, and [`ChunkedStream`] over bytes that arrive in pieces.
//!
//! A read that cannot complete with the bytes currently available returns
//! `None` (or `Ok(None)`) and consumes nothing.

use crate::{leb128, Result};

/// Unwrap a `Some`, or return `Ok(None)` from the enclosing function.
///
/// Used inside decode routines to forward "need more input" upwards.
#[macro_export]
macro_rules! ready {
    ($e:expr) => {
        match $e {
            Some(value) => value,
            None => return Ok(None),
        }
    };
}

/// Source of module bytes.
pub trait ByteSource {
    /// All bytes currently available and not yet consumed.
    fn peek(&self) -> &[u8];

    /// Absolute position of the next unconsumed byte in the module stream.
    fn offset(&self) -> u64;

    /// Consume exactly `len` bytes, or nothing if fewer are available.
    fn read_bytes(&mut self, len: usize) -> Option<&[u8]>;

    /// Number of bytes available without waiting for more input.
    fn available(&self) -> usize {
        self.peek().len()
    }

    /// Consume `len` bytes without looking at them.
    fn skip(&mut self, len: usize) -> bool {
        self.read_bytes(len).is_some()
    }

    /// Consume a single byte.
    fn read_byte(&mut self) -> Option<u8> {
        self.read_bytes(1).and_then(|bytes| bytes.first().copied())
    }

    /// Unsigned LEB128 integer of up to 64 bits.
    fn read_var_u64(&mut self) -> Result<Option<u64>> {
        let decoded = leb128::decode_unsigned(self.peek(), 64, self.offset())?;
        let (value, len) = ready!(decoded);
        self.skip(len);
        Ok(Some(value))
    }

    /// Signed LEB128 integer of up to 64 bits.
    fn read_var_i64(&mut self) -> Result<Option<i64>> {
        let decoded = leb128::decode_signed(self.peek(), 64, self.offset())?;
        let (value, len) = ready!(decoded);
        self.skip(len);
        Ok(Some(value))
    }

    /// Unsigned LEB128 integer that must fit in 32 bits.
    fn read_var_u32(&mut self) -> Result<Option<u32>> {
        let decoded = leb128::decode_unsigned(self.peek(), 32, self.offset())?;
        let (value, len) = ready!(decoded);
        self.skip(len);
        Ok(Some(value as u32))
    }

    /// Signed LEB128 integer that must fit in 32 bits.
    fn read_var_i32(&mut self) -> Result<Option<i32>> {
        let decoded = leb128::decode_signed(self.peek(), 32, self.offset())?;
        let (value, len) = ready!(decoded);
        self.skip(len);
        Ok(Some(value as i32))
    }

    /// Bit pattern of a little-endian IEEE 754 single.
    fn read_f32_bits(&mut self) -> Option<u32> {
        let bytes: [u8; 4] = self.read_bytes(4)?.try_into().ok()?;
        Some(u32::from_le_bytes(bytes))
    }

    /// Bit pattern of a little-endian IEEE 754 double.
    fn read_f64_bits(&mut self) -> Option<u64> {
        let bytes: [u8; 8] = self.read_bytes(8)?.try_into().ok()?;
        Some(u64::from_le_bytes(bytes))
    }

    /// Run a multi-field decode atomically.
    ///
    /// `decode` runs against a lookahead reader over [`peek`](Self::peek).
    /// The bytes it read are consumed from `self` only when it returns
    /// `Ok(Some(_))`; on `Ok(None)` or `Err` the source is left untouched.
    fn attempt<T, F>(&mut self, decode: F) -> Result<Option<T>>
    where
        Self: Sized,
        F: FnOnce(&mut SliceReader<'_>) -> Result<Option<T>>,
    {
        let (value, consumed) = {
            let mut lookahead = SliceReader::with_base_offset(self.peek(), self.offset());
            let value = decode(&mut lookahead)?;
            (value, lookahead.position())
        };
        if value.is_some() {
            self.skip(consumed);
        }
        Ok(value)
    }
}

/// Reader over a complete in-memory buffer.
#[derive(Debug, Clone)]
pub struct SliceReader<'a> {
    bytes:       &'a [u8],
    position:    usize,
    base_offset: u64,
}

impl<'a> SliceReader<'a> {
    /// Reader over `bytes`, which start at offset zero of the module.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self::with_base_offset(bytes, 0)
    }

    /// Reader over `bytes`, which start at `base_offset` in the module.
    #[must_use]
    pub fn with_base_offset(bytes: &'a [u8], base_offset: u64) -> Self {
        Self {
            bytes,
            position: 0,
            base_offset,
        }
    }

    /// Bytes consumed so far.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Whether every byte has been consumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.position >= self.bytes.len()
    }

    /// Like [`ByteSource::read_bytes`] but borrowing from the underlying buffer.
    pub fn read_slice(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.position.checked_add(len)?;
        let bytes = self.bytes.get(self.position..end)?;
        self.position = end;
        Some(bytes)
    }
}

impl ByteSource for SliceReader<'_> {
    fn peek(&self) -> &[u8] {
        self.bytes.get(self.position..).unwrap_or_default()
    }

    fn offset(&self) -> u64 {
        self.base_offset + self.position as u64
    }

    fn read_bytes(&mut self, len: usize) -> Option<&[u8]> {
        self.read_slice(len)
    }
}

/// Growable buffer fed with chunks as they arrive.
///
/// Consumed bytes are dropped from the front when the next chunk is pushed,
/// so the buffer only holds the unfinished tail of the stream.
#[derive(Debug, Clone, Default)]
pub struct ChunkedStream {
    buffer:   Vec<u8>,
    position: usize,
    // Bytes dropped from the front of `buffer` so far
    consumed: u64,
}

impl ChunkedStream {
    /// Empty stream at offset zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of input.
    pub fn push(&mut self, chunk: &[u8]) {
        if self.position > 0 {
            self.buffer.drain(..self.position);
            self.consumed += self.position as u64;
            self.position = 0;
        }
        self.buffer.extend_from_slice(chunk);
    }

    /// Whether every received byte has been consumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.position >= self.buffer.len()
    }

    /// Total number of bytes pushed so far.
    #[must_use]
    pub fn total_received(&self) -> u64 {
        self.consumed + self.buffer.len() as u64
    }
}

impl ByteSource for ChunkedStream {
    fn peek(&self) -> &[u8] {
        self.buffer.get(self.position..).unwrap_or_default()
    }

    fn offset(&self) -> u64 {
        self.consumed + self.position as u64
    }

    fn read_bytes(&mut self, len: usize) -> Option<&[u8]> {
        let start = self.position;
        let end = start.checked_add(len)?;
        if end > self.buffer.len() {
            return None;
        }
        self.position = end;
        self.buffer.get(start..end)
    }
}
