// SWR - swr-decoder
// Module: Partial Values
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Accumulators for length-prefixed fields whose bytes may arrive in several
//! deliveries.
//!
//! A partial value is sized once its length is known and then filled with
//! whatever bytes are available on each pass. It never accepts more bytes
//! than it was sized for and can only be finalized once full.

use swr_error::{kinds, Error, Result};
use swr_format::{ready, ByteSource};

use crate::module::Name;

/// Field being filled toward a known length.
pub trait PartialValue: Sized {
    /// Immutable value produced once full
    type Output;

    /// Empty accumulator expecting `len` bytes.
    fn with_len(len: usize) -> Self;

    /// Take as many bytes as are available and still needed from `source`.
    ///
    /// Returns whether the value is now full.
    fn fill_from<S: ByteSource>(&mut self, source: &mut S) -> bool;

    /// Convert into the immutable value.
    fn finalize(self) -> Result<Self::Output>;
}

/// Raw byte field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialBytes {
    bytes:  Vec<u8>,
    filled: usize,
}

impl PartialBytes {
    /// Buffer of `len` bytes, none of them filled yet.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            bytes:  vec![0; len],
            filled: 0,
        }
    }

    /// Declared total length.
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.bytes.len()
    }

    /// Bytes still missing.
    #[must_use]
    pub fn bytes_remaining(&self) -> usize {
        self.bytes.len() - self.filled
    }

    /// Whether every byte has been supplied.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.filled == self.bytes.len()
    }

    /// Copy `chunk` at the fill cursor.
    ///
    /// Fails without copying anything if `chunk` is longer than the bytes
    /// still missing.
    pub fn append(&mut self, chunk: &[u8]) -> Result<()> {
        let remaining = self.bytes_remaining();
        if chunk.len() > remaining {
            return Err(Error::invalid_state(format!(
                "append of {} bytes to a field missing only {remaining}",
                chunk.len()
            )));
        }
        let end = self.filled + chunk.len();
        self.bytes[self.filled..end].copy_from_slice(chunk);
        self.filled = end;
        Ok(())
    }

    /// Freeze into the filled bytes.
    pub fn finalize(self) -> Result<Box<[u8]>> {
        if !self.is_complete() {
            return Err(Error::invalid_state(format!(
                "finalize with {} of {} bytes still missing",
                self.bytes_remaining(),
                self.bytes.len()
            )));
        }
        Ok(self.bytes.into_boxed_slice())
    }
}

impl PartialValue for PartialBytes {
    type Output = Box<[u8]>;

    fn with_len(len: usize) -> Self {
        Self::new(len)
    }

    fn fill_from<S: ByteSource>(&mut self, source: &mut S) -> bool {
        let take = self.bytes_remaining().min(source.available());
        if take > 0 {
            let end = self.filled + take;
            if let Some(chunk) = source.read_bytes(take) {
                self.bytes[self.filled..end].copy_from_slice(chunk);
                self.filled = end;
            }
        }
        self.is_complete()
    }

    fn finalize(self) -> Result<Box<[u8]>> {
        PartialBytes::finalize(self)
    }
}

/// UTF-8 name field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialString {
    bytes: PartialBytes,
}

impl PartialString {
    /// Name of `len` bytes, none of them filled yet.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            bytes: PartialBytes::new(len),
        }
    }

    /// Bytes still missing.
    #[must_use]
    pub fn bytes_remaining(&self) -> usize {
        self.bytes.bytes_remaining()
    }

    /// Copy `chunk` at the fill cursor.
    pub fn append(&mut self, chunk: &[u8]) -> Result<()> {
        self.bytes.append(chunk)
    }

    /// Validate the bytes as UTF-8 and freeze into a [`Name`].
    pub fn finalize(self) -> Result<Name> {
        Name::from_utf8(&self.bytes.finalize()?)
    }
}

impl PartialValue for PartialString {
    type Output = Name;

    fn with_len(len: usize) -> Self {
        Self::new(len)
    }

    fn fill_from<S: ByteSource>(&mut self, source: &mut S) -> bool {
        self.bytes.fill_from(source)
    }

    fn finalize(self) -> Result<Name> {
        PartialString::finalize(self)
    }
}

/// Length-prefixed field: a LEB128 length followed by that many bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pending<P> {
    /// Length not read yet
    AwaitingLength,
    /// Length known, bytes arriving
    Filling(P),
}

impl<P> Default for Pending<P> {
    fn default() -> Self {
        Self::AwaitingLength
    }
}

impl<P: PartialValue> Pending<P> {
    /// Advance the field with the bytes `source` has.
    ///
    /// Returns the finished value once the last byte arrived, `Ok(None)`
    /// while more input is needed. A length above `max_len` is malformed.
    pub fn decode<S: ByteSource>(
        &mut self,
        source: &mut S,
        max_len: u32,
    ) -> Result<Option<P::Output>> {
        if let Self::AwaitingLength = self {
            let offset = source.offset();
            let len = ready!(source.read_var_u32()?);
            if len > max_len {
                return Err(kinds::limit_exceeded(
                    "field length",
                    u64::from(max_len),
                    offset,
                ));
            }
            *self = Self::Filling(P::with_len(len as usize));
        }

        let complete = match self {
            Self::Filling(partial) => partial.fill_from(source),
            Self::AwaitingLength => false,
        };
        if !complete {
            return Ok(None);
        }
        match core::mem::take(self) {
            Self::Filling(partial) => partial.finalize().map(Some),
            Self::AwaitingLength => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use swr_format::{ChunkedStream, SliceReader};

    use super::*;

    #[test]
    fn test_append_fills_in_order() {
        let mut partial = PartialBytes::new(5);
        partial.append(&[1, 2]).unwrap();
        assert_eq!(partial.bytes_remaining(), 3);
        partial.append(&[3, 4, 5]).unwrap();
        assert_eq!(partial.bytes_remaining(), 0);
        assert_eq!(&*partial.finalize().unwrap(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_append_never_writes_past_length() {
        let mut partial = PartialBytes::new(2);
        partial.append(&[1]).unwrap();
        let error = partial.append(&[2, 3]).unwrap_err();
        assert!(error.is_runtime_error());
        assert_eq!(partial.bytes_remaining(), 1);
    }

    #[test]
    fn test_finalize_before_complete_fails() {
        let mut partial = PartialString::new(3);
        partial.append(b"ab").unwrap();
        assert!(partial.finalize().is_err());
    }

    #[test]
    fn test_fill_takes_only_what_is_needed() {
        let mut reader = SliceReader::new(&[1, 2, 3, 4]);
        let mut partial = PartialBytes::new(3);
        assert!(partial.fill_from(&mut reader));
        assert_eq!(reader.position(), 3);
    }

    #[test]
    fn test_string_split_across_chunks() {
        let mut stream = ChunkedStream::new();
        let mut field: Pending<PartialString> = Pending::default();

        // "héllo" is six bytes; split inside the two-byte é
        stream.push(&[0x06, b'h', 0xC3]);
        assert_eq!(field.decode(&mut stream, 64).unwrap(), None);
        stream.push(&[0xA9, b'l', b'l']);
        assert_eq!(field.decode(&mut stream, 64).unwrap(), None);
        stream.push(&[b'o']);
        assert_eq!(field.decode(&mut stream, 64).unwrap(), Some(Name::from("héllo")));
        assert_eq!(field, Pending::AwaitingLength);
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let mut reader = SliceReader::new(&[0x02, 0xC3, 0x28]);
        let mut field: Pending<PartialString> = Pending::default();
        let error = field.decode(&mut reader, 64).unwrap_err();
        assert!(error.is_parse_error());
    }

    #[test]
    fn test_length_above_limit_is_rejected() {
        let mut reader = SliceReader::new(&[0x80, 0x01]);
        let mut field: Pending<PartialBytes> = Pending::default();
        assert!(field.decode(&mut reader, 100).is_err());
    }
}
