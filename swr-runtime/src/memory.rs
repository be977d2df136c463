// SWR - swr-runtime
// Module: Linear Memory
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Linear memory for module instances.
//!
//! A [`MemoryArea`] is one contiguous byte region of `pages * PAGE_SIZE`
//! bytes. It only changes size through [`MemoryArea::grow_memory`], which
//! either installs a complete new backing store or leaves the area untouched.
//!
//! The area is not synchronized. Growth replaces the backing store, so an
//! instance's memory must be driven by one executor at a time; callers that
//! share an instance across threads wrap it in their own lock.

use swr_error::{kinds, Result};
use swr_format::{binary::PAGE_SIZE, types::Limits};
use tracing::{debug, trace};

use crate::config::RuntimeConfig;

/// Value `grow_memory` returns when the area cannot grow.
pub const GROW_FAILED: i32 = -1;

/// Allocate `pages` zeroed pages.
fn allocate(pages: u32) -> Result<Vec<u8>> {
    let len = (pages as usize)
        .checked_mul(PAGE_SIZE)
        .ok_or_else(|| kinds::allocation_failed("linear memory", u64::from(pages) << 16))?;
    zeroed(len)
}

fn zeroed(len: usize) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| kinds::allocation_failed("linear memory", len as u64))?;
    data.resize(len, 0);
    Ok(data)
}

/// Growable linear memory with page-granular capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryArea {
    data:          Vec<u8>,
    current_pages: u32,
    maximum_pages: u32,
}

impl MemoryArea {
    /// Memory of `initial_pages` zeroed pages that may grow to `maximum_pages`.
    pub fn new(initial_pages: u32, maximum_pages: u32) -> Result<Self> {
        if initial_pages > maximum_pages {
            return Err(kinds::invalid_memory_limits(initial_pages, maximum_pages));
        }
        let data = allocate(initial_pages)?;
        Ok(Self {
            data,
            current_pages: initial_pages,
            maximum_pages,
        })
    }

    /// Memory for a module's declared `limits`, capped by the host `config`.
    pub fn from_limits(limits: Limits, config: &RuntimeConfig) -> Result<Self> {
        config.validate()?;
        Self::new(limits.min, config.page_cap(limits.max))
    }

    /// Grow by `delta_pages` pages.
    ///
    /// Returns the new page count, or [`GROW_FAILED`] when `delta_pages` is
    /// negative, the result would pass the maximum, or the host is out of
    /// memory. A failed call changes nothing; `grow_memory(0)` returns the
    /// current page count without allocating.
    pub fn grow_memory(&mut self, delta_pages: i32) -> i32 {
        if delta_pages < 0 {
            return GROW_FAILED;
        }
        if delta_pages == 0 {
            return self.current_pages as i32;
        }

        let target = match self.current_pages.checked_add(delta_pages as u32) {
            Some(target) if target <= self.maximum_pages => target,
            _ => {
                trace!(
                    current = self.current_pages,
                    delta = delta_pages,
                    maximum = self.maximum_pages,
                    "memory growth refused"
                );
                return GROW_FAILED;
            }
        };
        let Ok(mut data) = allocate(target) else {
            trace!(pages = target, "memory allocation failed");
            return GROW_FAILED;
        };
        data[..self.data.len()].copy_from_slice(&self.data);

        self.data = data;
        let previous = std::mem::replace(&mut self.current_pages, target);
        debug!(from = previous, to = target, "memory grown");
        target as i32
    }

    /// Mutable view of `length` bytes at `address`, over the live memory.
    pub fn get_memory_access(&mut self, address: u32, length: u32) -> Result<&mut [u8]> {
        let range = self.range(address, length)?;
        Ok(&mut self.data[range])
    }

    /// Read-only view of `length` bytes at `address`.
    pub fn memory_view(&self, address: u32, length: u32) -> Result<&[u8]> {
        let range = self.range(address, length)?;
        Ok(&self.data[range])
    }

    fn range(&self, address: u32, length: u32) -> Result<std::ops::Range<usize>> {
        let end = u64::from(address) + u64::from(length);
        if end > self.data.len() as u64 {
            return Err(kinds::out_of_bounds(
                u64::from(address),
                u64::from(length),
                self.data.len(),
            ));
        }
        Ok(address as usize..end as usize)
    }

    /// Copy `bytes` into memory starting at `address`.
    pub fn write_bytes(&mut self, address: u32, bytes: &[u8]) -> Result<()> {
        let length = u32::try_from(bytes.len()).map_err(|_| {
            kinds::out_of_bounds(u64::from(address), bytes.len() as u64, self.data.len())
        })?;
        self.get_memory_access(address, length)?.copy_from_slice(bytes);
        Ok(())
    }

    /// Size in bytes.
    #[must_use]
    pub fn get_size(&self) -> usize {
        self.data.len()
    }

    /// Size in pages.
    #[must_use]
    pub fn get_current_pages(&self) -> u32 {
        self.current_pages
    }

    /// Largest size in pages the area may grow to.
    #[must_use]
    pub fn get_maximum_pages(&self) -> u32 {
        self.maximum_pages
    }

    /// Whole memory contents.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

macro_rules! typed_access {
    ($($load:ident, $store:ident => $ty:ty;)*) => {
        impl MemoryArea {
            $(
                #[doc = concat!("Load a little-endian `", stringify!($ty), "` from `address`.")]
                pub fn $load(&self, address: u32) -> Result<$ty> {
                    let bytes = self.memory_view(address, std::mem::size_of::<$ty>() as u32)?;
                    let mut buffer = [0u8; std::mem::size_of::<$ty>()];
                    buffer.copy_from_slice(bytes);
                    Ok(<$ty>::from_le_bytes(buffer))
                }

                #[doc = concat!("Store a `", stringify!($ty), "` at `address`, little-endian.")]
                pub fn $store(&mut self, address: u32, value: $ty) -> Result<()> {
                    self.write_bytes(address, &value.to_le_bytes())
                }
            )*
        }
    };
}

typed_access! {
    load_i32, store_i32 => i32;
    load_i64, store_i64 => i64;
    load_f32, store_f32 => f32;
    load_f64, store_f64 => f64;
}

#[cfg(test)]
mod tests {
    use swr_error::codes;

    use super::*;

    fn filled(pages: u32, maximum: u32) -> MemoryArea {
        let mut memory = MemoryArea::new(pages, maximum).unwrap();
        let bytes = memory.get_memory_access(0, pages * PAGE_SIZE as u32).unwrap();
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = (i % 251) as u8 + 1;
        }
        memory
    }

    #[test]
    fn test_host_allocation_failure_is_a_resource_error() {
        let error = zeroed(usize::MAX).unwrap_err();
        assert!(error.is_resource_error());
        assert_eq!(error.code, codes::ALLOCATION_FAILED);
        assert!(!error.message.contains("limits"), "{error}");
    }

    #[test]
    fn test_new_memory_is_zeroed() {
        let memory = MemoryArea::new(1, 2).unwrap();
        assert_eq!(memory.get_size(), PAGE_SIZE);
        assert_eq!(memory.get_current_pages(), 1);
        assert_eq!(memory.get_maximum_pages(), 2);
        assert!(memory.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_minimum_above_maximum_is_rejected() {
        let error = MemoryArea::new(3, 2).unwrap_err();
        assert_eq!(error.code, codes::INVALID_MEMORY_LIMITS);
    }

    #[test]
    fn test_grow_zero_is_a_no_op() {
        let mut memory = filled(2, 4);
        let before = memory.clone();
        assert_eq!(memory.grow_memory(0), 2);
        assert_eq!(memory, before);
    }

    #[test]
    fn test_negative_grow_fails() {
        let mut memory = filled(1, 4);
        let before = memory.clone();
        assert_eq!(memory.grow_memory(-1), GROW_FAILED);
        assert_eq!(memory, before);
    }

    #[test]
    fn test_grow_past_maximum_leaves_memory_unchanged() {
        let mut memory = filled(2, 4);
        let before = memory.clone();
        assert_eq!(memory.grow_memory(3), GROW_FAILED);
        assert_eq!(memory, before);
        assert_eq!(memory.get_current_pages(), 2);
    }

    #[test]
    fn test_grow_preserves_content_and_zero_fills() {
        let mut memory = filled(2, 4);
        let original = memory.data().to_vec();

        assert_eq!(memory.grow_memory(2), 4);
        assert_eq!(memory.get_current_pages(), 4);
        assert_eq!(memory.get_size(), 4 * PAGE_SIZE);
        assert_eq!(&memory.data()[..2 * PAGE_SIZE], &original[..]);
        assert!(memory.data()[2 * PAGE_SIZE..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_access_out_of_bounds() {
        let mut memory = MemoryArea::new(1, 1).unwrap();
        let error = memory.get_memory_access(PAGE_SIZE as u32 - 2, 4).unwrap_err();
        assert_eq!(error.code, codes::MEMORY_OUT_OF_BOUNDS);
        assert!(memory.get_memory_access(u32::MAX, 1).is_err());
        assert!(memory.get_memory_access(PAGE_SIZE as u32, 0).is_ok());
    }

    #[test]
    fn test_writes_through_access_are_visible() {
        let mut memory = MemoryArea::new(1, 1).unwrap();
        memory.get_memory_access(100, 4).unwrap().copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(memory.get_memory_access(102, 4).unwrap(), &[3, 4, 0, 0]);
    }

    #[test]
    fn test_typed_access_is_little_endian() {
        let mut memory = MemoryArea::new(1, 1).unwrap();
        memory.store_i32(0, 0x0403_0201).unwrap();
        assert_eq!(memory.memory_view(0, 4).unwrap(), &[1, 2, 3, 4]);
        memory.store_f64(8, -0.5).unwrap();
        assert_eq!(memory.load_f64(8).unwrap(), -0.5);
        memory.store_i64(16, i64::MIN).unwrap();
        assert_eq!(memory.load_i64(16).unwrap(), i64::MIN);
        memory.store_f32(24, f32::NAN).unwrap();
        assert_eq!(memory.load_f32(24).unwrap().to_bits(), f32::NAN.to_bits());
        assert!(memory.load_i32(PAGE_SIZE as u32 - 3).is_err());
    }

    #[test]
    fn test_from_limits_applies_host_cap() {
        let config = RuntimeConfig {
            max_memory_pages: Some(3),
        };
        let memory = MemoryArea::from_limits(Limits { min: 1, max: None }, &config).unwrap();
        assert_eq!(memory.get_maximum_pages(), 3);

        let error = MemoryArea::from_limits(Limits { min: 4, max: Some(8) }, &config).unwrap_err();
        assert_eq!(error.code, codes::INVALID_MEMORY_LIMITS);
    }
}
