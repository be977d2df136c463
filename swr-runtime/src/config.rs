// SWR - swr-runtime
// Module: Runtime Configuration
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Host-side settings applied when a module is instantiated.

use serde::{Deserialize, Serialize};
use swr_error::{Error, Result};
use swr_format::binary::MAX_PAGES;

/// Runtime settings, usually loaded from the `[runtime]` table of a config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Host cap on linear memory pages, applied on top of the module's own
    /// declared maximum.
    pub max_memory_pages: Option<u32>,
}

impl RuntimeConfig {
    /// Reject settings no memory could satisfy.
    pub fn validate(&self) -> Result<()> {
        match self.max_memory_pages {
            Some(pages) if pages > MAX_PAGES => Err(Error::configuration_error(format!(
                "max_memory_pages {pages} exceeds the format limit of {MAX_PAGES}"
            ))),
            _ => Ok(()),
        }
    }

    /// Effective page maximum for a memory that declares `declared`.
    #[must_use]
    pub fn page_cap(&self, declared: Option<u32>) -> u32 {
        let declared = declared.unwrap_or(MAX_PAGES).min(MAX_PAGES);
        match self.max_memory_pages {
            Some(cap) => declared.min(cap),
            None => declared,
        }
    }
}

#[cfg(test)]
mod tests {
    use swr_error::codes;

    use super::*;

    #[test]
    fn test_default_has_no_cap() {
        let config = RuntimeConfig::default();
        assert_eq!(config.page_cap(None), MAX_PAGES);
        assert_eq!(config.page_cap(Some(4)), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_host_cap_applies_to_declared_maximum() {
        let config = RuntimeConfig {
            max_memory_pages: Some(16),
        };
        assert_eq!(config.page_cap(None), 16);
        assert_eq!(config.page_cap(Some(4)), 4);
        assert_eq!(config.page_cap(Some(64)), 16);
    }

    #[test]
    fn test_cap_beyond_format_limit_is_rejected() {
        let config = RuntimeConfig {
            max_memory_pages: Some(MAX_PAGES + 1),
        };
        assert_eq!(config.validate().unwrap_err().code, codes::INVALID_CONFIGURATION);
    }
}
