// SWR - swrd
// Module: Configuration File
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Loading `swrd.toml`.
//!
//! ```toml
//! log_level = "debug"
//!
//! [decoder]
//! max_block_depth = 256
//!
//! [runtime]
//! max_memory_pages = 1024
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use swr_decoder::DecoderLimits;
use swr_runtime::RuntimeConfig;
use tracing::debug;

/// Name of the configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "swrd.toml";

/// Contents of a configuration file. Every table and key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SwrdConfig {
    /// Log filter used when neither `--log-level` nor `RUST_LOG` is set
    pub log_level: Option<String>,
    /// Decoder limits
    pub decoder:   DecoderLimits,
    /// Runtime settings
    pub runtime:   RuntimeConfig,
}

/// Load `explicit` if given, else `swrd.toml` in `working_dir` if it exists,
/// else defaults.
pub fn load_config(explicit: Option<&Path>, working_dir: &Path) -> Result<SwrdConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let candidate = working_dir.join(DEFAULT_CONFIG_FILE);
            if !candidate.exists() {
                return Ok(SwrdConfig::default());
            }
            candidate
        }
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: SwrdConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    config
        .runtime
        .validate()
        .with_context(|| format!("Invalid config file: {}", path.display()))?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}
