// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Engine settings.
//!
//! Settings are read from a YAML document; every field is optional and falls
//! back on the defaults of [`crate::constants`].
//!
//! ```yaml
//! maxRecordsPerZone: 5000
//! defaultZoneTtl: 3600
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{DEFAULT_MAX_RECORDS_PER_ZONE, DEFAULT_ZONE_TTL_SECS};

fn default_max_records_per_zone() -> usize {
    DEFAULT_MAX_RECORDS_PER_ZONE
}

fn default_zone_ttl() -> u32 {
    DEFAULT_ZONE_TTL_SECS
}

/// Analysis engine settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Zones with more records are refused instead of analysed
    #[serde(default = "default_max_records_per_zone")]
    pub max_records_per_zone: usize,

    /// Default TTL of a zone without any record, in seconds
    #[serde(default = "default_zone_ttl")]
    pub default_zone_ttl: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_records_per_zone: default_max_records_per_zone(),
            default_zone_ttl: default_zone_ttl(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate settings from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error when the YAML is malformed or the settings are invalid.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text).context("Failed to parse engine settings")?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate settings from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or holds invalid settings.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read engine settings from {}", path.display()))?;
        Self::from_yaml_str(&text)
            .with_context(|| format!("Invalid engine settings in {}", path.display()))
    }

    /// Check the settings are usable.
    ///
    /// # Errors
    ///
    /// Returns an error when a limit is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_records_per_zone == 0 {
            bail!("maxRecordsPerZone must be greater than 0");
        }
        if self.default_zone_ttl == 0 {
            bail!("defaultZoneTtl must be greater than 0");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
