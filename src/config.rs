//! TOML configuration for building, reading and extracting archives
//!
//! ```toml
//! [build]
//! compression = "zstd"
//! zstd_level = 3
//! deflate_level = 6
//!
//! [read]
//! verify_checksums = false
//!
//! [extract]
//! continue_on_error = true
//! threads = 8
//! ```

use crate::archive::{CompressionLevels, CompressionMethod};
use crate::error::{PakError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PakConfig {
    pub build: BuildConfig,
    pub read: ReadOptions,
    pub extract: ExtractOptions,
}

/// Builder settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Codec requested for entries that are not self-compressed containers
    pub compression: CompressionMethod,
    pub zstd_level: i32,
    pub deflate_level: u32,
}

impl Default for BuildConfig {
    fn default() -> Self {
        let levels = CompressionLevels::default();
        Self {
            compression: CompressionMethod::default(),
            zstd_level: levels.zstd,
            deflate_level: levels.deflate,
        }
    }
}

impl BuildConfig {
    pub fn levels(&self) -> CompressionLevels {
        CompressionLevels {
            zstd: self.zstd_level,
            deflate: self.deflate_level,
        }
    }
}

/// Reader settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadOptions {
    /// Recompute entry checksums and the header hash on read
    pub verify_checksums: bool,
}

/// Bulk extraction settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Record failed entries and keep going instead of aborting
    pub continue_on_error: bool,
    /// Worker count; `None` uses the global rayon pool
    pub threads: Option<usize>,
}

impl PakConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=22).contains(&self.build.zstd_level) {
            return Err(PakError::Config(format!(
                "zstd_level must be within 1..=22, got {}",
                self.build.zstd_level
            )));
        }
        if self.build.deflate_level > 9 {
            return Err(PakError::Config(format!(
                "deflate_level must be within 0..=9, got {}",
                self.build.deflate_level
            )));
        }
        if self.extract.threads == Some(0) {
            return Err(PakError::Config("threads must be at least 1".to_string()));
        }
        Ok(())
    }
}
