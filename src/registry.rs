//! Known-path registry
//!
//! Hashes are one-way, so an archive alone cannot say what its entries are
//! called. A registry built from a list of known paths maps hashes back to
//! readable names during extraction. It never affects lookups.
//!
//! The list format is one path per line. Blank lines and lines starting
//! with `#` or `//` are skipped, surrounding whitespace is trimmed.

use crate::error::Result;
use crate::hash::{hash_path, normalize_path, PathHash};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct PathRegistry {
    paths: HashMap<PathHash, String>,
}

impl PathRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut registry = Self::new();
        for line in reader.lines() {
            let line = line?;
            let path = line.trim();
            if path.is_empty() || path.starts_with('#') || path.starts_with("//") {
                continue;
            }
            registry.insert(path)?;
        }
        debug!(paths = registry.len(), "Loaded path registry");
        Ok(registry)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Register a path, returning its hash
    pub fn insert(&mut self, path: &str) -> Result<PathHash> {
        let hash = hash_path(path)?;
        self.paths.insert(hash, normalize_path(path));
        Ok(hash)
    }

    pub fn resolve(&self, hash: PathHash) -> Option<&str> {
        self.paths.get(&hash).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
