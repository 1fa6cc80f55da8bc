use crate::archive::codec::{compress, sniff_container, CompressionMethod, MIN_SNIFF_SIZE};
use crate::archive::format::{PakEntry, PakHeader, ENTRY_SIZE_V4, HEADER_SIZE};
use crate::config::BuildConfig;
use crate::error::{PakError, Result};
use crate::hash::{hash_content, hash_path, header_hash, normalize_path, PathHash};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

/// A file waiting to be written by [`PakBuilder::save`]
#[derive(Debug, Clone)]
pub struct PendingEntry {
    pub path: String,
    pub hash: PathHash,
    pub data: Vec<u8>,
}

/// Builds a version 4 archive from path/content pairs
#[derive(Debug, Default)]
pub struct PakBuilder {
    entries: Vec<PendingEntry>,
    index: HashMap<PathHash, usize>,
    config: BuildConfig,
}

impl PakBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BuildConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Insert or replace a file.
    ///
    /// Entries are keyed by the hash that lands in the index, so paths
    /// differing only in case or separator style, and `__Unknown` names
    /// carrying the same hash, all name one entry. A replaced entry keeps
    /// its position.
    pub fn add_entry(&mut self, path: &str, data: impl Into<Vec<u8>>) -> Result<()> {
        let hash = hash_path(path)?;
        let pending = PendingEntry {
            path: normalize_path(path),
            hash,
            data: data.into(),
        };
        match self.index.get(&hash) {
            Some(&slot) => {
                debug!(path, %hash, replaced = %self.entries[slot].path, "Replacing entry");
                self.entries[slot] = pending;
            }
            None => {
                self.index.insert(hash, self.entries.len());
                self.entries.push(pending);
            }
        }
        Ok(())
    }

    /// Add a file from disk
    pub fn add_file_from_disk(&mut self, archive_path: &str, disk_path: &Path) -> Result<()> {
        let data = std::fs::read(disk_path)?;
        self.add_entry(archive_path, data)
    }

    /// Add every file under `root`, named by its path relative to `root`
    pub fn add_directory(&mut self, root: &Path) -> Result<usize> {
        let mut added = 0;
        for item in WalkDir::new(root).sort_by_file_name() {
            let item = item.map_err(|e| PakError::Io(e.into()))?;
            if !item.file_type().is_file() {
                continue;
            }
            let relative = item
                .path()
                .strip_prefix(root)
                .map_err(|e| PakError::InvalidPath(e.to_string()))?;
            let archive_path = relative
                .to_str()
                .ok_or_else(|| PakError::InvalidPath(relative.display().to_string()))?;
            self.add_file_from_disk(archive_path, item.path())?;
            added += 1;
        }
        Ok(added)
    }

    pub fn remove_entry(&mut self, path: &str) -> Option<Vec<u8>> {
        let hash = hash_path(path).ok()?;
        let slot = self.index.remove(&hash)?;
        let removed = self.entries.remove(slot);
        for position in self.index.values_mut() {
            if *position > slot {
                *position -= 1;
            }
        }
        Some(removed.data)
    }

    pub fn contains(&self, path: &str) -> bool {
        hash_path(path)
            .map(|hash| self.index.contains_key(&hash))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pending entries in insertion order
    pub fn pending(&self) -> &[PendingEntry] {
        &self.entries
    }

    /// Serialize the archive. Data is laid out in insertion order, the
    /// index is written sorted by hash. Returns the index as written.
    pub fn save<W: Write + Seek>(
        &self,
        mut out: W,
        method: CompressionMethod,
    ) -> Result<Vec<PakEntry>> {
        let base = out.stream_position()?;
        let entry_count = i32::try_from(self.entries.len())
            .map_err(|_| PakError::InvalidFormat("Too many entries".to_string()))?;

        // Placeholder header and index, rewritten once offsets are known
        let index_len = self.entries.len() * ENTRY_SIZE_V4;
        PakHeader::new().write_to(&mut out)?;
        out.write_all(&vec![0u8; index_len])?;

        let mut offset = (HEADER_SIZE + index_len) as u64;
        let mut written = Vec::with_capacity(self.entries.len());

        for pending in &self.entries {
            let hash = pending.hash;
            let data = &pending.data;
            let actual = self.select_compression(&pending.path, data, method);
            let payload = compress(actual, data, self.config.levels())?;

            out.write_all(&payload)?;

            written.push(PakEntry {
                hash,
                offset,
                compressed_size: payload.len() as u64,
                decompressed_size: data.len() as u64,
                attributes: actual.as_tag(),
                checksum: hash_content(data),
            });
            offset += payload.len() as u64;
        }

        written.sort_by_key(|entry| entry.hash);

        let mut index = Vec::with_capacity(index_len);
        for entry in &written {
            entry.write_to(&mut index)?;
        }

        let header = PakHeader {
            entry_count,
            header_hash: header_hash(&index),
            ..PakHeader::new()
        };

        out.seek(SeekFrom::Start(base))?;
        header.write_to(&mut out)?;
        out.write_all(&index)?;
        out.seek(SeekFrom::Start(base + offset))?;
        out.flush()?;

        info!(
            entries = written.len(),
            bytes = offset,
            compression = method.name(),
            "Saved archive"
        );
        Ok(written)
    }

    /// Create `path` and save the archive into it
    pub fn save_to_file<P: AsRef<Path>>(
        &self,
        path: P,
        method: CompressionMethod,
    ) -> Result<Vec<PakEntry>> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        let entries = self.save(&mut writer, method)?;
        writer.flush()?;
        Ok(entries)
    }

    fn select_compression(
        &self,
        path: &str,
        data: &[u8],
        requested: CompressionMethod,
    ) -> CompressionMethod {
        if data.len() < MIN_SNIFF_SIZE {
            return CompressionMethod::None;
        }
        if let Some(kind) = sniff_container(data) {
            if requested != CompressionMethod::None {
                debug!(path, container = ?kind, "Storing self-compressed container uncompressed");
            }
            return CompressionMethod::None;
        }
        requested
    }
}
