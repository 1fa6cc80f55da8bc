use crate::archive::cipher::IndexDecryptor;
use crate::archive::codec::decompress;
use crate::archive::format::{PakEntry, PakHeader, HEADER_SIZE, KEY_BLOCK_SIZE};
use crate::config::ReadOptions;
use crate::error::{PakError, Result};
use crate::hash::{hash_content, hash_path, header_hash, PathHash};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

/// Archive reader with hash lookup over the sorted index
pub struct PakReader<R> {
    inner: R,
    header: PakHeader,
    entries: Vec<PakEntry>,
    options: ReadOptions,
    base: u64,
    stream_len: u64,
}

impl PakReader<BufReader<File>> {
    /// Open an archive file for reading
    pub fn open_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_file_with(path, ReadOptions::default(), None)
    }

    pub fn open_file_with<P: AsRef<Path>>(
        path: P,
        options: ReadOptions,
        decryptor: Option<&dyn IndexDecryptor>,
    ) -> Result<Self> {
        let file = File::open(path)?;
        Self::with_options(BufReader::new(file), options, decryptor)
    }
}

impl<R: Read + Seek> PakReader<R> {
    /// Parse header and index from a stream positioned at the archive start
    pub fn new(inner: R) -> Result<Self> {
        Self::with_options(inner, ReadOptions::default(), None)
    }

    pub fn with_options(
        mut inner: R,
        options: ReadOptions,
        decryptor: Option<&dyn IndexDecryptor>,
    ) -> Result<Self> {
        let base = inner.stream_position()?;
        let stream_len = inner.seek(SeekFrom::End(0))?.saturating_sub(base);
        inner.seek(SeekFrom::Start(base))?;

        if stream_len < HEADER_SIZE as u64 {
            return Err(PakError::InvalidFormat(format!(
                "Stream too small for header: {} bytes",
                stream_len
            )));
        }

        let header = PakHeader::read_from(&mut inner)?;

        let index_end = HEADER_SIZE as u64 + header.index_size();
        if index_end > stream_len {
            return Err(PakError::InvalidFormat(format!(
                "Entry count {} implies an index ending at {} but stream is {} bytes",
                header.entry_count, index_end, stream_len
            )));
        }

        let table_len = header.entry_count as usize * header.entry_size();
        let mut table = vec![0u8; table_len];
        inner.read_exact(&mut table)?;

        if header.is_index_encrypted() {
            let mut key = [0u8; KEY_BLOCK_SIZE];
            inner.read_exact(&mut key)?;
            let decryptor = decryptor.ok_or(PakError::MissingDecryptor)?;
            let plain = decryptor.decrypt_index(&table, &key)?;
            if plain.len() != table_len {
                return Err(PakError::DecryptionFailed(format!(
                    "Decrypted index is {} bytes, expected {}",
                    plain.len(),
                    table_len
                )));
            }
            table = plain;
        } else if options.verify_checksums && header.header_hash != 0 {
            let actual = header_hash(&table);
            if actual != header.header_hash {
                return Err(PakError::HeaderHashMismatch {
                    expected: header.header_hash,
                    actual,
                });
            }
        }

        let mut cursor = Cursor::new(&table[..]);
        let mut entries = Vec::with_capacity(header.entry_count as usize);
        for _ in 0..header.entry_count {
            entries.push(PakEntry::read_from(&mut cursor, header.version_major)?);
        }
        entries.sort_by_key(|entry| entry.hash);

        debug!(
            major = header.version_major,
            minor = header.version_minor,
            entries = entries.len(),
            encrypted = header.is_index_encrypted(),
            "Opened archive"
        );

        Ok(Self {
            inner,
            header,
            entries,
            options,
            base,
            stream_len,
        })
    }

    /// Get archive header information
    pub fn header(&self) -> &PakHeader {
        &self.header
    }

    /// All entries, ordered by hash
    pub fn entries(&self) -> &[PakEntry] {
        &self.entries
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn options(&self) -> &ReadOptions {
        &self.options
    }

    /// Look up an entry by hash
    pub fn find_entry(&self, hash: PathHash) -> Option<&PakEntry> {
        self.entries
            .binary_search_by_key(&hash, |entry| entry.hash)
            .ok()
            .map(|index| &self.entries[index])
    }

    /// Check if a path exists in the archive
    pub fn contains(&self, path: &str) -> bool {
        hash_path(path)
            .map(|hash| self.find_entry(hash).is_some())
            .unwrap_or(false)
    }

    /// Read a file by logical path. A miss is `Ok(None)`.
    pub fn read_file(&mut self, path: &str) -> Result<Option<Vec<u8>>> {
        let hash = hash_path(path)?;
        self.read_hash(hash)
    }

    pub fn read_hash(&mut self, hash: PathHash) -> Result<Option<Vec<u8>>> {
        let entry = match self.find_entry(hash) {
            Some(entry) => entry.clone(),
            None => return Ok(None),
        };
        self.read_entry(&entry).map(Some)
    }

    /// Read and decompress one entry's bytes
    pub fn read_entry(&mut self, entry: &PakEntry) -> Result<Vec<u8>> {
        read_entry_data(
            &mut self.inner,
            self.base,
            self.stream_len,
            entry,
            &self.options,
        )
    }

    pub(crate) fn base(&self) -> u64 {
        self.base
    }

    pub(crate) fn stream_len(&self) -> u64 {
        self.stream_len
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Read one entry through any cursor onto the archive bytes.
///
/// `base` is the stream position of the archive header.
pub(crate) fn read_entry_data<S: Read + Seek>(
    stream: &mut S,
    base: u64,
    stream_len: u64,
    entry: &PakEntry,
    options: &ReadOptions,
) -> Result<Vec<u8>> {
    let method = entry.compression()?;
    let stored = entry.stored_size();
    let end = entry.offset.checked_add(stored);
    if end.map_or(true, |end| end > stream_len) {
        return Err(PakError::InvalidFormat(format!(
            "Entry {} extends past end of stream ({} + {} > {})",
            entry.hash, entry.offset, stored, stream_len
        )));
    }

    stream.seek(SeekFrom::Start(base + entry.offset))?;
    let mut raw = vec![0u8; stored as usize];
    stream.read_exact(&mut raw)?;

    let data = decompress(method, &raw, entry.decompressed_size)?;

    if options.verify_checksums && entry.checksum != 0 {
        let actual = hash_content(&data);
        if actual != entry.checksum {
            return Err(PakError::ChecksumMismatch {
                hash: entry.hash.as_u64(),
                expected: entry.checksum,
                actual,
            });
        }
    }

    Ok(data)
}
