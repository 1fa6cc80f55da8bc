use crate::archive::codec::CompressionMethod;
use crate::error::{PakError, Result};
use crate::hash::PathHash;
use std::io::{Read, Write};

/// Magic number: "KPKA" little-endian
pub const MAGIC_NUMBER: u32 = 0x414B_504B;

/// Header size in bytes
pub const HEADER_SIZE: usize = 16;

/// Entry record size for major version 4
pub const ENTRY_SIZE_V4: usize = 48;

/// Entry record size for major version 2
pub const ENTRY_SIZE_V2: usize = 24;

/// Key block appended to an encrypted index
pub const KEY_BLOCK_SIZE: usize = 128;

/// Feature flag: plain index
pub const FEATURE_NONE: i16 = 0;

/// Feature flag: encrypted entry table
pub const FEATURE_ENCRYPTED_INDEX: i16 = 8;

/// Version written by the builder
pub const FORMAT_VERSION_MAJOR: u8 = 4;
pub const FORMAT_VERSION_MINOR: u8 = 0;

/// Archive header at the start of every stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PakHeader {
    pub version_major: u8,
    pub version_minor: u8,
    pub feature_flags: i16,
    pub entry_count: i32,
    pub header_hash: u32,
}

impl PakHeader {
    pub fn new() -> Self {
        Self {
            version_major: FORMAT_VERSION_MAJOR,
            version_minor: FORMAT_VERSION_MINOR,
            feature_flags: FEATURE_NONE,
            entry_count: 0,
            header_hash: 0,
        }
    }

    /// Write header to a writer
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&MAGIC_NUMBER.to_le_bytes())?;
        writer.write_all(&[self.version_major, self.version_minor])?;
        writer.write_all(&self.feature_flags.to_le_bytes())?;
        writer.write_all(&self.entry_count.to_le_bytes())?;
        writer.write_all(&self.header_hash.to_le_bytes())?;
        Ok(())
    }

    /// Read and validate a header
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let magic = read_u32(&mut reader)?;
        if magic != MAGIC_NUMBER {
            return Err(PakError::InvalidMagic(magic));
        }

        let mut version = [0u8; 2];
        reader.read_exact(&mut version)?;
        let feature_flags = read_i16(&mut reader)?;
        let entry_count = read_i32(&mut reader)?;
        let header_hash = read_u32(&mut reader)?;

        let header = Self {
            version_major: version[0],
            version_minor: version[1],
            feature_flags,
            entry_count,
            header_hash,
        };
        header.validate()?;
        Ok(header)
    }

    /// Validate version and feature compatibility
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.version_major, 2 | 4) || !matches!(self.version_minor, 0 | 1) {
            return Err(PakError::UnsupportedVersion {
                major: self.version_major,
                minor: self.version_minor,
            });
        }
        if !matches!(self.feature_flags, FEATURE_NONE | FEATURE_ENCRYPTED_INDEX) {
            return Err(PakError::UnsupportedFeature(self.feature_flags));
        }
        if self.entry_count < 0 {
            return Err(PakError::InvalidFormat(format!(
                "Negative entry count: {}",
                self.entry_count
            )));
        }
        Ok(())
    }

    pub fn is_index_encrypted(&self) -> bool {
        self.feature_flags == FEATURE_ENCRYPTED_INDEX
    }

    /// Size of one index record for this header's version
    pub fn entry_size(&self) -> usize {
        if self.version_major == 2 {
            ENTRY_SIZE_V2
        } else {
            ENTRY_SIZE_V4
        }
    }

    /// Bytes between the header and the data region
    pub fn index_size(&self) -> u64 {
        let table = self.entry_count as u64 * self.entry_size() as u64;
        if self.is_index_encrypted() {
            table + KEY_BLOCK_SIZE as u64
        } else {
            table
        }
    }
}

impl Default for PakHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Index record for one stored file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PakEntry {
    pub hash: PathHash,
    pub offset: u64,
    pub compressed_size: u64,
    pub decompressed_size: u64,
    /// Full attribute word as stored; compression lives in the low nibble
    pub attributes: i64,
    pub checksum: u64,
}

impl PakEntry {
    /// Codec named by the attribute word; `UnknownCompression` for tags
    /// outside the known set
    pub fn compression(&self) -> Result<CompressionMethod> {
        CompressionMethod::from_tag(self.attributes)
    }

    /// Bytes occupied in the data region
    pub fn stored_size(&self) -> u64 {
        match self.compression() {
            Ok(CompressionMethod::None) => self.decompressed_size,
            _ => self.compressed_size,
        }
    }

    /// Write a version 4 record
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.hash.lower().to_le_bytes())?;
        writer.write_all(&self.hash.upper().to_le_bytes())?;
        writer.write_all(&to_i64(self.offset)?.to_le_bytes())?;
        writer.write_all(&to_i64(self.compressed_size)?.to_le_bytes())?;
        writer.write_all(&to_i64(self.decompressed_size)?.to_le_bytes())?;
        writer.write_all(&self.attributes.to_le_bytes())?;
        writer.write_all(&self.checksum.to_le_bytes())?;
        Ok(())
    }

    /// Read a record laid out for the given major version
    pub fn read_from<R: Read>(reader: R, version_major: u8) -> Result<Self> {
        if version_major == 2 {
            Self::read_v2(reader)
        } else {
            Self::read_v4(reader)
        }
    }

    fn read_v4<R: Read>(mut reader: R) -> Result<Self> {
        let lower = read_u32(&mut reader)?;
        let upper = read_u32(&mut reader)?;
        let offset = read_size(&mut reader, "offset")?;
        let compressed_size = read_size(&mut reader, "compressed size")?;
        let decompressed_size = read_size(&mut reader, "decompressed size")?;
        let attributes = read_i64(&mut reader)?;
        let checksum = read_u64(&mut reader)?;

        Ok(Self {
            hash: PathHash::new(lower, upper),
            offset,
            compressed_size,
            decompressed_size,
            attributes,
            checksum,
        })
    }

    fn read_v2<R: Read>(mut reader: R) -> Result<Self> {
        let offset = read_size(&mut reader, "offset")?;
        let decompressed_size = read_size(&mut reader, "decompressed size")?;
        let lower = read_u32(&mut reader)?;
        let upper = read_u32(&mut reader)?;

        Ok(Self {
            hash: PathHash::new(lower, upper),
            offset,
            compressed_size: decompressed_size,
            decompressed_size,
            attributes: CompressionMethod::None.as_tag(),
            checksum: 0,
        })
    }
}

fn to_i64(value: u64) -> Result<i64> {
    i64::try_from(value)
        .map_err(|_| PakError::InvalidFormat(format!("Value too large for index field: {}", value)))
}

fn read_size<R: Read>(reader: R, field: &str) -> Result<u64> {
    let value = read_i64(reader)?;
    u64::try_from(value)
        .map_err(|_| PakError::InvalidFormat(format!("Negative {} in index: {}", field, value)))
}

// Helper functions for reading primitive types
fn read_i16<R: Read>(mut reader: R) -> Result<i16> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(i16::from_le_bytes(buf))
}

fn read_i32<R: Read>(mut reader: R) -> Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_u32<R: Read>(mut reader: R) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_i64<R: Read>(mut reader: R) -> Result<i64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(i64::from_le_bytes(buf))
}

fn read_u64<R: Read>(mut reader: R) -> Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}
