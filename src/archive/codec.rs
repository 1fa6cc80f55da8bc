use crate::error::{PakError, Result};
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Payloads shorter than this are never sniffed or compressed
pub const MIN_SNIFF_SIZE: usize = 8;

/// Compression methods supported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum CompressionMethod {
    None = 0,
    Deflate = 1,
    #[default]
    Zstd = 2,
}

impl CompressionMethod {
    /// Decode from an entry's attribute word
    pub fn from_tag(attributes: i64) -> Result<Self> {
        match attributes & 0xF {
            0 => Ok(Self::None),
            1 => Ok(Self::Deflate),
            2 => Ok(Self::Zstd),
            _ => Err(PakError::UnknownCompression(attributes)),
        }
    }

    pub fn as_tag(self) -> i64 {
        self as i64
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Deflate => "deflate",
            Self::Zstd => "zstd",
        }
    }
}

/// Codec tuning used by the builder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionLevels {
    pub zstd: i32,
    pub deflate: u32,
}

impl Default for CompressionLevels {
    fn default() -> Self {
        Self { zstd: 3, deflate: 6 }
    }
}

/// Sub-formats that carry their own compression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Movie,
    AudioBank,
    StreamingPackage,
}

const CONTAINER_SIGNATURES: [(&[u8; 4], ContainerKind); 3] = [
    (b"CRID", ContainerKind::Movie),
    (b"BKHD", ContainerKind::AudioBank),
    (b"AKPK", ContainerKind::StreamingPackage),
];

impl ContainerKind {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Movie => "usm",
            Self::AudioBank => "bnk",
            Self::StreamingPackage => "pck",
        }
    }
}

/// Identify a self-compressed container from the first 8 bytes
pub fn sniff_container(data: &[u8]) -> Option<ContainerKind> {
    if data.len() < MIN_SNIFF_SIZE {
        return None;
    }
    let prefix = &data[..MIN_SNIFF_SIZE];
    CONTAINER_SIGNATURES
        .iter()
        .find(|(magic, _)| prefix.starts_with(*magic))
        .map(|(_, kind)| *kind)
}

/// Compress a payload with the given method
pub fn compress(
    method: CompressionMethod,
    data: &[u8],
    levels: CompressionLevels,
) -> Result<Vec<u8>> {
    match method {
        CompressionMethod::None => Ok(data.to_vec()),
        CompressionMethod::Deflate => {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(levels.deflate));
            encoder
                .write_all(data)
                .and_then(|_| encoder.finish())
                .map_err(|e| {
                    PakError::CompressionFailed(format!("Deflate compression failed: {}", e))
                })
        }
        CompressionMethod::Zstd => zstd::encode_all(data, levels.zstd)
            .map_err(|e| PakError::CompressionFailed(format!("Zstd compression failed: {}", e))),
    }
}

/// Decompress a payload and check it against the recorded size
pub fn decompress(method: CompressionMethod, data: &[u8], expected_size: u64) -> Result<Vec<u8>> {
    let output = match method {
        CompressionMethod::None => data.to_vec(),
        CompressionMethod::Deflate => {
            let mut output = Vec::with_capacity(expected_size.min(data.len() as u64 * 4) as usize);
            DeflateDecoder::new(data)
                .take(expected_size.saturating_add(1))
                .read_to_end(&mut output)
                .map_err(|e| {
                    PakError::DecompressionFailed(format!("Deflate decompression failed: {}", e))
                })?;
            output
        }
        CompressionMethod::Zstd => zstd::decode_all(data).map_err(|e| {
            PakError::DecompressionFailed(format!("Zstd decompression failed: {}", e))
        })?,
    };

    if output.len() as u64 != expected_size {
        return Err(PakError::DecompressionFailed(format!(
            "Size mismatch: expected {} bytes, got {}",
            expected_size,
            output.len()
        )));
    }
    Ok(output)
}
