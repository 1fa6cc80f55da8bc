use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for kpka operations
pub type Result<T> = std::result::Result<T, PakError>;

/// Unified error type for all kpka operations
#[derive(Debug, Error)]
pub enum PakError {
    // Format errors
    #[error("Invalid magic number in archive header: {0:#010x}")]
    InvalidMagic(u32),

    #[error("Unsupported archive version: {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    #[error("Unsupported feature flags: {0:#06x}")]
    UnsupportedFeature(i16),

    #[error("Invalid archive format: {0}")]
    InvalidFormat(String),

    // Codec errors
    #[error("Unknown compression type: {0:#x}")]
    UnknownCompression(i64),

    #[error("Compression failed: {0}")]
    CompressionFailed(String),

    #[error("Decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("Checksum mismatch for entry {hash:016X}: expected {expected:016x}, got {actual:016x}")]
    ChecksumMismatch {
        hash: u64,
        expected: u64,
        actual: u64,
    },

    #[error("Header hash mismatch: expected {expected:08x}, got {actual:08x}")]
    HeaderHashMismatch { expected: u32, actual: u32 },

    // Encryption errors
    #[error("Archive index is encrypted but no decryptor was provided")]
    MissingDecryptor,

    #[error("Index decryption failed: {0}")]
    DecryptionFailed(String),

    // Chain errors
    #[error("Patch file missing from chain: {}", .0.display())]
    MissingPatch(PathBuf),

    #[error("Failed to open layer {}: {source}", .path.display())]
    Layer {
        path: PathBuf,
        #[source]
        source: Box<PakError>,
    },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Asset codec error: {0}")]
    Asset(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PakError {
    /// Errors that reject a whole archive
    pub fn is_format_error(&self) -> bool {
        match self {
            PakError::InvalidMagic(_)
            | PakError::UnsupportedVersion { .. }
            | PakError::UnsupportedFeature(_)
            | PakError::InvalidFormat(_)
            | PakError::HeaderHashMismatch { .. }
            | PakError::MissingDecryptor
            | PakError::DecryptionFailed(_) => true,
            PakError::Layer { source, .. } => source.is_format_error(),
            _ => false,
        }
    }

    /// Errors scoped to a single entry's payload
    pub fn is_codec_error(&self) -> bool {
        matches!(
            self,
            PakError::UnknownCompression(_)
                | PakError::CompressionFailed(_)
                | PakError::DecompressionFailed(_)
                | PakError::ChecksumMismatch { .. }
        )
    }
}

impl From<toml::de::Error> for PakError {
    fn from(err: toml::de::Error) -> Self {
        PakError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for PakError {
    fn from(err: toml::ser::Error) -> Self {
        PakError::Config(err.to_string())
    }
}

impl From<rayon::ThreadPoolBuildError> for PakError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        PakError::Internal(err.to_string())
    }
}
