//! Path hashing and content checksums
//!
//! Archives never store path strings. Each entry is addressed by two
//! MurmurHash3 values: one over the lower-cased path and one over the
//! upper-cased path, both encoded as UTF-16LE. Lookups are therefore
//! case-insensitive by construction.

use crate::error::{PakError, Result};
use std::fmt;

/// Seed used for both halves of a path hash
pub const PATH_HASH_SEED: u32 = 0xFFFF_FFFF;

/// Marker for entries extracted without a known path
pub const UNKNOWN_MARKER: &str = "__Unknown";

/// The 64-bit content address of a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathHash(u64);

impl PathHash {
    pub fn new(lower: u32, upper: u32) -> Self {
        Self(((upper as u64) << 32) | lower as u64)
    }

    #[inline]
    pub fn from_u64(value: u64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn lower(self) -> u32 {
        self.0 as u32
    }

    #[inline]
    pub fn upper(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Hash a logical path, ignoring case and separator style
    pub fn from_name(path: &str) -> Self {
        let normalized = normalize_path(path);
        let lower = murmur3_32(&utf16le(&normalized.to_lowercase()), PATH_HASH_SEED);
        let upper = murmur3_32(&utf16le(&normalized.to_uppercase()), PATH_HASH_SEED);
        Self::new(lower, upper)
    }
}

impl fmt::Display for PathHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

/// Normalize path to forward slashes
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Resolve the hash for a path, honouring hash-named `__Unknown` files.
///
/// A path such as `__Unknown/0123456789ABCDEF.bin` carries its hash in the
/// file stem and is decoded instead of hashed.
pub fn hash_path(path: &str) -> Result<PathHash> {
    if !path.contains(UNKNOWN_MARKER) {
        return Ok(PathHash::from_name(path));
    }

    let normalized = normalize_path(path);
    let file_name = normalized.rsplit('/').next().unwrap_or(&normalized);
    let stem = match file_name.split_once('.') {
        Some((stem, _)) => stem,
        None => file_name,
    };

    u64::from_str_radix(stem, 16)
        .map(PathHash::from_u64)
        .map_err(|e| PakError::InvalidPath(format!("{}: bad hash-name '{}': {}", path, stem, e)))
}

/// Checksum stored per entry over its decompressed bytes
pub fn hash_content(data: &[u8]) -> u64 {
    xxhash_rust::xxh3::xxh3_64(data)
}

/// Header hash over the raw index region
pub fn header_hash(index: &[u8]) -> u32 {
    crc32fast::hash(index)
}

fn utf16le(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

/// MurmurHash3, x86 32-bit variant
pub fn murmur3_32(data: &[u8], seed: u32) -> u32 {
    const C1: u32 = 0xcc9e_2d51;
    const C2: u32 = 0x1b87_3593;

    let mut h = seed;
    let mut blocks = data.chunks_exact(4);

    for block in &mut blocks {
        let mut k = u32::from_le_bytes([block[0], block[1], block[2], block[3]]);
        k = k.wrapping_mul(C1).rotate_left(15).wrapping_mul(C2);
        h ^= k;
        h = h.rotate_left(13).wrapping_mul(5).wrapping_add(0xe654_6b64);
    }

    let tail = blocks.remainder();
    if !tail.is_empty() {
        let mut k = 0u32;
        for (i, byte) in tail.iter().enumerate() {
            k |= (*byte as u32) << (8 * i);
        }
        k = k.wrapping_mul(C1).rotate_left(15).wrapping_mul(C2);
        h ^= k;
    }

    h ^= data.len() as u32;
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_murmur3_reference_vectors() {
        assert_eq!(murmur3_32(b"", 0), 0);
        assert_eq!(murmur3_32(b"", 1), 0x514E_28B7);
        assert_eq!(murmur3_32(b"", 0xFFFF_FFFF), 0x81F1_6F39);
        assert_eq!(murmur3_32(b"test", 0), 0xBA6B_D213);
        assert_eq!(murmur3_32(b"Hello, world!", 0x9747_b28c), 0x2488_4CBA);
    }

    #[test]
    fn test_case_and_separator_invariance() {
        let a = PathHash::from_name("Natives/STM/Foo.scn");
        let b = PathHash::from_name("natives/stm/foo.scn");
        let c = PathHash::from_name("NATIVES\\STM\\FOO.SCN");
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_ne!(a, PathHash::from_name("natives/stm/bar.scn"));
    }

    #[test]
    fn test_halves_are_independent() {
        let hash = PathHash::from_name("natives/stm/foo.scn");
        let lower = murmur3_32(&utf16le("natives/stm/foo.scn"), PATH_HASH_SEED);
        let upper = murmur3_32(&utf16le("NATIVES/STM/FOO.SCN"), PATH_HASH_SEED);
        assert_eq!(hash.lower(), lower);
        assert_eq!(hash.upper(), upper);
        assert_eq!(hash.as_u64(), ((upper as u64) << 32) | lower as u64);
    }

    #[test]
    fn test_unknown_hash_name() {
        let hash = hash_path("__Unknown/0123456789ABCDEF").unwrap();
        assert_eq!(hash.as_u64(), 0x0123_4567_89AB_CDEF);

        let with_ext = hash_path("out\\__Unknown\\FEDCBA9876543210.bnk").unwrap();
        assert_eq!(with_ext.as_u64(), 0xFEDC_BA98_7654_3210);

        assert!(matches!(
            hash_path("__Unknown/not-hex.bin"),
            Err(PakError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_display_round_trips_through_unknown_rule() {
        let hash = PathHash::from_name("natives/stm/gui/title.gui");
        let name = format!("{}/{}", UNKNOWN_MARKER, hash);
        assert_eq!(hash_path(&name).unwrap(), hash);
    }
}
