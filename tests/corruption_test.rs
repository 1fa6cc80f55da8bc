//! Corruption detection
//!
//! Tests for detecting and handling corrupted archive files.

use kpka::{
    CompressionMethod, ExtractOptions, PakBuilder, PakError, PakReader, PathRegistry, ReadOptions,
    ENTRY_SIZE_V4, HEADER_SIZE,
};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Cursor, Seek, SeekFrom, Write};
use std::path::Path;
use tempfile::NamedTempFile;

const TEXT: &[u8] = b"Hello, World! Hello, World! Hello, World!";

/// Helper: Create a valid test archive
fn create_test_archive(method: CompressionMethod) -> NamedTempFile {
    let temp_file = NamedTempFile::new().unwrap();
    let mut builder = PakBuilder::new();
    builder.add_entry("test.txt", TEXT.to_vec()).unwrap();
    builder.add_entry("data.bin", vec![0xAB; 1024]).unwrap();
    builder.save_to_file(temp_file.path(), method).unwrap();
    temp_file
}

/// Helper: Overwrite bytes at specific offset
fn corrupt_bytes_at(path: &Path, offset: u64, bytes: &[u8]) {
    let mut file = OpenOptions::new().read(true).write(true).open(path).unwrap();
    file.seek(SeekFrom::Start(offset)).unwrap();
    file.write_all(bytes).unwrap();
}

/// Helper: Truncate file at specific offset
fn truncate_at(path: &Path, new_length: u64) {
    let file = OpenOptions::new().write(true).open(path).unwrap();
    file.set_len(new_length).unwrap();
}

/// Index record of `test.txt`, wherever the sort put it
fn record_offset_of(path: &Path, name: &str) -> u64 {
    let reader = PakReader::open_file(path).unwrap();
    let hash = kpka::hash_path(name).unwrap();
    let position = reader
        .entries()
        .iter()
        .position(|entry| entry.hash == hash)
        .unwrap();
    (HEADER_SIZE + position * ENTRY_SIZE_V4) as u64
}

#[test]
fn test_corrupted_magic_number() {
    let temp_file = create_test_archive(CompressionMethod::Zstd);
    let path = temp_file.path();

    corrupt_bytes_at(path, 0, &[0xFF]);

    match PakReader::open_file(path) {
        Err(PakError::InvalidMagic(_)) => {} // Expected
        Err(other) => panic!("Expected InvalidMagic, got: {:?}", other),
        Ok(_) => panic!("Corrupt magic must be rejected"),
    }
}

#[test]
fn test_unsupported_version() {
    let temp_file = create_test_archive(CompressionMethod::Zstd);
    let path = temp_file.path();

    corrupt_bytes_at(path, 4, &[3]);

    match PakReader::open_file(path) {
        Err(PakError::UnsupportedVersion { major: 3, minor: 0 }) => {}
        Err(other) => panic!("Expected UnsupportedVersion, got: {:?}", other),
        Ok(_) => panic!("Version 3 must be rejected"),
    }
}

#[test]
fn test_unsupported_feature_flags() {
    let temp_file = create_test_archive(CompressionMethod::Zstd);
    let path = temp_file.path();

    corrupt_bytes_at(path, 6, &1i16.to_le_bytes());

    let result = PakReader::open_file(path);
    assert!(matches!(result, Err(PakError::UnsupportedFeature(1))));
}

#[test]
fn test_stream_smaller_than_header() {
    let result = PakReader::new(Cursor::new(b"KPKA\x04\x00".to_vec()));
    assert!(matches!(result, Err(PakError::InvalidFormat(_))));

    let empty = PakReader::new(Cursor::new(Vec::new()));
    assert!(matches!(empty, Err(PakError::InvalidFormat(_))));
}

#[test]
fn test_entry_count_larger_than_stream() {
    let temp_file = create_test_archive(CompressionMethod::Zstd);
    let path = temp_file.path();

    corrupt_bytes_at(path, 8, &1_000_000i32.to_le_bytes());

    let result = PakReader::open_file(path);
    assert!(matches!(result, Err(ref e @ PakError::InvalidFormat(_)) if e.is_format_error()));
}

#[test]
fn test_truncated_index() {
    let temp_file = create_test_archive(CompressionMethod::Zstd);
    let path = temp_file.path();

    truncate_at(path, (HEADER_SIZE + ENTRY_SIZE_V4) as u64);

    let result = PakReader::open_file(path);
    assert!(matches!(result, Err(PakError::InvalidFormat(_))));
}

#[test]
fn test_truncated_data_region() {
    let temp_file = create_test_archive(CompressionMethod::None);
    let path = temp_file.path();
    let len = std::fs::metadata(path).unwrap().len();

    truncate_at(path, len - 10);

    // Index still parses; the entry running past the end fails on read
    let mut reader = PakReader::open_file(path).unwrap();
    assert!(reader.read_file("data.bin").is_err());
}

#[test]
fn test_unknown_compression_tag_fails_only_that_entry() {
    let temp_file = create_test_archive(CompressionMethod::Zstd);
    let path = temp_file.path();
    let record = record_offset_of(path, "test.txt");

    // attributes field sits at byte 32 of the record
    corrupt_bytes_at(path, record + 32, &9i64.to_le_bytes());

    let mut reader = PakReader::open_file(path).unwrap();
    match reader.read_file("test.txt") {
        Err(err @ PakError::UnknownCompression(9)) => assert!(err.is_codec_error()),
        other => panic!("Expected UnknownCompression, got: {:?}", other),
    }
    assert_eq!(reader.read_file("data.bin").unwrap(), Some(vec![0xAB; 1024]));

    let dest = tempfile::tempdir().unwrap();
    let options = ExtractOptions {
        continue_on_error: true,
        threads: None,
    };
    let report = reader
        .extract_all(&PathRegistry::new(), dest.path(), &options, || {
            File::open(path).map(BufReader::new)
        })
        .unwrap();
    assert_eq!(report.extracted, 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(
        report.failed[0].hash,
        kpka::hash_path("test.txt").unwrap().to_string()
    );

    let strict = reader.extract_all(
        &PathRegistry::new(),
        dest.path(),
        &ExtractOptions::default(),
        || File::open(path).map(BufReader::new),
    );
    assert!(matches!(strict, Err(PakError::UnknownCompression(9))));
}

#[test]
fn test_first_failure_stops_single_worker_extraction() {
    let temp_file = NamedTempFile::new().unwrap();
    let mut builder = PakBuilder::new();
    for i in 0..20 {
        builder
            .add_entry(&format!("natives/stm/file{}.txt", i), TEXT.to_vec())
            .unwrap();
    }
    builder
        .save_to_file(temp_file.path(), CompressionMethod::Zstd)
        .unwrap();
    let path = temp_file.path();

    // Break the entry that sorts first
    corrupt_bytes_at(path, HEADER_SIZE as u64 + 32, &9i64.to_le_bytes());

    let reader = PakReader::open_file(path).unwrap();
    let dest = tempfile::tempdir().unwrap();
    let options = ExtractOptions {
        continue_on_error: false,
        threads: Some(1),
    };
    let result = reader.extract_all(&PathRegistry::new(), dest.path(), &options, || {
        File::open(path).map(BufReader::new)
    });
    assert!(matches!(result, Err(PakError::UnknownCompression(9))));

    let written = std::fs::read_dir(dest.path().join("__Unknown"))
        .map(|dir| dir.count())
        .unwrap_or(0);
    assert!(written < 19, "extraction kept going: {} files written", written);
}

#[test]
fn test_corrupt_compressed_payload() {
    let temp_file = create_test_archive(CompressionMethod::Zstd);
    let path = temp_file.path();

    let entry = {
        let reader = PakReader::open_file(path).unwrap();
        let hash = kpka::hash_path("data.bin").unwrap();
        reader.find_entry(hash).unwrap().clone()
    };
    assert_eq!(entry.compression().unwrap(), CompressionMethod::Zstd);

    // Clobber the zstd frame magic
    corrupt_bytes_at(path, entry.offset, &[0, 0, 0, 0]);

    let mut reader = PakReader::open_file(path).unwrap();
    match reader.read_file("data.bin") {
        Err(err @ PakError::DecompressionFailed(_)) => assert!(err.is_codec_error()),
        other => panic!("Expected DecompressionFailed, got: {:?}", other),
    }

    // Other entries are unaffected
    assert_eq!(reader.read_file("test.txt").unwrap().as_deref(), Some(TEXT));
}

#[test]
fn test_silent_corruption_only_caught_in_strict_mode() {
    let temp_file = create_test_archive(CompressionMethod::None);
    let path = temp_file.path();

    let entry = {
        let reader = PakReader::open_file(path).unwrap();
        reader
            .find_entry(kpka::hash_path("test.txt").unwrap())
            .unwrap()
            .clone()
    };
    corrupt_bytes_at(path, entry.offset, b"J");

    // Default mode does not recheck checksums
    let mut lenient = PakReader::open_file(path).unwrap();
    let data = lenient.read_file("test.txt").unwrap().unwrap();
    assert_eq!(data[0], b'J');

    let strict = ReadOptions {
        verify_checksums: true,
    };
    let mut reader = PakReader::open_file_with(path, strict, None).unwrap();
    assert!(matches!(
        reader.read_file("test.txt"),
        Err(PakError::ChecksumMismatch { .. })
    ));
}

#[test]
fn test_index_tampering_caught_by_header_hash_in_strict_mode() {
    let temp_file = create_test_archive(CompressionMethod::None);
    let path = temp_file.path();
    let record = record_offset_of(path, "test.txt");

    // Change the recorded checksum, leaving the header hash stale
    corrupt_bytes_at(path, record + 40, &[0x42]);

    assert!(PakReader::open_file(path).is_ok());

    let strict = ReadOptions {
        verify_checksums: true,
    };
    let result = PakReader::open_file_with(path, strict, None);
    assert!(matches!(result, Err(PakError::HeaderHashMismatch { .. })));
}

#[test]
fn test_garbage_never_panics() {
    for len in [0usize, 1, 15, 16, 17, 64, 200] {
        let mut data: Vec<u8> = (0..len).map(|i| (i * 31 % 256) as u8).collect();
        if len >= 4 {
            data[..4].copy_from_slice(b"KPKA");
        }
        let _ = PakReader::new(Cursor::new(data));
    }
}
