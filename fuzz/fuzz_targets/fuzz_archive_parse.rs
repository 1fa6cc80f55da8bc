#![no_main]

use kpka::{PakReader, ReadOptions};
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    // Header is 16 bytes minimum
    if data.len() < 16 {
        return;
    }

    for verify_checksums in [false, true] {
        let options = ReadOptions { verify_checksums };

        // Try to parse - should never panic
        let mut reader = match PakReader::with_options(Cursor::new(data), options, None) {
            Ok(r) => r,
            Err(_) => continue, // Expected for invalid data
        };

        // Try to read each entry - should never panic
        let entries = reader.entries().to_vec();
        for entry in &entries {
            let _ = reader.read_entry(entry);
        }

        // Lookups with various paths - should never panic
        let _ = reader.contains("natives/stm/test.txt");
        let _ = reader.contains("");
        let _ = reader.contains("__Unknown/zz");
        let _ = reader.read_file("../../etc/passwd");
    }
});
