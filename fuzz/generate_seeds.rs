//! Generate seed corpus for fuzzing

use kpka::{CompressionMethod, PakBuilder};
use std::fs;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let corpus_dir = "fuzz/corpus/fuzz_archive_parse";
    fs::create_dir_all(corpus_dir)?;

    println!("Generating seed corpus...");

    let seeds: [(&str, Vec<(&str, Vec<u8>)>, CompressionMethod); 4] = [
        ("seed_empty", vec![], CompressionMethod::None),
        (
            "seed_single_small",
            vec![("test.txt", b"Hello, World!".to_vec())],
            CompressionMethod::None,
        ),
        (
            "seed_deflate",
            vec![
                ("natives/stm/a.txt", b"deflate me ".repeat(40)),
                ("natives/stm/b.bin", vec![0xAB; 512]),
            ],
            CompressionMethod::Deflate,
        ),
        (
            "seed_zstd_container",
            vec![
                ("natives/stm/a.txt", b"zstd me ".repeat(40)),
                ("natives/stm/movie.usm", b"CRID\0\0\0\x18movie".to_vec()),
            ],
            CompressionMethod::Zstd,
        ),
    ];

    for (name, files, method) in seeds {
        let path = format!("{}/{}.pak", corpus_dir, name);
        let mut builder = PakBuilder::new();
        for (file, data) in files {
            builder.add_entry(file, data)?;
        }
        builder.save_to_file(&path, method)?;
        println!("Generated: {}", path);
    }

    Ok(())
}
