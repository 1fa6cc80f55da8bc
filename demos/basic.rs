/// Basic example demonstrating archive creation and reading
///
/// Run with: cargo run --example basic
use kpka::{CompressionMethod, PakBuilder, PakReader, PathRegistry};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    println!("=== kpka Basic Example ===\n");

    // Create an archive
    println!("1. Creating archive...");
    create_archive()?;

    // Read from the archive
    println!("\n2. Reading from archive...");
    read_archive()?;

    println!("\nExample complete!");
    Ok(())
}

fn create_archive() -> Result<(), Box<dyn Error>> {
    let mut builder = PakBuilder::new();

    builder.add_entry(
        "natives/stm/readme.txt",
        b"This is a readme file for the basic example.".to_vec(),
    )?;
    builder.add_entry(
        "natives/stm/data.json",
        br#"{"name": "Basic Example", "version": "1.0.0"}"#.to_vec(),
    )?;

    // Containers with their own compression are always stored raw
    let mut movie = b"CRID\0\0\0\x18".to_vec();
    movie.extend_from_slice(&[0u8; 1000]);
    builder.add_entry("natives/stm/movie/intro.usm", movie)?;

    let entries = builder.save_to_file("example_basic.pak", CompressionMethod::Zstd)?;
    println!("   Archive created: example_basic.pak ({} entries)", entries.len());

    Ok(())
}

fn read_archive() -> Result<(), Box<dyn Error>> {
    let mut reader = PakReader::open_file("example_basic.pak")?;

    let mut registry = PathRegistry::new();
    for path in ["natives/stm/readme.txt", "natives/stm/data.json"] {
        registry.insert(path)?;
    }

    // Entries carry no names, only hashes
    println!("   Entries in archive:");
    for entry in reader.entries() {
        let name = registry.resolve(entry.hash).unwrap_or("<unknown>");
        println!(
            "     - {} {:>6} -> {:>6} bytes ({}) {}",
            entry.hash,
            entry.compressed_size,
            entry.decompressed_size,
            entry.compression().map_or("unknown", |method| method.name()),
            name
        );
    }

    // Lookups are case-insensitive
    if let Some(data) = reader.read_file("NATIVES/STM/README.TXT")? {
        println!("\n   readme.txt: {}", String::from_utf8_lossy(&data));
    }

    Ok(())
}
