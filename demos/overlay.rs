/// Patch overlay example: a base archive plus two patches
///
/// Run with: cargo run --example overlay
use kpka::{patch_path, CompressionMethod, PakBuilder, PatchChain};
use std::error::Error;
use std::path::Path;

fn write(path: &Path, files: &[(&str, &str)]) -> Result<(), Box<dyn Error>> {
    let mut builder = PakBuilder::new();
    for (name, text) in files {
        builder.add_entry(name, text.as_bytes().to_vec())?;
    }
    builder.save_to_file(path, CompressionMethod::Deflate)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    println!("=== kpka Overlay Example ===\n");

    let base = Path::new("example_chunk_000.pak");
    write(base, &[("a.txt", "v1 from base"), ("c.txt", "only in base")])?;
    write(&patch_path(base, 1), &[("a.txt", "v2 from patch 1"), ("b.txt", "added by patch 1")])?;
    write(&patch_path(base, 2), &[("d.txt", "added by patch 2")])?;

    let chain = PatchChain::open(base)?;
    println!("Opened chain with {} layers", chain.len());

    for path in ["a.txt", "b.txt", "c.txt", "d.txt", "missing.txt"] {
        match chain.get_file_data(path)? {
            Some(data) => println!(
                "  {:<12} layer {} -> {}",
                path,
                chain.layer_of(path).unwrap_or_default(),
                String::from_utf8_lossy(&data)
            ),
            None => println!("  {:<12} not found", path),
        }
    }

    if let Some(next) = chain.next_patch_path() {
        println!("\nNew changes belong in {}", next.display());
    }

    Ok(())
}
