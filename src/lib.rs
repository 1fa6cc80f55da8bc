//! kpka: reader, builder and patch-overlay resolver for KPKA asset packages
//!
//! KPKA archives store game assets addressed only by a hash of their path.
//! This crate provides:
//! - Parsing of version 2 and version 4 archives, with optional injected
//!   index decryption
//! - Archive building with per-entry codec selection (None/Deflate/Zstd)
//!   and a hash-sorted index
//! - Patch chains that layer `*.patch_NNN.pak` files over a base archive
//! - A known-path registry for readable extraction output
//!
//! # Example
//!
//! ```no_run
//! use kpka::{CompressionMethod, PakBuilder, PatchChain};
//!
//! // Create an archive
//! let mut builder = PakBuilder::new();
//! builder.add_entry("natives/stm/data.txt", b"Hello, World!".to_vec())?;
//! builder.save_to_file("re_chunk_000.pak", CompressionMethod::Zstd)?;
//!
//! // Read through the base and any patches next to it
//! let chain = PatchChain::open("re_chunk_000.pak")?;
//! let data = chain.get_file_data("natives/stm/data.txt")?;
//! # Ok::<(), kpka::PakError>(())
//! ```

// Core modules
pub mod archive;
pub mod asset;
pub mod config;
pub mod error;
pub mod hash;
pub mod overlay;
pub mod registry;

// Re-export commonly used types
pub use archive::{
    CompressionMethod, ExtractReport, IndexDecryptor, PakBuilder, PakEntry, PakHeader, PakReader,
    ENTRY_SIZE_V2, ENTRY_SIZE_V4, HEADER_SIZE, KEY_BLOCK_SIZE, MAGIC_NUMBER,
};
pub use asset::{patch_asset, AssetCodec, FieldAccess, FieldValue};
pub use config::{BuildConfig, ExtractOptions, PakConfig, ReadOptions};
pub use error::{PakError, Result};
pub use hash::{hash_content, hash_path, PathHash};
pub use overlay::{discover_chain, patch_path, PatchChain};
pub use registry::PathRegistry;
