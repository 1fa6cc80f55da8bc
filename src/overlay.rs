//! Patch overlays
//!
//! A game data root is one base archive plus numbered patches written next
//! to it:
//!
//! ```text
//! re_chunk_000.pak
//! re_chunk_000.pak.patch_001.pak
//! re_chunk_000.pak.patch_002.pak
//! ```
//!
//! [`PatchChain`] opens them all and resolves paths with last-writer-wins
//! semantics: the highest numbered patch holding a path shadows every
//! layer below it.

use crate::archive::{IndexDecryptor, PakReader};
use crate::config::ReadOptions;
use crate::error::{PakError, Result};
use crate::hash::{hash_path, PathHash};
use parking_lot::Mutex;
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};
use tracing::debug;

const PATCH_INFIX: &str = ".patch_";
const PAK_SUFFIX: &str = ".pak";

/// Path of patch `number` for `base`
pub fn patch_path(base: &Path, number: u32) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(format!("{}{:03}{}", PATCH_INFIX, number, PAK_SUFFIX));
    PathBuf::from(name)
}

/// Split `foo.pak.patch_002.pak` into (`foo.pak`, 2)
fn split_patch_suffix(path: &Path) -> Option<(PathBuf, u32)> {
    let name = path.file_name()?.to_str()?;
    let (stem, rest) = name.rsplit_once(PATCH_INFIX)?;
    let digits = rest.strip_suffix(PAK_SUFFIX)?;
    if stem.is_empty() || digits.len() != 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let number = digits.parse().ok()?;
    Some((path.with_file_name(stem), number))
}

/// List the archives of a chain, base first.
///
/// A path naming a patch pins the chain to patches `1..=N`, all of which
/// must exist. A bare base path picks up consecutive patches until the
/// first missing number.
pub fn discover_chain(path: &Path) -> Result<Vec<PathBuf>> {
    let mut layers = Vec::new();
    match split_patch_suffix(path) {
        Some((base, last)) => {
            if !base.is_file() {
                return Err(PakError::MissingPatch(base));
            }
            layers.push(base.clone());
            for number in 1..=last {
                let patch = patch_path(&base, number);
                if !patch.is_file() {
                    return Err(PakError::MissingPatch(patch));
                }
                layers.push(patch);
            }
        }
        None => {
            layers.push(path.to_path_buf());
            for number in 1.. {
                let patch = patch_path(path, number);
                if !patch.is_file() {
                    break;
                }
                layers.push(patch);
            }
        }
    }
    debug!(base = %layers[0].display(), patches = layers.len() - 1, "Discovered patch chain");
    Ok(layers)
}

/// Ordered archives, index 0 the base and the last the newest patch
pub struct PatchChain<R> {
    layers: Vec<Mutex<PakReader<R>>>,
    paths: Vec<PathBuf>,
}

impl PatchChain<BufReader<File>> {
    /// Discover and open every archive of the chain containing `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, ReadOptions::default(), None)
    }

    pub fn open_with<P: AsRef<Path>>(
        path: P,
        options: ReadOptions,
        decryptor: Option<&dyn IndexDecryptor>,
    ) -> Result<Self> {
        let paths = discover_chain(path.as_ref())?;
        let mut layers = Vec::with_capacity(paths.len());
        for path in &paths {
            let reader = PakReader::open_file_with(path, options.clone(), decryptor).map_err(|e| {
                PakError::Layer {
                    path: path.clone(),
                    source: Box::new(e),
                }
            })?;
            layers.push(Mutex::new(reader));
        }
        Ok(Self { layers, paths })
    }
}

impl<R: Read + Seek> PatchChain<R> {
    /// Build a chain from already opened readers, lowest priority first
    pub fn from_readers(readers: Vec<PakReader<R>>) -> Self {
        Self {
            layers: readers.into_iter().map(Mutex::new).collect(),
            paths: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Files backing each layer; empty for chains built from readers
    pub fn layer_paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn base_path(&self) -> Option<&Path> {
        self.paths.first().map(PathBuf::as_path)
    }

    /// Where the next patch of this chain should be written
    pub fn next_patch_path(&self) -> Option<PathBuf> {
        let base = self.base_path()?;
        Some(patch_path(base, self.paths.len() as u32))
    }

    /// Index of the layer that wins for `hash`
    pub fn layer_of_hash(&self, hash: PathHash) -> Option<usize> {
        (0..self.layers.len())
            .rev()
            .find(|&index| self.layers[index].lock().find_entry(hash).is_some())
    }

    pub fn layer_of(&self, path: &str) -> Option<usize> {
        hash_path(path).ok().and_then(|hash| self.layer_of_hash(hash))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.layer_of(path).is_some()
    }

    /// Bytes of the newest copy of `path`. A miss in every layer is `Ok(None)`.
    pub fn get_file_data(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let hash = hash_path(path)?;
        self.get_hash_data(hash)
    }

    pub fn get_hash_data(&self, hash: PathHash) -> Result<Option<Vec<u8>>> {
        for layer in self.layers.iter().rev() {
            if let Some(data) = layer.lock().read_hash(hash)? {
                return Ok(Some(data));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_path_format() {
        let base = Path::new("data/re_chunk_000.pak");
        assert_eq!(
            patch_path(base, 1),
            PathBuf::from("data/re_chunk_000.pak.patch_001.pak")
        );
        assert_eq!(
            patch_path(base, 42),
            PathBuf::from("data/re_chunk_000.pak.patch_042.pak")
        );
    }

    #[test]
    fn test_split_patch_suffix() {
        assert_eq!(
            split_patch_suffix(Path::new("dir/re_chunk_000.pak.patch_003.pak")),
            Some((PathBuf::from("dir/re_chunk_000.pak"), 3))
        );
        assert_eq!(split_patch_suffix(Path::new("re_chunk_000.pak")), None);
        assert_eq!(split_patch_suffix(Path::new("a.pak.patch_1.pak")), None);
        assert_eq!(split_patch_suffix(Path::new("a.pak.patch_abc.pak")), None);
    }

    #[test]
    fn test_discover_stops_at_gap() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("game.pak");
        std::fs::write(&base, b"").unwrap();
        std::fs::write(patch_path(&base, 1), b"").unwrap();
        std::fs::write(patch_path(&base, 2), b"").unwrap();
        std::fs::write(patch_path(&base, 4), b"").unwrap();

        let layers = discover_chain(&base).unwrap();
        assert_eq!(
            layers,
            vec![base.clone(), patch_path(&base, 1), patch_path(&base, 2)]
        );
    }

    #[test]
    fn test_discover_pinned_requires_every_patch() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("game.pak");
        std::fs::write(&base, b"").unwrap();
        std::fs::write(patch_path(&base, 1), b"").unwrap();
        std::fs::write(patch_path(&base, 2), b"").unwrap();
        std::fs::write(patch_path(&base, 3), b"").unwrap();

        let pinned = discover_chain(&patch_path(&base, 2)).unwrap();
        assert_eq!(pinned.len(), 3);
        assert_eq!(pinned[0], base);

        std::fs::remove_file(patch_path(&base, 1)).unwrap();
        let missing = discover_chain(&patch_path(&base, 2));
        assert!(matches!(missing, Err(PakError::MissingPatch(p)) if p == patch_path(&base, 1)));
    }
}
