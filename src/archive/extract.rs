use crate::archive::codec::sniff_container;
use crate::archive::format::PakEntry;
use crate::archive::reader::{read_entry_data, PakReader};
use crate::config::{ExtractOptions, ReadOptions};
use crate::error::{PakError, Result};
use crate::hash::{PathHash, UNKNOWN_MARKER};
use crate::registry::PathRegistry;
use rayon::prelude::*;
use serde::Serialize;
use std::io::{self, Read, Seek};
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};

/// Outcome of a bulk extraction
#[derive(Debug, Default, Serialize)]
pub struct ExtractReport {
    /// Entries written to disk
    pub extracted: usize,
    /// Written entries named by hash because the registry had no usable path
    pub unknown: usize,
    pub failed: Vec<ExtractFailure>,
}

#[derive(Debug, Serialize)]
pub struct ExtractFailure {
    pub hash: String,
    pub error: String,
}

enum Named {
    Known,
    Unknown,
}

/// Relative output path for a registry name, or `None` if it could escape
/// the destination directory.
fn safe_relative(path: &str) -> Option<PathBuf> {
    if path.starts_with('/') {
        return None;
    }
    let candidate = Path::new(path);
    let mut out = PathBuf::new();
    for component in candidate.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if out.as_os_str().is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Placeholder name for an entry the registry cannot resolve
pub fn unknown_name(hash: PathHash, data: &[u8]) -> String {
    match sniff_container(data) {
        Some(kind) => format!("{}/{}.{}", UNKNOWN_MARKER, hash, kind.extension()),
        None => format!("{}/{}", UNKNOWN_MARKER, hash),
    }
}

fn extract_one<S: Read + Seek>(
    cursor: &mut io::Result<S>,
    entry: &PakEntry,
    base: u64,
    stream_len: u64,
    read_options: &ReadOptions,
    registry: &PathRegistry,
    dest: &Path,
) -> Result<Named> {
    let stream = match cursor {
        Ok(stream) => stream,
        Err(e) => return Err(PakError::Io(io::Error::new(e.kind(), e.to_string()))),
    };
    let data = read_entry_data(stream, base, stream_len, entry, read_options)?;

    let resolved = registry.resolve(entry.hash).and_then(|path| {
        let relative = safe_relative(path);
        if relative.is_none() {
            warn!(hash = %entry.hash, path, "Unsafe registry path, using hash name");
        }
        relative
    });
    let (relative, named) = match resolved {
        Some(relative) => (relative, Named::Known),
        None => (PathBuf::from(unknown_name(entry.hash, &data)), Named::Unknown),
    };

    let target = dest.join(relative);
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&target, &data)?;
    Ok(named)
}

impl<R: Read + Seek> PakReader<R> {
    /// Write every entry under `dest`.
    ///
    /// Entries are processed in parallel. `open_cursor` is called once per
    /// worker to obtain an independent stream onto the same archive bytes,
    /// positioned anywhere; the archive is assumed to start where this
    /// reader's stream started.
    ///
    /// Without `continue_on_error` the first failure stops further entries
    /// from being scheduled and is returned. Entries already running on
    /// other workers may still land in `dest`.
    pub fn extract_all<S, F>(
        &self,
        registry: &PathRegistry,
        dest: &Path,
        options: &ExtractOptions,
        open_cursor: F,
    ) -> Result<ExtractReport>
    where
        S: Read + Seek,
        F: Fn() -> io::Result<S> + Sync,
    {
        let entries = self.entries();
        let base = self.base();
        let stream_len = self.stream_len();
        let read_options = self.options().clone();

        std::fs::create_dir_all(dest)?;

        let extract = |cursor: &mut io::Result<S>, entry: &PakEntry| {
            extract_one(cursor, entry, base, stream_len, &read_options, registry, dest)
        };
        let continue_on_error = options.continue_on_error;

        let run = || -> Result<Vec<(PathHash, Result<Named>)>> {
            if continue_on_error {
                Ok(entries
                    .par_iter()
                    .map_init(
                        || open_cursor(),
                        |cursor, entry| (entry.hash, extract(cursor, entry)),
                    )
                    .collect())
            } else {
                entries
                    .par_iter()
                    .map_init(
                        || open_cursor(),
                        |cursor, entry| extract(cursor, entry).map(|named| (entry.hash, Ok(named))),
                    )
                    .collect()
            }
        };

        let outcomes = match options.threads {
            Some(threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()?
                .install(run)?,
            None => run()?,
        };

        let mut report = ExtractReport::default();
        for (hash, outcome) in outcomes {
            match outcome {
                Ok(Named::Known) => report.extracted += 1,
                Ok(Named::Unknown) => {
                    report.extracted += 1;
                    report.unknown += 1;
                }
                Err(err) if options.continue_on_error => {
                    warn!(%hash, error = %err, "Failed to extract entry");
                    report.failed.push(ExtractFailure {
                        hash: hash.to_string(),
                        error: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        info!(
            extracted = report.extracted,
            unknown = report.unknown,
            failed = report.failed.len(),
            "Extraction finished"
        );
        Ok(report)
    }
}
