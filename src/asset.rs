//! Boundary to external object-graph parsers
//!
//! Game data files (scenes, user files) are parsed by a separate library.
//! Code here only sees a decoded document through field access, while the
//! archive layer supplies and collects the bytes.

use crate::archive::PakBuilder;
use crate::error::Result;
use crate::overlay::PatchChain;
use std::io::{Read, Seek};

/// A field value exposed by a decoded asset
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
}

/// Named field access on a decoded asset
pub trait FieldAccess {
    fn get_field(&self, name: &str) -> Option<FieldValue>;
    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<()>;
}

/// Converts asset bytes to and from an editable document
pub trait AssetCodec {
    type Document: FieldAccess;

    fn decode(&self, bytes: &[u8]) -> Result<Self::Document>;
    fn encode(&self, document: &Self::Document) -> Result<Vec<u8>>;
}

/// Read the newest copy of `path`, edit it, and queue the result in `builder`.
///
/// Returns `Ok(false)` when no layer holds `path`.
pub fn patch_asset<R, C, F>(
    chain: &PatchChain<R>,
    builder: &mut PakBuilder,
    path: &str,
    codec: &C,
    edit: F,
) -> Result<bool>
where
    R: Read + Seek,
    C: AssetCodec,
    F: FnOnce(&mut C::Document) -> Result<()>,
{
    let Some(bytes) = chain.get_file_data(path)? else {
        return Ok(false);
    };
    let mut document = codec.decode(&bytes)?;
    edit(&mut document)?;
    builder.add_entry(path, codec.encode(&document)?)?;
    Ok(true)
}
