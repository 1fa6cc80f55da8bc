mod cipher;
mod codec;
mod extract;
mod format;
mod reader;
mod writer;

pub use cipher::IndexDecryptor;
pub use codec::{
    compress, decompress, sniff_container, CompressionLevels, CompressionMethod, ContainerKind,
    MIN_SNIFF_SIZE,
};
pub use extract::{unknown_name, ExtractFailure, ExtractReport};
pub use format::{
    PakEntry, PakHeader, ENTRY_SIZE_V2, ENTRY_SIZE_V4, FEATURE_ENCRYPTED_INDEX, FEATURE_NONE,
    FORMAT_VERSION_MAJOR, FORMAT_VERSION_MINOR, HEADER_SIZE, KEY_BLOCK_SIZE, MAGIC_NUMBER,
};
pub use reader::PakReader;
pub use writer::{PakBuilder, PendingEntry};
