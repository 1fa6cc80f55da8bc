use crate::archive::format::KEY_BLOCK_SIZE;
use crate::error::Result;

/// Decrypts an encrypted entry table.
///
/// The transform is game-specific and supplied by the caller. It receives
/// the raw index bytes and the key block stored after them, and must return
/// exactly as many plaintext bytes as it was given.
pub trait IndexDecryptor {
    fn decrypt_index(&self, index: &[u8], key: &[u8; KEY_BLOCK_SIZE]) -> Result<Vec<u8>>;
}

impl<F> IndexDecryptor for F
where
    F: Fn(&[u8], &[u8; KEY_BLOCK_SIZE]) -> Result<Vec<u8>>,
{
    fn decrypt_index(&self, index: &[u8], key: &[u8; KEY_BLOCK_SIZE]) -> Result<Vec<u8>> {
        self(index, key)
    }
}
