//! Content hashing used for cache keys and chunk identifiers

use sha2::{Digest, Sha256};

/// Hex SHA-256 of a byte string
pub fn content_hash(bytes: impl AsRef<[u8]>) -> String {
    hex::encode(Sha256::digest(bytes.as_ref()))
}

/// Incremental hasher over length-prefixed fields
///
/// Each field is framed with its length so that `("ab", "c")` and
/// `("a", "bc")` never collide.
#[derive(Default)]
pub struct ContentHasher {
    inner: Sha256,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one field
    pub fn field(&mut self, value: impl AsRef<[u8]>) -> &mut Self {
        let bytes = value.as_ref();
        self.inner.update((bytes.len() as u64).to_le_bytes());
        self.inner.update(bytes);
        self
    }

    /// Finish and return the full hex digest
    pub fn finish(self) -> String {
        hex::encode(self.inner.finalize())
    }
}
