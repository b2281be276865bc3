//! Error types for the store layer.
//!
//! Note what is *not* here: corrupt or partial session entries. Those are
//! recovered inside [`SessionStore::load`](crate::SessionStore::load) and
//! never surface. These variants are for a storage environment that is
//! actually broken.

/// Errors that can occur while reading or writing durable storage.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The storage backend could not be read or written.
    #[error("storage unavailable: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file exists but isn't a key/value object.
    ///
    /// Only [`FileStorage`](crate::FileStorage) produces this. It means the
    /// whole origin store is damaged, which is a different thing from one
    /// session entry being garbage.
    #[error("storage file is corrupt: {0}")]
    Corrupt(serde_json::Error),

    /// A value could not be serialized for storage.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The backend refused the operation (quota, lock poisoned, etc.).
    #[error("storage backend failure: {0}")]
    Backend(String),
}
