//! Error types for the persistence layer.
//!
//! Gameplay never fails: "not enough coins" and similar outcomes are plain
//! `bool` / `Option` values. Only the storage backend and JSON encoding can go
//! wrong, and those surface as [`StoreError`].

/// Failure while reading or writing a persisted record.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No storage backend is reachable (e.g. `localStorage` disabled).
    #[error("storage backend unavailable")]
    Unavailable,

    /// The backend rejected an operation (quota exceeded, security error, ...).
    #[error("storage backend rejected `{key}`: {message}")]
    Backend { key: String, message: String },

    /// The record could not be encoded as JSON.
    #[error("failed to encode record `{key}`")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;
