use std::collections::BTreeMap;

use thiserror::Error;

/// Field name mapped to a user-facing message. Any entry rejects the whole
/// operation; nothing is partially applied.
pub type FieldErrors = BTreeMap<&'static str, String>;

/// Errors from the key-value storage partition.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage key '{key}' could not be read")]
    ReadFailed {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("storage key '{key}' could not be written")]
    WriteFailed {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("storage key '{key}' could not be encoded")]
    EncodeFailed {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from ticket store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The draft was rejected; no mutation took place.
    #[error("validation failed")]
    Validation(FieldErrors),

    #[error("ticket #{id} not found")]
    NotFound { id: i64 },

    /// The persistence write failed; the last persisted snapshot is intact.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors from the session gate.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("validation failed")]
    Validation(FieldErrors),

    #[error("an account with this email already exists")]
    EmailTaken,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Storage(#[from] StorageError),
}
