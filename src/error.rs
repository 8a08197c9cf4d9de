//! Typed errors for the retrieval core.
//!
//! Library code returns [`Result`]; the binary wraps these in `anyhow` at the
//! edge. Store and index failures propagate unmodified so callers can tell an
//! empty result set apart from a failed search.

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Referenced activity or vector does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Malformed activity, intent, or vector. Rejected before reaching the store.
    #[error("validation error: {0}")]
    Validation(String),
    /// Transient I/O or locking failure. Safe to retry with backoff.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    /// An activity without its vector, or a vector without its activity.
    #[error("index inconsistency: {0}")]
    IndexInconsistency(String),
    #[error("embedding failed: {0}")]
    Embedding(String),
    /// A search or write exceeded its deadline. Safe to retry.
    #[error("timed out: {0}")]
    Timeout(String),
    #[error(transparent)]
    Storage(rusqlite::Error),
    /// A background task panicked or a lock was poisoned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the caller may retry the operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::Timeout(_))
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn not_found(what: &str, id: &str) -> Self {
        Self::NotFound(format!("{what} {id}"))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;

        match err.sqlite_error_code() {
            Some(
                ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::SystemIoFailure
                | ErrorCode::CannotOpen,
            ) => Self::StoreUnavailable(err.to_string()),
            _ => Self::Storage(err),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation(format!("invalid JSON: {err}"))
    }
}
