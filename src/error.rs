use thiserror::Error;

/// Failures that end a recognition session with an error payload.
///
/// Too few notes is not in here: that outcome is carried by
/// [`crate::melody::Encoding::InsufficientNotes`].
#[derive(Debug, Error)]
pub enum MelodyError {
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("audio capture failed: {0}")]
    Capture(String),
    #[error("audio decode failed: {0}")]
    Decode(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("catalog I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("catalog database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("catalog JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid signature pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("unsupported catalog format: {0}")]
    UnsupportedFormat(String),
}

impl StoreError {
    /// Errors worth another attempt: I/O hiccups and a busy or locked database.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Io(_) => true,
            StoreError::Sqlite(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, MelodyError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_failure(code: std::os::raw::c_int) -> StoreError {
        StoreError::Sqlite(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(code),
            None,
        ))
    }

    #[test]
    fn only_busy_locked_and_io_are_transient() {
        assert!(sqlite_failure(rusqlite::ffi::SQLITE_BUSY).is_transient());
        assert!(sqlite_failure(rusqlite::ffi::SQLITE_LOCKED).is_transient());
        assert!(StoreError::Io(std::io::Error::new(std::io::ErrorKind::TimedOut, "timeout")).is_transient());

        assert!(!sqlite_failure(rusqlite::ffi::SQLITE_ERROR).is_transient());
        assert!(!StoreError::Sqlite(rusqlite::Error::InvalidColumnType(
            2,
            "melody_signature_str".into(),
            rusqlite::types::Type::Null,
        ))
        .is_transient());
        assert!(!StoreError::UnsupportedFormat("songs.csv".into()).is_transient());
    }
}
