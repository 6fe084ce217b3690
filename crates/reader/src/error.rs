use thiserror::Error;

/// The result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The cursor does not mark the start of a line.
    #[error("cursor {cursor} is not a line start (file size {size})")]
    InvalidCursor {
        /// The rejected cursor.
        cursor: u64,
        /// Size of the file when the read started.
        size: u64,
    },

    /// IO operation failed.
    #[error("{0}: {1}")]
    Io(&'static str, #[source] std::io::Error),

    /// No log file exists under the requested name.
    #[error("log file not found: {0}")]
    NotFound(String),
}
