use thiserror::Error;

/// Main error type for shard operations
#[derive(Error, Debug)]
pub enum ShardError {
    #[error("malformed query: {0}")]
    MalformedQuery(String),

    #[error("query stream truncated before message complete")]
    TruncatedStream,

    #[error("corrupt segment: {0}")]
    CorruptSegment(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no usable segments under {0}")]
    NoSegments(String),
}

/// Result type alias for shard operations
pub type Result<T> = std::result::Result<T, ShardError>;

impl ShardError {
    /// Whether the error is scoped to a single connection.
    ///
    /// Recoverable errors close the offending connection and leave the
    /// server loop running; everything else is fatal for the process or
    /// for the segment that produced it.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ShardError::MalformedQuery(_) | ShardError::TruncatedStream
        )
    }
}
