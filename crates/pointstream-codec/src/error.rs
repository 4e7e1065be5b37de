//! Error types for frame decoding.

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors produced while inflating or parsing a frame.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The compressed stream was malformed or truncated.
    #[error("corrupt payload: {0}")]
    CorruptPayload(#[source] std::io::Error),

    /// The raw frame is shorter than its header implies.
    #[error("truncated frame: header implies {expected} bytes, got {actual}")]
    TruncatedFrame { expected: usize, actual: usize },

    /// A frame was constructed with arrays that disagree with its point count.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}
