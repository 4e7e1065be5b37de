//! Error types for the streaming pipeline and archive playback.

use pointstream_codec::CodecError;

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by stream and archive sessions.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A frame failed to inflate or parse.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The archive lacks the group that holds its frames.
    #[error("archive has no group named '{0}'")]
    MissingContainerGroup(String),

    /// The archive was readable but no dataset in it is a valid frame.
    #[error("archive contains no valid frames")]
    EmptyArchive,

    /// The archive document itself could not be parsed.
    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    /// Connection-level failure (HTTP fetch or socket).
    #[error("transport error: {0}")]
    Transport(String),

    /// The graphics context could not be set up.
    #[error("render init error: {0}")]
    RenderInit(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidArchive(e.to_string())
    }
}

impl Error {
    /// Whether the error ends the session rather than a single frame.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Codec(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_errors_are_not_terminal() {
        let err = Error::from(CodecError::TruncatedFrame {
            expected: 10,
            actual: 4,
        });
        assert!(!err.is_terminal());
        assert!(err.to_string().contains("truncated frame"));
    }

    #[test]
    fn archive_errors_are_terminal() {
        assert!(Error::EmptyArchive.is_terminal());
        assert!(Error::MissingContainerGroup("frames".into()).is_terminal());
        assert!(
            Error::MissingContainerGroup("frames".into())
                .to_string()
                .contains("'frames'")
        );
    }
}
