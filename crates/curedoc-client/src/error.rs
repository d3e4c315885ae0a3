use thiserror::Error;

/// Failure reading or writing the local history
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("failed to encode history: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failure of one remote operation
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("server returned HTTP {status}")]
    Status { status: u16, message: Option<String> },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ClientError {
    /// The `error` field the server sent back, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// Local rejection of a follow-up submission; no request is made
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FollowupError {
    #[error("no follow-up questions are pending")]
    NotAwaiting,

    #[error("expected {expected} answers, got {got}")]
    CountMismatch { expected: usize, got: usize },

    /// Indices of the answers that were blank
    #[error("Please answer all follow-up questions before submitting.")]
    Blank(Vec<usize>),
}
