use thiserror::Error;

/// Raised before a turn is processed when the API key is missing or unusable.
/// Never corrupts session state: the turn is simply not taken.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("no API key supplied")]
    MissingKey,
    #[error("{0}")]
    Rejected(String),
}

/// Any failure of the remote chat call. Rendered in-line as the assistant's reply.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request to Gemini failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Gemini returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("failed to decode Gemini response: {0}")]
    Decode(String),
    #[error("prompt was blocked by Gemini ({0})")]
    Blocked(String),
    #[error("Gemini returned no text in the response candidates")]
    EmptyResponse,
}
