// src/error.rs
// =============================================================================
// Hard failures of the repository client.
//
// Most things that go wrong (bad URL, rejected token, a failing branch page,
// a missing file) are recovered locally and only logged. The variants here
// are the few that reach the caller as an Err.
// =============================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    /// The bulk loader was invoked before init() finished successfully
    #[error("repository client is not ready: call init() with a valid repository URL first")]
    NotReady,

    /// The client configuration cannot be used (bad API URL, bad header value)
    #[error("invalid client configuration for '{value}': {reason}")]
    Config { value: String, reason: String },

    /// The HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Errors raised by the recursive loader are passed through as-is
    #[error(transparent)]
    Loader(anyhow::Error),
}

pub type Result<T> = std::result::Result<T, IngestError>;
