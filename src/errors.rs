use std::fmt;

/// Errors surfaced by the feed client and the records built from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request did not complete or the server answered with a non-success status.
    Transport(String),
    /// The response body could not be decoded into the expected XML structure.
    Parse(String),
    /// The record carries no identifier, so no resource path can be built.
    MissingIdentifier,
    /// The client could not be constructed from its configuration.
    Config(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Transport(msg) => write!(f, "Transport error: {}", msg),
            ApiError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ApiError::MissingIdentifier => {
                write!(f, "Record has no 'url', 'id' or 'branchid' attribute")
            }
            ApiError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    /// Converts a `reqwest::Error` into a transport failure.
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

impl From<roxmltree::Error> for ApiError {
    fn from(err: roxmltree::Error) -> Self {
        ApiError::Parse(err.to_string())
    }
}
