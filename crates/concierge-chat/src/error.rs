//! Error types for the conversational layer.

use thiserror::Error;

/// Failures of the fallback responder. Each degrades to an apology; none is
/// fatal to the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponderError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Quota or authentication error: {0}")]
    QuotaOrAuth(String),
    #[error("Content policy block: {0}")]
    ContentPolicy(String),
}

impl ResponderError {
    /// The in-character reply shown to the user instead of an answer.
    pub fn apology(&self) -> String {
        match self {
            ResponderError::Network(_) => "My apologies, I seem to be experiencing a momentary \
                lapse in communication. Could you try that again?"
                .to_string(),
            ResponderError::QuotaOrAuth(_) => "There appears to be an issue with the API key \
                configuration or my usage allowance. I am unable to connect at the moment."
                .to_string(),
            ResponderError::ContentPolicy(reason) => format!(
                "I'm unable to respond to that request due to content policy: {}",
                reason
            ),
        }
    }
}

impl From<reqwest::Error> for ResponderError {
    fn from(err: reqwest::Error) -> Self {
        ResponderError::Network(err.to_string())
    }
}

/// Errors from setting up the chat layer.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Invalid responder endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },
    #[error("HTTP client could not be built: {0}")]
    Client(String),
}
