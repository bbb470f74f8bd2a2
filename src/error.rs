use std::fmt;

use serde_json::Error as JsonError;

use crate::response::ResponseEnvelope;

/// Failure outcomes of the request pipeline.
///
/// `Status` carries the fully decoded response envelope so callers (and the
/// failure hook) can inspect whatever body the server sent alongside the
/// error status. `Transport` wraps exchanges that never produced a response.
#[derive(Debug)]
pub enum HttpApiError {
    /// The underlying exchange could not complete (network, DNS, timeout).
    Transport(reqwest::Error),
    /// The server responded with status >= 400. The envelope holds the
    /// decoded body and response headers.
    Status(ResponseEnvelope),
    Serde(JsonError),
    InvalidHeader(String),
    /// An id-addressed operation was called with an empty id.
    MissingId,
}

impl HttpApiError {
    /// Response status code, when a response was received at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status(envelope) => Some(envelope.status),
            Self::Transport(error) => error.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    /// The decoded response envelope for status failures.
    pub fn envelope(&self) -> Option<&ResponseEnvelope> {
        match self {
            Self::Status(envelope) => Some(envelope),
            _ => None,
        }
    }
}

impl fmt::Display for HttpApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(error) => write!(f, "transport error: {error}"),
            Self::Status(envelope) => write!(f, "HTTP {}", envelope.status),
            Self::Serde(error) => write!(f, "serialization error: {error}"),
            Self::InvalidHeader(message) => write!(f, "invalid header: {message}"),
            Self::MissingId => write!(f, "a model id is required"),
        }
    }
}

impl std::error::Error for HttpApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(error) => Some(error),
            Self::Serde(error) => Some(error),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for HttpApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(error)
    }
}

impl From<JsonError> for HttpApiError {
    fn from(error: JsonError) -> Self {
        Self::Serde(error)
    }
}
