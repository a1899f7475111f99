use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::analysis::FailureKind;

/// Whatever one inference call produced, before normalization.
#[derive(Clone, Debug, PartialEq)]
pub enum RawInferenceOutput {
    Text(String),
    JsonText(String),
    Segments(Vec<ContentSegment>),
    Failed(TransportFailure),
}

impl RawInferenceOutput {
    /// Classifies a bare string answer as JSON text or plain text.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.trim_start().starts_with('{') {
            RawInferenceOutput::JsonText(text)
        } else {
            RawInferenceOutput::Text(text)
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentSegment {
    Text { text: String },
    #[serde(other)]
    Other,
}

impl ContentSegment {
    pub fn text(text: impl Into<String>) -> Self {
        ContentSegment::Text { text: text.into() }
    }
}

/// Failure of the external call itself, as opposed to an odd response body.
///
/// The display strings are fixed so that nothing from the upstream response
/// or the request credentials ever reaches a caller.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum TransportFailure {
    #[error("The analysis service could not be reached")]
    Network,
    #[error("The analysis service did not respond in time")]
    Timeout,
    #[error("The analysis service rejected the configured credentials")]
    Unauthorized,
    #[error("The analysis service is over capacity, try again later")]
    RateLimited,
    #[error("The analysis service rejected the image (status {status})")]
    Rejected { status: u16 },
    #[error("The analysis service failed (status {status})")]
    Upstream { status: u16 },
    #[error("The analysis service returned an unreadable response")]
    MalformedBody,
}

impl TransportFailure {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => TransportFailure::Unauthorized,
            429 => TransportFailure::RateLimited,
            400..=499 => TransportFailure::Rejected { status },
            _ => TransportFailure::Upstream { status },
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            TransportFailure::Network => FailureKind::Network,
            TransportFailure::Timeout => FailureKind::Timeout,
            TransportFailure::Unauthorized => FailureKind::Unauthorized,
            TransportFailure::RateLimited => FailureKind::RateLimited,
            TransportFailure::Rejected { .. } => FailureKind::Rejected,
            TransportFailure::Upstream { .. } => FailureKind::Upstream,
            TransportFailure::MalformedBody => FailureKind::MalformedBody,
        }
    }
}
