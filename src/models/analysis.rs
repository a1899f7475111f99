use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::raw_output::TransportFailure;

/// Text placed in `general_info` whenever the model does not supply its own.
pub const DEFAULT_GENERAL_INFO: &str = "This is a general visual observation only.";

/// Disclaimer attached to every successful HTTP response envelope.
pub const DISCLAIMER: &str = "This analysis is for informational purposes only and is not a \
medical diagnosis. Consult a qualified healthcare professional about any concern.";

/// The canonical analysis record handed back to callers.
///
/// Every shape the inference API may answer with is mapped into this one
/// struct by [`crate::normalize`].
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AnalysisResult {
    pub observations: Vec<String>,
    pub general_info: String,
    pub risk_level: RiskLevel,
    pub visual_markers: Vec<Marker>,
}

impl AnalysisResult {
    /// Result used when the model produced no usable text at all.
    pub fn empty() -> Self {
        Self {
            observations: Vec::new(),
            general_info: DEFAULT_GENERAL_INFO.to_string(),
            risk_level: RiskLevel::Unclear,
            visual_markers: Vec::new(),
        }
    }

    /// Wraps an unstructured answer as a single observation.
    pub fn free_text(text: impl Into<String>) -> Self {
        Self {
            observations: vec![text.into()],
            ..Self::empty()
        }
    }
}

/// A labelled point of interest on the uploaded image.
///
/// Coordinates are normalized to the image size. Values outside `[0, 1]` are
/// kept as the model sent them.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Marker {
    pub label: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    #[default]
    Unclear,
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            "unclear" => Ok(RiskLevel::Unclear),
            _ => Err(format!(
                "Invalid risk level: '{}'. Expected 'low', 'medium', 'high' or 'unclear'.",
                s
            )),
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
            RiskLevel::Unclear => write!(f, "unclear"),
        }
    }
}

/// Coarse cause of a failed analysis, used to pick a response status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    Network,
    Timeout,
    Unauthorized,
    RateLimited,
    Rejected,
    Upstream,
    MalformedBody,
    Internal,
}

/// A failed analysis. `message` is always safe to show to the caller.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct AnalysisError {
    pub message: String,
    #[serde(skip)]
    pub kind: FailureKind,
}

impl AnalysisError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: FailureKind::Internal,
        }
    }
}

impl From<&TransportFailure> for AnalysisError {
    fn from(failure: &TransportFailure) -> Self {
        Self {
            message: failure.to_string(),
            kind: failure.kind(),
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for AnalysisError {}
