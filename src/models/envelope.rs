use serde::{Deserialize, Serialize};

use crate::models::analysis::{AnalysisResult, DISCLAIMER};

/// Body of a successful `POST /api/analyze-leg`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AnalyzeLegResponse {
    pub status: String,
    pub data: AnalyzeLegData,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AnalyzeLegData {
    pub analysis: AnalysisResult,
    pub disclaimer: String,
}

impl AnalyzeLegResponse {
    pub fn success(analysis: AnalysisResult) -> Self {
        Self {
            status: "success".to_string(),
            data: AnalyzeLegData {
                analysis,
                disclaimer: DISCLAIMER.to_string(),
            },
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HealthResponse {
    pub message: String,
}
