#[cfg(feature = "python")]
pub mod analysis_client;
pub mod analysis;
pub mod credentials;
pub mod envelope;
pub mod raw_output;

#[cfg(feature = "python")]
pub use analysis_client::LegAnalysisClient;
pub use analysis::*;
pub use credentials::Credentials;
pub use envelope::{AnalyzeLegData, AnalyzeLegResponse, ErrorBody, HealthResponse};
pub use raw_output::{ContentSegment, RawInferenceOutput, TransportFailure};
