//! Leg image analysis service.
//!
//! An uploaded image goes to a vision-capable language model; whatever the
//! model answers (plain text, JSON text or typed content segments) is
//! normalized into one fixed [`AnalysisResult`] shape, or an
//! [`AnalysisError`] when the call itself failed.

pub mod clients;
pub mod config;
pub mod models;
pub mod normalizer;
pub mod routes;
pub mod server;
pub mod utils;

pub use models::*;
pub use normalizer::normalize;
pub use utils::init_tracing;

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Rust-powered leg image analysis with a safe response normalizer.
///
/// Classes:
///     Credentials: API key, endpoint and model for the inference service
///     LegAnalysisClient: Sends images for analysis and normalizes the answers
///
/// Functions:
///     normalize_text: Normalizes one raw model answer without any network call
///
/// Example:
///     >>> from limbscan import LegAnalysisClient, Credentials
///     >>> client = LegAnalysisClient([Credentials("sk-...")], enable_logs=True)
///     >>> client.analyze_image(open("leg.jpg", "rb").read(), "leg.jpg")
#[cfg(feature = "python")]
#[pymodule]
fn limbscan(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<models::Credentials>()?;
    m.add_class::<models::LegAnalysisClient>()?;
    m.add_function(wrap_pyfunction!(models::analysis_client::normalize_text, m)?)?;
    Ok(())
}
