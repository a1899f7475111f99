use std::sync::Arc;
use std::time::Duration;

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pythonize::pythonize;
use tokio::runtime::Runtime;

use crate::clients::{DEFAULT_INSTRUCTION, ImageUpload, InferenceClient, LegAnalyzer, OpenAiClient};
use crate::init_tracing;
use crate::models::{Credentials, RawInferenceOutput};
use crate::normalizer::normalize;
use crate::utils::resolve_image_type;

/// A client that analyzes leg images with a vision language model.
///
/// Every answer is normalized into the same dict shape:
/// ``{"observations": [...], "general_info": str, "risk_level": str,
/// "visual_markers": [{"label": str, "x": float, "y": float}]}``.
///
/// Args:
///     credentials (list[Credentials]): One or more credential sets, used round-robin
///     enable_logs (bool): Install a stderr log subscriber
///     instruction (str | None): Instruction sent with every image
///     timeout_secs (int): Timeout of one inference call
///
/// Example:
///     >>> client = LegAnalysisClient([Credentials("sk-...")], enable_logs=True)
#[pyclass]
pub struct LegAnalysisClient {
    runtime: Runtime,
    analyzer: Arc<LegAnalyzer>,
}

#[pymethods]
impl LegAnalysisClient {
    #[new]
    #[pyo3(signature = (credentials, enable_logs=false, instruction=None, timeout_secs=60))]
    pub fn new(
        credentials: Vec<Credentials>,
        enable_logs: bool,
        instruction: Option<String>,
        timeout_secs: u64,
    ) -> PyResult<Self> {
        if enable_logs {
            init_tracing("info");
        }
        let timeout = Duration::from_secs(timeout_secs.max(1));
        let clients = credentials
            .into_iter()
            .map(|creds| {
                OpenAiClient::new(creds, timeout)
                    .map(|client| Arc::new(client) as Arc<dyn InferenceClient>)
            })
            .collect::<anyhow::Result<Vec<_>>>()
            .map_err(|e| PyRuntimeError::new_err(e.to_string()))?;
        let analyzer = LegAnalyzer::new(
            clients,
            instruction.unwrap_or_else(|| DEFAULT_INSTRUCTION.to_string()),
        )
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
        let runtime = Runtime::new()
            .map_err(|e| PyRuntimeError::new_err(format!("Failed to start runtime: {}", e)))?;

        Ok(Self {
            runtime,
            analyzer: Arc::new(analyzer),
        })
    }

    /// Analyze one image.
    ///
    /// Args:
    ///     image (bytes): JPEG, PNG or WEBP image data
    ///     file_name (str | None): Original file name, used for type detection and logs
    ///
    /// Returns:
    ///     dict: The normalized analysis
    ///
    /// Raises:
    ///     ValueError: The image is not a supported type
    ///     RuntimeError: The inference call failed
    #[pyo3(signature = (image, file_name=None))]
    pub fn analyze_image(
        &self,
        py: Python,
        image: &[u8],
        file_name: Option<String>,
    ) -> PyResult<Py<PyAny>> {
        let content_type = resolve_image_type(None, file_name.as_deref(), image).ok_or_else(|| {
            PyValueError::new_err("Unsupported image type. Expected JPEG, PNG or WEBP.")
        })?;
        let upload = ImageUpload {
            bytes: image.to_vec(),
            content_type,
            file_name,
        };

        let outcome = py.detach(|| self.runtime.block_on(self.analyzer.analyze(&upload)));
        match outcome {
            Ok(result) => Ok(pythonize(py, &result)?.unbind()),
            Err(err) => Err(PyRuntimeError::new_err(err.message)),
        }
    }

    /// Analyze local image files concurrently.
    ///
    /// Args:
    ///     file_paths (list[str]): Paths of the images
    ///     max_concurrency (int): Maximum number of inference calls in flight
    ///
    /// Returns:
    ///     list: One item per path, in order, either the analysis dict or an
    ///         Exception describing why that file failed
    #[pyo3(signature = (file_paths, max_concurrency=4))]
    pub fn analyze_batch_from_file_paths(
        &self,
        py: Python,
        file_paths: Vec<String>,
        max_concurrency: usize,
    ) -> PyResult<Vec<Py<PyAny>>> {
        let rust_results = py.detach(move || {
            self.runtime.block_on(
                self.analyzer
                    .analyze_batch_from_file_paths(&file_paths, max_concurrency),
            )
        });

        let mut py_results = Vec::new();
        let py_exception = py.import("builtins")?.getattr("Exception")?;

        for res in rust_results {
            match res {
                Ok(result) => py_results.push(pythonize(py, &result)?.unbind()),
                Err(err_string) => {
                    py_results.push(py_exception.call1((err_string,))?.unbind());
                }
            }
        }

        Ok(py_results)
    }
}

/// Normalize one raw model answer without calling any service.
///
/// Args:
///     text (str): Model output, plain text or a JSON object
///
/// Returns:
///     dict: The normalized analysis
#[pyfunction]
pub fn normalize_text(py: Python, text: String) -> PyResult<Py<PyAny>> {
    match normalize(RawInferenceOutput::from_text(text)) {
        Ok(result) => Ok(pythonize(py, &result)?.unbind()),
        Err(err) => Err(PyRuntimeError::new_err(err.message)),
    }
}
