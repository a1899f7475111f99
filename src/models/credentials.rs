#[cfg(feature = "python")]
use pyo3::prelude::*;
use secrecy::SecretString;

/// Default base URL of the OpenAI API.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
/// Default vision-capable model.
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// Represents authentication credentials for the inference API.
///
/// # Fields
///
/// * `api_key` - A secret string containing the API key for authentication.
///   Never logged, serialized or exposed to Python.
/// * `endpoint` - The API base URL, e.g. `https://api.openai.com/v1`.
/// * `model` - The model identifier sent with every request.
#[cfg_attr(feature = "python", pyclass)]
#[cfg_attr(feature = "python", pyo3(from_py_object))]
#[derive(Clone, Debug)]
pub struct Credentials {
    pub api_key: SecretString,
    #[cfg_attr(feature = "python", pyo3(get))]
    pub endpoint: String,
    #[cfg_attr(feature = "python", pyo3(get))]
    pub model: String,
}

impl Credentials {
    pub fn with_defaults(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl Credentials {
    #[new]
    #[pyo3(signature=(api_key, endpoint=None, model=None))]
    pub fn new(api_key: String, endpoint: Option<String>, model: Option<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key),
            endpoint: endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }
}
