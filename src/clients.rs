pub mod base;
pub mod openai;

pub use base::{DEFAULT_INSTRUCTION, ImageUpload, InferenceClient, LegAnalyzer};
pub use openai::OpenAiClient;
