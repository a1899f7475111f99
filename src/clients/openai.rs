use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderValue},
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clients::base::{ImageUpload, InferenceClient};
use crate::models::{ContentSegment, Credentials, RawInferenceOutput, TransportFailure};

/// Inference client for the OpenAI Responses API.
pub struct OpenAiClient {
    http: Client,
    credentials: Credentials,
}

#[derive(Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: [InputMessage<'a>; 1],
}

#[derive(Serialize)]
struct InputMessage<'a> {
    role: &'static str,
    content: Vec<InputContent<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum InputContent<'a> {
    InputText { text: &'a str },
    InputImage { image_url: String },
}

#[derive(Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output: Option<Vec<OutputItem>>,
}

#[derive(Deserialize)]
struct OutputItem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Option<Vec<OutputContent>>,
}

#[derive(Deserialize)]
struct OutputContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl ResponsesResponse {
    fn into_segments(self) -> Vec<ContentSegment> {
        self.output
            .unwrap_or_default()
            .into_iter()
            .filter(|item| item.kind == "message")
            .flat_map(|item| item.content.unwrap_or_default())
            .map(|part| match (part.kind.as_str(), part.text) {
                ("output_text", Some(text)) => ContentSegment::Text { text },
                _ => ContentSegment::Other,
            })
            .collect()
    }
}

fn classify(err: &reqwest::Error) -> TransportFailure {
    if err.is_timeout() {
        TransportFailure::Timeout
    } else if err.is_decode() {
        TransportFailure::MalformedBody
    } else if let Some(status) = err.status() {
        TransportFailure::from_status(status.as_u16())
    } else {
        TransportFailure::Network
    }
}

impl OpenAiClient {
    pub fn new(credentials: Credentials, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for the inference API")?;
        Ok(Self { http, credentials })
    }

    pub fn responses_url(&self) -> String {
        format!("{}/responses", self.credentials.endpoint.trim_end_matches('/'))
    }

    async fn request(
        &self,
        image: &ImageUpload,
        instruction: &str,
    ) -> Result<Vec<ContentSegment>, TransportFailure> {
        let image_url = format!(
            "data:{};base64,{}",
            image.content_type,
            STANDARD.encode(&image.bytes)
        );
        let body = ResponsesRequest {
            model: &self.credentials.model,
            input: [InputMessage {
                role: "user",
                content: vec![
                    InputContent::InputText { text: instruction },
                    InputContent::InputImage { image_url },
                ],
            }],
        };

        let mut auth_header_value = HeaderValue::from_str(&format!(
            "Bearer {}",
            self.credentials.api_key.expose_secret()
        ))
        .map_err(|_| TransportFailure::Unauthorized)?;
        auth_header_value.set_sensitive(true);

        let response = self
            .http
            .post(self.responses_url())
            .header(AUTHORIZATION, auth_header_value)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify(&e))?;

        let status = response.status();
        info!(
            model = self.credentials.model.as_str(),
            status_code = status.as_u16(),
            image_bytes = image.bytes.len(),
            "Inference request completed"
        );
        if !status.is_success() {
            warn!(status_code = status.as_u16(), "Inference API returned an error status");
            return Err(TransportFailure::from_status(status.as_u16()));
        }

        let parsed = response
            .json::<ResponsesResponse>()
            .await
            .map_err(|e| classify(&e))?;
        let segments = parsed.into_segments();
        debug!(segments = segments.len(), "Inference response decoded");
        Ok(segments)
    }
}

#[async_trait]
impl InferenceClient for OpenAiClient {
    async fn infer(&self, image: &ImageUpload, instruction: &str) -> RawInferenceOutput {
        match self.request(image, instruction).await {
            Ok(segments) => RawInferenceOutput::Segments(segments),
            Err(failure) => RawInferenceOutput::Failed(failure),
        }
    }
}
