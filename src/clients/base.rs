use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use anyhow::Context;
use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::models::{AnalysisError, AnalysisResult, RawInferenceOutput};
use crate::normalizer::normalize;
use crate::utils::resolve_image_type;

/// Instruction sent with every image unless configured otherwise.
pub const DEFAULT_INSTRUCTION: &str = "Analyze this leg image for visual health indicators. \
Respond with a single JSON object with the keys \"observations\" (list of short strings), \
\"general_info\" (string), \"risk_level\" (one of \"low\", \"medium\", \"high\", \"unclear\") \
and \"visual_markers\" (list of objects with \"label\", and \"x\", \"y\" normalized to 0..1).";

/// An uploaded image ready to be sent for inference.
#[derive(Clone, Debug)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub file_name: Option<String>,
}

/// The external inference boundary.
///
/// Implementations never fail: transport problems come back as
/// [`RawInferenceOutput::Failed`].
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn infer(&self, image: &ImageUpload, instruction: &str) -> RawInferenceOutput;
}

/// Runs images through the inference clients and normalizes the answers.
///
/// Holds one client per credential set and picks them round-robin.
pub struct LegAnalyzer {
    clients: Vec<Arc<dyn InferenceClient>>,
    instruction: String,
    current_index: AtomicUsize,
}

impl LegAnalyzer {
    pub fn new(
        clients: Vec<Arc<dyn InferenceClient>>,
        instruction: impl Into<String>,
    ) -> anyhow::Result<Self> {
        if clients.is_empty() {
            anyhow::bail!("LegAnalyzer needs at least one inference client");
        }
        Ok(Self {
            clients,
            instruction: instruction.into(),
            current_index: AtomicUsize::new(0),
        })
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    fn next_client(&self) -> Arc<dyn InferenceClient> {
        let old_index = self.current_index.fetch_add(1, Ordering::Relaxed);
        self.clients[old_index % self.clients.len()].clone()
    }

    pub async fn analyze(&self, image: &ImageUpload) -> Result<AnalysisResult, AnalysisError> {
        let client = self.next_client();
        let raw = client.infer(image, &self.instruction).await;
        let outcome = normalize(raw);

        let file_name = image.file_name.as_deref().unwrap_or("<unnamed>");
        match &outcome {
            Ok(result) => info!(
                file_name = file_name,
                observations = result.observations.len(),
                markers = result.visual_markers.len(),
                risk_level = %result.risk_level,
                "Leg image analyzed"
            ),
            Err(err) => warn!(
                file_name = file_name,
                kind = ?err.kind,
                "Leg image analysis failed: {}", err.message
            ),
        }
        outcome
    }

    /// Analyzes several images concurrently, at most `max_concurrency` at a
    /// time. Results come back in input order.
    pub async fn analyze_batch(
        self: &Arc<Self>,
        images: Vec<ImageUpload>,
        max_concurrency: usize,
    ) -> Vec<Result<AnalysisResult, AnalysisError>> {
        let semaphore = Arc::new(Semaphore::new(
            max_concurrency.clamp(1, Semaphore::MAX_PERMITS),
        ));
        let tasks = images.into_iter().map(|image| {
            let analyzer = Arc::clone(self);
            let semaphore = semaphore.clone();

            tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return Err(AnalysisError::internal("Batch was cancelled"));
                };
                analyzer.analyze(&image).await
            })
        });

        let results = join_all(tasks).await;

        results
            .into_iter()
            .map(|join_result| match join_result {
                Err(join_err) => {
                    warn!(error = %join_err, "Analysis task panicked");
                    Err(AnalysisError::internal("Analysis task failed unexpectedly"))
                }
                Ok(outcome) => outcome,
            })
            .collect()
    }

    /// Reads and analyzes local image files. Returns one entry per path, in
    /// order; a file that cannot be read or is not a supported image fails
    /// in its own slot without shifting the others.
    pub async fn analyze_batch_from_file_paths(
        self: &Arc<Self>,
        file_paths: &[String],
        max_concurrency: usize,
    ) -> Vec<Result<AnalysisResult, String>> {
        let mut slots: Vec<Result<(), String>> = Vec::with_capacity(file_paths.len());
        let mut images = Vec::new();
        for path in file_paths {
            match load_image(path).await {
                Ok(image) => {
                    slots.push(Ok(()));
                    images.push(image);
                }
                Err(err) => {
                    warn!(file_name = path.as_str(), "Skipping unreadable image: {:#}", err);
                    slots.push(Err(format!("{:#}", err)));
                }
            }
        }

        // analyzed results line up with the Ok slots, in order
        let mut analyzed = self.analyze_batch(images, max_concurrency).await.into_iter();
        slots
            .into_iter()
            .map(|slot| match slot {
                Ok(()) => analyzed
                    .next()
                    .map(|outcome| outcome.map_err(|err| err.message))
                    .unwrap_or_else(|| Err("Analysis result missing".to_string())),
                Err(message) => Err(message),
            })
            .collect()
    }
}

async fn load_image(path: &str) -> anyhow::Result<ImageUpload> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read file {}", path))?;
    let content_type = resolve_image_type(None, Some(path), &bytes)
        .with_context(|| format!("Unsupported image type for {}", path))?;
    Ok(ImageUpload {
        bytes,
        content_type,
        file_name: Some(path.to_string()),
    })
}
