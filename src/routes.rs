//! HTTP routes for the analysis service

use axum::{
    Json, Router,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::{info, warn};

use crate::clients::ImageUpload;
use crate::models::{AnalysisError, AnalyzeLegResponse, ErrorBody, FailureKind, HealthResponse};
use crate::server::AppStateArc;
use crate::utils::resolve_image_type;

const UPLOAD_FIELD: &str = "file";

/// Error rendered as `{"error": message}` with a matching status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        let status = match err.kind {
            FailureKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            FailureKind::RateLimited => StatusCode::SERVICE_UNAVAILABLE,
            FailureKind::Rejected => StatusCode::UNPROCESSABLE_ENTITY,
            FailureKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            FailureKind::Network
            | FailureKind::Unauthorized
            | FailureKind::Upstream
            | FailureKind::MalformedBody => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, err.message)
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        let status = err.status();
        warn!(status_code = status.as_u16(), error = %err.body_text(), "Rejected upload");
        let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
            "Uploaded file is too large"
        } else {
            "Malformed multipart upload"
        };
        Self::new(status, message)
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::new(
            rejection.status(),
            "Expected a multipart/form-data upload with a 'file' field",
        )
    }
}

// ============================================================================
// Health Routes
// ============================================================================

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/", get(root))
}

async fn root() -> Json<HealthResponse> {
    Json(HealthResponse {
        message: "LimbScan AI is live!".to_string(),
    })
}

// ============================================================================
// Analysis Routes
// ============================================================================

pub fn analysis_routes() -> Router<AppStateArc> {
    Router::new().route("/api/analyze-leg", post(analyze_leg))
}

async fn analyze_leg(
    State(state): State<AppStateArc>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeLegResponse>, ApiError> {
    let image = read_image(multipart?).await?;
    info!(
        file_name = image.file_name.as_deref().unwrap_or("<unnamed>"),
        content_type = image.content_type,
        image_bytes = image.bytes.len(),
        "Analyzing uploaded leg image"
    );

    let analysis = state.analyzer.analyze(&image).await?;
    Ok(Json(AnalyzeLegResponse::success(analysis)))
}

async fn read_image(mut multipart: Multipart) -> Result<ImageUpload, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let declared = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;
        if bytes.is_empty() {
            return Err(ApiError::bad_request("Uploaded file is empty"));
        }

        let content_type = resolve_image_type(declared.as_deref(), file_name.as_deref(), &bytes)
            .ok_or_else(|| {
                ApiError::new(
                    StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    "Unsupported image type. Upload a JPEG, PNG or WEBP image.",
                )
            })?;

        return Ok(ImageUpload {
            bytes: bytes.to_vec(),
            content_type,
            file_name,
        });
    }
    Err(ApiError::bad_request("Missing 'file' upload field"))
}
