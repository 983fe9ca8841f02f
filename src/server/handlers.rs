//! HTTP request handlers for the conversion API.
//!
//! # Endpoints
//!
//! - `POST /convert` - Convert an uploaded document
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::convert::{ConversionOutput, ConversionService};
use crate::converter::DocumentConverter;
use crate::error::{ConvertError, ServiceError, UploadError};

/// Name of the multipart field holding the document.
pub const FILE_FIELD: &str = "file";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the conversion service.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<C: DocumentConverter> {
    /// The conversion service shared by all requests
    pub service: Arc<ConversionService<C>>,
}

impl<C: DocumentConverter> AppState<C> {
    /// Create a new application state with the given conversion service.
    pub fn new(service: ConversionService<C>) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

impl<C: DocumentConverter> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "forbidden", "unsupported_format")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
}

/// Successful conversion response.
#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    /// Markdown export of the document
    pub markdown: String,

    /// Structured export of the document
    pub json: serde_json::Value,
}

impl From<ConversionOutput> for ConvertResponse {
    fn from(output: ConversionOutput) -> Self {
        Self {
            markdown: output.markdown,
            json: output.json,
        }
    }
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert ServiceError to HTTP response.
///
/// Errors are logged by severity:
/// - 4xx errors at WARN level (DEBUG for missing fields)
/// - 5xx errors at ERROR level
impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ServiceError::Upload(err) => match err {
                UploadError::MissingFile => (StatusCode::BAD_REQUEST, "missing_file"),
                UploadError::Multipart(_) => (StatusCode::BAD_REQUEST, "invalid_upload"),
                UploadError::TooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
                UploadError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            },
            ServiceError::Convert(err) => match err {
                ConvertError::UnsupportedFormat { .. } => {
                    (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_format")
                }
                ConvertError::InvalidDocument(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "invalid_document")
                }
                ConvertError::Unavailable(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "converter_unavailable")
                }
                ConvertError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "conversion_timeout"),
                ConvertError::Failed { .. } | ConvertError::InvalidOutput(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "conversion_failed")
                }
                ConvertError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            },
        };
        let message = self.to_string();

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else if matches!(self, ServiceError::Upload(UploadError::MissingFile)) {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);

        (status, Json(error_response)).into_response()
    }
}

fn multipart_error(err: MultipartError) -> UploadError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::TooLarge(err.body_text())
    } else {
        UploadError::Multipart(err.body_text())
    }
}

fn multipart_rejection(rejection: MultipartRejection) -> UploadError {
    UploadError::Multipart(rejection.body_text())
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle document conversion requests.
///
/// # Endpoint
///
/// `POST /convert`
///
/// # Request
///
/// `multipart/form-data` with a `file` field. When a shared secret is
/// configured, the `X-Docling-Key` header must match it (checked by the auth
/// middleware before this handler runs).
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "markdown": "# Title\n\nBody text",
///   "json": { "schema_name": "DoclingDocument", "...": "..." }
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: No `file` field or malformed multipart body
/// - `403 Forbidden`: Missing or wrong shared secret
/// - `413 Payload Too Large`: Upload exceeds the configured limit
/// - `415 Unsupported Media Type`: Converter does not handle the format
/// - `422 Unprocessable Entity`: Converter rejected the document content
/// - `500 Internal Server Error`: Converter failure or filesystem error
/// - `503 Service Unavailable`: Converter program missing
/// - `504 Gateway Timeout`: Conversion exceeded the configured timeout
pub async fn convert_handler<C: DocumentConverter + 'static>(
    State(state): State<AppState<C>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ConvertResponse>, ServiceError> {
    let mut multipart = multipart.map_err(multipart_rejection)?;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            debug!(field = ?field.name(), "Skipping multipart field");
            continue;
        }

        let file_name = field.file_name().map(str::to_owned);
        let mut upload = state.service.stage(file_name.as_deref()).await?;

        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            upload.write_chunk(&chunk).await?;
        }
        upload.finish().await?;

        debug!(
            file_name = ?file_name,
            staged = %upload.path().display(),
            bytes = upload.len(),
            "Upload staged"
        );

        // The staged copy is removed before the response is built
        let output = state.service.convert_staged(upload).await?;
        return Ok(Json(output.into()));
    }

    Err(UploadError::MissingFile.into())
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body `{"ok": true}`
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

// =============================================================================
// Tests
// =============================================================================
