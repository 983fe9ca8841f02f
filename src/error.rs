use std::time::Duration;

use thiserror::Error;

/// Errors raised by a document converter backend
#[derive(Debug, Clone, Error)]
pub enum ConvertError {
    /// The converter does not handle this kind of file (should map to HTTP 415)
    #[error("Unsupported format: {reason}")]
    UnsupportedFormat { reason: String },

    /// The file has a supported format but its content could not be parsed
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// The converter program could not be started
    #[error("Converter unavailable: {0}")]
    Unavailable(String),

    /// The converter ran but exited unsuccessfully
    #[error("Converter exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    /// The converter finished but its output could not be read
    #[error("Invalid converter output: {0}")]
    InvalidOutput(String),

    /// The conversion did not finish within the configured timeout
    #[error("Conversion timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// Filesystem error around the converter call
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ConvertError {
    fn from(err: std::io::Error) -> Self {
        ConvertError::Io(err.to_string())
    }
}

/// Errors raised while receiving and staging an upload
#[derive(Debug, Clone, Error)]
pub enum UploadError {
    /// The multipart form has no `file` field
    #[error("Missing multipart field 'file'")]
    MissingFile,

    /// The multipart body could not be read
    #[error("Invalid multipart body: {0}")]
    Multipart(String),

    /// The upload exceeds the configured body limit
    #[error("Upload too large: {0}")]
    TooLarge(String),

    /// The staging file could not be created or written
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for UploadError {
    fn from(err: std::io::Error) -> Self {
        UploadError::Io(err.to_string())
    }
}

/// Errors surfaced by the conversion endpoint
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    /// Receiving or staging the upload failed
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// The converter failed
    #[error(transparent)]
    Convert(#[from] ConvertError),
}
