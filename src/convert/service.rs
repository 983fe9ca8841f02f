//! Conversion service orchestrating a single upload's conversion.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   ConversionService                      │
//! │  stage()   → StagedUpload in a private temp directory    │
//! │  convert() → converter call (optional timeout)           │
//! │            → export markdown + json from one result      │
//! └──────────────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

use crate::converter::{DocumentConverter, DocumentModel};
use crate::error::{ConvertError, ServiceError, UploadError};

use super::staging::StagedUpload;

/// Both exports of one converted document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionOutput {
    /// Markdown rendering
    pub markdown: String,

    /// Structured document model
    pub json: serde_json::Value,
}

/// Service that stages uploads and runs them through a converter.
///
/// # Type Parameters
///
/// * `C` - The converter backend
pub struct ConversionService<C: DocumentConverter> {
    converter: C,

    /// Directory under which uploads are staged
    temp_root: PathBuf,

    /// Upper bound for a single converter call (None = wait indefinitely)
    timeout: Option<Duration>,
}

impl<C: DocumentConverter> ConversionService<C> {
    /// Create a service staging uploads in the system temp directory.
    pub fn new(converter: C) -> Self {
        Self {
            converter,
            temp_root: std::env::temp_dir(),
            timeout: None,
        }
    }

    /// Stage uploads under `root` instead of the system temp directory.
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = root.into();
        self
    }

    /// Bound every converter call by `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    pub fn temp_root(&self) -> &Path {
        &self.temp_root
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Create an empty staged upload for a file with the declared name.
    pub async fn stage(&self, file_name: Option<&str>) -> Result<StagedUpload, UploadError> {
        StagedUpload::create(&self.temp_root, file_name).await
    }

    /// Convert a finished staged upload.
    ///
    /// The converter is called exactly once; both exports come from its
    /// result.
    pub async fn convert(&self, upload: &StagedUpload) -> Result<ConversionOutput, ConvertError> {
        let started = Instant::now();
        let conversion = self.converter.convert(upload.path());

        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, conversion).await {
                Ok(result) => result,
                Err(_) => Err(ConvertError::Timeout(limit)),
            },
            None => conversion.await,
        };

        let document = match result {
            Ok(document) => document,
            Err(err) => {
                warn!(
                    converter = self.converter.name(),
                    file_name = upload.file_name(),
                    bytes = upload.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Conversion failed: {}",
                    err
                );
                return Err(err);
            }
        };

        let markdown = document.export_to_markdown();
        let json = document.export_to_json()?;

        info!(
            converter = self.converter.name(),
            file_name = upload.file_name(),
            bytes = upload.len(),
            markdown_len = markdown.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Converted document"
        );

        Ok(ConversionOutput { markdown, json })
    }

    /// Convert a finished upload and remove it.
    ///
    /// A conversion error takes precedence over a cleanup error.
    pub async fn convert_staged(
        &self,
        upload: StagedUpload,
    ) -> Result<ConversionOutput, ServiceError> {
        let result = self.convert(&upload).await;
        let closed = upload.close().await;

        let output = result?;
        closed?;
        Ok(output)
    }
}
