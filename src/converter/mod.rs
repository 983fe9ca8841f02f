//! Document converter backends.
//!
//! The gateway never parses documents itself. It hands a file path to a
//! [`DocumentConverter`] and reads two exports back from the resulting
//! [`DocumentModel`]:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           ConversionService             │
//! └────────────────────┬────────────────────┘
//!                      │ convert(path)
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │        DocumentConverter Trait          │
//! └────────────────────┬────────────────────┘
//!                      │
//!          ┌───────────┴───────────┐
//!          ▼                       ▼
//! ┌─────────────────┐    ┌─────────────────────┐
//! │DoclingCliConvert│    │ PlainTextConverter  │
//! │ (docling CLI)   │    │ (txt / markdown)    │
//! └─────────────────┘    └─────────────────────┘
//! ```

mod docling;
mod document;
mod text;

use std::path::Path;

use async_trait::async_trait;

use crate::error::ConvertError;

pub use docling::{DoclingCliConverter, DoclingDocument, DEFAULT_DOCLING_PROGRAM};
pub use document::{DocumentOrigin, NodeRef, TextDocument, TextItem, TextLabel};
pub use text::{PlainTextConverter, TEXT_EXTENSIONS};

/// A converted document that can be exported in the two forms the API returns.
pub trait DocumentModel: Send {
    /// Render the document as Markdown text.
    fn export_to_markdown(&self) -> String;

    /// Render the document as its structured, JSON-serializable model.
    fn export_to_json(&self) -> Result<serde_json::Value, ConvertError>;
}

/// A backend that turns a file on disk into a [`DocumentModel`].
///
/// Implementations infer the input format from the path (usually its
/// extension), so callers must keep the uploaded file's extension.
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    /// The document model this converter produces.
    type Document: DocumentModel + 'static;

    /// Short backend name used in logs.
    fn name(&self) -> &str;

    /// Check that the backend is usable, returning a version or description.
    async fn probe(&self) -> Result<String, ConvertError>;

    /// Convert the file at `path`.
    async fn convert(&self, path: &Path) -> Result<Self::Document, ConvertError>;
}
