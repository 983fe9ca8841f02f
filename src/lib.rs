//! # docling-gateway
//!
//! A small HTTP gateway that converts uploaded documents into Markdown and a
//! structured JSON document model.
//!
//! Clients `POST` a `multipart/form-data` body with a `file` field to
//! `/convert`. The upload is staged in a private temporary directory, handed
//! to a converter backend once, and both exports of the single result are
//! returned as `{"markdown": ..., "json": ...}`. The staged copy is removed
//! before the response is sent, whether conversion succeeded or not.
//!
//! ## Features
//!
//! - **docling backend**: Runs the docling CLI as a child process
//! - **Built-in text backend**: Plain text and Markdown without external tools
//! - **Shared-secret access control**: Optional `X-Docling-Key` header check
//! - **Scoped temp files**: One private directory per request, always cleaned up
//! - **Limits**: Optional conversion timeout and upload size limit
//!
//! ## Architecture
//!
//! - [`converter`] - Converter trait and backends
//! - [`convert`] - Upload staging and the conversion service
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//! - [`error`] - Error types
//!
//! ## Example
//!
//! ```rust,no_run
//! use docling_gateway::{create_router, ConversionService, PlainTextConverter, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let service = ConversionService::new(PlainTextConverter::new());
//!     let router = create_router(service, RouterConfig::new("my-secret-key"));
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//!     axum::serve(listener, router).await
//! }
//! ```

pub mod config;
pub mod convert;
pub mod converter;
pub mod error;
pub mod server;

// Re-export commonly used types
pub use config::{CheckConfig, Cli, Command, ConverterArgs, ConverterKind, ServeConfig};
pub use convert::{sanitize_file_name, ConversionOutput, ConversionService, StagedUpload};
pub use converter::{
    DoclingCliConverter, DoclingDocument, DocumentConverter, DocumentModel, PlainTextConverter,
    TextDocument,
};
pub use error::{ConvertError, ServiceError, UploadError};
pub use server::{
    auth_middleware, convert_handler, create_router, health_handler, AppState, AuthError,
    ConvertResponse, ErrorResponse, HealthResponse, RouterConfig, SharedSecretAuth,
    API_KEY_HEADER,
};
