//! Test utilities for integration tests.
//!
//! This module provides a mock converter that records every call and helpers
//! for building multipart conversion requests.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;

use docling_gateway::convert::ConversionService;
use docling_gateway::converter::{DocumentConverter, DocumentModel};
use docling_gateway::error::ConvertError;
use docling_gateway::{create_router, RouterConfig, API_KEY_HEADER};

pub const TEST_KEY: &str = "test-shared-secret";

const BOUNDARY: &str = "docling-gateway-test-boundary";

// =============================================================================
// Mock Converter with Call Tracking
// =============================================================================

/// Document produced by [`MockConverter`].
pub struct MockDocument {
    markdown: String,
    json: serde_json::Value,
}

impl DocumentModel for MockDocument {
    fn export_to_markdown(&self) -> String {
        self.markdown.clone()
    }

    fn export_to_json(&self) -> Result<serde_json::Value, ConvertError> {
        Ok(self.json.clone())
    }
}

/// A converter echoing the staged file's content back.
///
/// Clones share their call log, so a test can keep a handle after moving the
/// converter into the router.
#[derive(Clone, Default)]
pub struct MockConverter {
    calls: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<PathBuf>>>,
    failure: Option<ConvertError>,
    delay: Option<Duration>,
}

impl MockConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every conversion with `err`.
    pub fn failing(err: ConvertError) -> Self {
        Self {
            failure: Some(err),
            ..Self::default()
        }
    }

    /// Sleep before reading the staged file.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Paths the converter was called with.
    pub fn seen_paths(&self) -> Vec<PathBuf> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentConverter for MockConverter {
    type Document = MockDocument;

    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self) -> Result<String, ConvertError> {
        Ok("mock 1.0".to_string())
    }

    async fn convert(&self, path: &Path) -> Result<Self::Document, ConvertError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(path.to_path_buf());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(ref err) = self.failure {
            return Err(err.clone());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(MockDocument {
            markdown: format!("# {}\n\n{}", file_name, content),
            json: serde_json::json!({
                "name": file_name,
                "content": content,
            }),
        })
    }
}

// =============================================================================
// Router Helpers
// =============================================================================

/// Build a router staging uploads under `temp_root`.
pub fn test_router<C>(converter: C, temp_root: &Path, config: RouterConfig) -> Router
where
    C: DocumentConverter + 'static,
{
    let service = ConversionService::new(converter).with_temp_root(temp_root);
    create_router(service, config.with_tracing(false))
}

/// Whether `dir` contains no entries.
pub fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

// =============================================================================
// Multipart Request Builders
// =============================================================================

/// A part of a multipart/form-data body.
pub struct Part<'a> {
    pub name: &'a str,
    pub file_name: Option<&'a str>,
    pub content: &'a [u8],
}

impl<'a> Part<'a> {
    pub fn file(file_name: &'a str, content: &'a [u8]) -> Self {
        Self {
            name: "file",
            file_name: Some(file_name),
            content,
        }
    }

    pub fn text(name: &'a str, content: &'a str) -> Self {
        Self {
            name,
            file_name: None,
            content: content.as_bytes(),
        }
    }
}

/// Encode `parts` as a multipart/form-data body.
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part.file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    part.name, file_name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    part.name
                )
                .as_bytes(),
            ),
        }
        body.extend_from_slice(part.content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Build a `POST /convert` request, optionally carrying the shared secret.
pub fn convert_request(parts: &[Part<'_>], key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/convert")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(key) = key {
        builder = builder.header(API_KEY_HEADER, key);
    }
    builder.body(Body::from(multipart_body(parts))).unwrap()
}

/// Collect a response body as JSON.
pub async fn response_json(response: Response<Body>) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}
