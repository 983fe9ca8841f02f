//! End-to-end tests against a real TCP listener.
//!
//! The text converter tests run by default. The docling tests need the
//! docling CLI on `PATH` and are marked `#[ignore]`:
//!
//! ```bash
//! pip install docling
//! cargo test --test integration real_service -- --ignored
//! ```
//!
//! Set `DOCLING_BIN` to use a docling executable outside `PATH`.

use std::env;
use std::net::SocketAddr;
use std::path::Path;

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;

use docling_gateway::convert::ConversionService;
use docling_gateway::converter::{
    DoclingCliConverter, DocumentConverter, PlainTextConverter, DEFAULT_DOCLING_PROGRAM,
};
use docling_gateway::{create_router, RouterConfig, API_KEY_HEADER};

use super::test_utils::{dir_is_empty, TEST_KEY};

/// Start a server on an ephemeral port and return its address.
async fn spawn_server<C>(converter: C, temp_root: &Path, config: RouterConfig) -> SocketAddr
where
    C: DocumentConverter + 'static,
{
    let service = ConversionService::new(converter).with_temp_root(temp_root);
    let router = create_router(service, config.with_tracing(false));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn file_form(file_name: &str, content: &[u8]) -> Form {
    Form::new().part(
        "file",
        Part::bytes(content.to_vec()).file_name(file_name.to_string()),
    )
}

// =============================================================================
// Text Converter
// =============================================================================

#[tokio::test]
async fn test_live_health() {
    let temp = tempfile::tempdir().unwrap();
    let addr = spawn_server(
        PlainTextConverter::new(),
        temp.path(),
        RouterConfig::new(TEST_KEY),
    )
    .await;

    let response = reqwest::get(format!("http://{}/health", addr)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json, serde_json::json!({ "ok": true }));
}

#[tokio::test]
async fn test_live_convert_with_key() {
    let temp = tempfile::tempdir().unwrap();
    let addr = spawn_server(
        PlainTextConverter::new(),
        temp.path(),
        RouterConfig::new(TEST_KEY),
    )
    .await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{}/convert", addr))
        .header(API_KEY_HEADER, TEST_KEY)
        .multipart(file_form("note.txt", b"Hello world"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json["markdown"], "Hello world");
    assert_eq!(json["json"]["name"], "note");

    assert!(dir_is_empty(temp.path()));
}

#[tokio::test]
async fn test_live_convert_without_key_forbidden() {
    let temp = tempfile::tempdir().unwrap();
    let addr = spawn_server(
        PlainTextConverter::new(),
        temp.path(),
        RouterConfig::new(TEST_KEY),
    )
    .await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{}/convert", addr))
        .multipart(file_form("note.txt", b"Hello world"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json["error"], "forbidden");

    assert!(dir_is_empty(temp.path()));
}

#[tokio::test]
async fn test_live_cors_preflight() {
    let temp = tempfile::tempdir().unwrap();
    let addr = spawn_server(
        PlainTextConverter::new(),
        temp.path(),
        RouterConfig::new(TEST_KEY).with_cors_origins(vec!["https://app.example.com".to_string()]),
    )
    .await;
    let client = reqwest::Client::new();

    let response = client
        .request(reqwest::Method::OPTIONS, format!("http://{}/convert", addr))
        .header("origin", "https://app.example.com")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", API_KEY_HEADER)
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "https://app.example.com"
    );
}

// =============================================================================
// docling CLI
// =============================================================================

fn docling_converter(work_dir: &Path) -> DoclingCliConverter {
    let program = env::var("DOCLING_BIN").unwrap_or_else(|_| DEFAULT_DOCLING_PROGRAM.to_string());
    DoclingCliConverter::new(program).with_work_dir(work_dir)
}

#[tokio::test]
#[ignore]
async fn test_real_docling_probe() {
    let temp = tempfile::tempdir().unwrap();
    let version = docling_converter(temp.path())
        .probe()
        .await
        .expect("docling must be installed for this test");
    assert!(!version.is_empty());
}

#[tokio::test]
#[ignore]
async fn test_real_docling_markdown_conversion() {
    let temp = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let addr = spawn_server(
        docling_converter(work.path()),
        temp.path(),
        RouterConfig::without_auth(),
    )
    .await;
    let client = reqwest::Client::new();

    let document = b"# Gateway Test\n\nHello from the real docling converter.\n";
    let response = client
        .post(format!("http://{}/convert", addr))
        .multipart(file_form("gateway-test.md", document))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = response.json().await.unwrap();
    assert!(json["markdown"].as_str().unwrap().contains("Gateway Test"));
    assert_eq!(json["json"]["schema_name"], "DoclingDocument");

    assert!(dir_is_empty(temp.path()));
    assert!(dir_is_empty(work.path()));
}
