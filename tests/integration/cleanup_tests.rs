//! Temp file lifecycle tests.
//!
//! Tests verify:
//! - Staged uploads are removed after success, failure and cancellation
//! - The staged file keeps the sanitized original name and extension
//! - Hostile file names cannot escape the temp root

use std::time::Duration;

use axum::http::StatusCode;
use tower::ServiceExt;

use docling_gateway::error::ConvertError;
use docling_gateway::RouterConfig;

use super::test_utils::{
    convert_request, dir_is_empty, response_json, test_router, MockConverter, Part,
};

#[tokio::test]
async fn test_staged_file_removed_after_success() {
    let temp = tempfile::tempdir().unwrap();
    let converter = MockConverter::new();
    let router = test_router(converter.clone(), temp.path(), RouterConfig::without_auth());

    let request = convert_request(&[Part::file("report.pdf", b"%PDF-1.7")], None);
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let seen = converter.seen_paths();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].starts_with(temp.path()));
    assert!(!seen[0].exists());
    assert!(dir_is_empty(temp.path()));
}

#[tokio::test]
async fn test_staged_file_removed_after_failure() {
    let temp = tempfile::tempdir().unwrap();
    let converter = MockConverter::failing(ConvertError::Failed {
        status: "exit status: 1".to_string(),
        stderr: "boom".to_string(),
    });
    let router = test_router(converter.clone(), temp.path(), RouterConfig::without_auth());

    let request = convert_request(&[Part::file("report.pdf", b"%PDF-1.7")], None);
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let seen = converter.seen_paths();
    assert_eq!(seen.len(), 1);
    assert!(!seen[0].exists());
    assert!(dir_is_empty(temp.path()));
}

#[tokio::test]
async fn test_staged_file_keeps_original_name() {
    let temp = tempfile::tempdir().unwrap();
    let converter = MockConverter::new();
    let router = test_router(converter.clone(), temp.path(), RouterConfig::without_auth());

    let request = convert_request(&[Part::file("Quarterly Report.DOCX", b"PK")], None);
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let seen = converter.seen_paths();
    assert_eq!(
        seen[0].file_name().unwrap().to_str().unwrap(),
        "Quarterly_Report.DOCX"
    );
}

#[tokio::test]
async fn test_path_traversal_name_stays_in_temp_root() {
    let temp = tempfile::tempdir().unwrap();
    let converter = MockConverter::new();
    let router = test_router(converter.clone(), temp.path(), RouterConfig::without_auth());

    let request = convert_request(&[Part::file("../../etc/passwd.txt", b"root:x:0:0")], None);
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = response_json(response).await;
    assert_eq!(json["json"]["name"], "passwd.txt");

    let seen = converter.seen_paths();
    assert!(seen[0].starts_with(temp.path()));
    assert_eq!(seen[0].parent().unwrap().parent().unwrap(), temp.path());
    assert!(dir_is_empty(temp.path()));
}

#[tokio::test]
async fn test_same_name_uploads_get_separate_directories() {
    let temp = tempfile::tempdir().unwrap();
    let converter = MockConverter::new();
    let router = test_router(converter.clone(), temp.path(), RouterConfig::without_auth());

    for _ in 0..3 {
        let request = convert_request(&[Part::file("same.txt", b"content")], None);
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let mut dirs: Vec<_> = converter
        .seen_paths()
        .iter()
        .map(|p| p.parent().unwrap().to_path_buf())
        .collect();
    dirs.sort();
    dirs.dedup();
    assert_eq!(dirs.len(), 3);
    assert!(dir_is_empty(temp.path()));
}

#[tokio::test]
async fn test_staged_file_removed_when_request_dropped() {
    let temp = tempfile::tempdir().unwrap();
    let converter = MockConverter::new().with_delay(Duration::from_secs(30));
    let router = test_router(converter.clone(), temp.path(), RouterConfig::without_auth());

    // The client goes away while the converter is still running
    let request = convert_request(&[Part::file("report.pdf", b"%PDF-1.7")], None);
    let result = tokio::time::timeout(Duration::from_millis(200), router.oneshot(request)).await;
    assert!(result.is_err());

    let seen = converter.seen_paths();
    assert_eq!(seen.len(), 1);
    assert!(!seen[0].exists());
    assert!(dir_is_empty(temp.path()));
}
