mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{MemoryStorage, multipart_file_body, test_state};
use cloud_file_manager::create_app;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "---------------------------123456789012345678901234567";

async fn list_files(app: &axum::Router) -> Vec<Value> {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/files")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice::<Vec<Value>>(&body).unwrap()
}

async fn upload(app: &axum::Router, filename: &str, content: &str) -> StatusCode {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header(
                    "Content-Type",
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(multipart_file_body(BOUNDARY, filename, content)))
                .unwrap(),
        )
        .await
        .unwrap();
    response.status()
}

#[tokio::test]
async fn test_upload_then_list() {
    let storage = Arc::new(MemoryStorage::new());
    let app = create_app(test_state(storage));

    let status = upload(&app, "test.txt", "Hello, this is a test file content!").await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let files = list_files(&app).await;
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["display_name"], "test.txt");
    assert_eq!(
        files[0]["size_bytes"].as_i64().unwrap(),
        "Hello, this is a test file content!".len() as i64
    );
    assert!(files[0]["reference"].as_str().unwrap().ends_with("test.txt"));
}

#[tokio::test]
async fn test_upload_duplicate_name_gets_counter_suffix() {
    let storage = Arc::new(MemoryStorage::new());
    let app = create_app(test_state(storage));

    assert_eq!(upload(&app, "report.pdf", "one").await, StatusCode::SEE_OTHER);
    assert_eq!(upload(&app, "report.pdf", "two").await, StatusCode::SEE_OTHER);
    assert_eq!(
        upload(&app, "report.pdf", "three").await,
        StatusCode::SEE_OTHER
    );

    let files = list_files(&app).await;
    let mut names: Vec<String> = files
        .iter()
        .map(|f| f["display_name"].as_str().unwrap().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["report.pdf", "report_1.pdf", "report_2.pdf"]);
}

#[tokio::test]
async fn test_upload_rejects_disallowed_extension() {
    let storage = Arc::new(MemoryStorage::new());
    let app = create_app(test_state(storage));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header(
                    "Content-Type",
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(multipart_file_body(
                    BOUNDARY,
                    "malware.exe",
                    "MZ...",
                )))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(json["error"].as_str().unwrap().contains("not allowed"));

    assert!(list_files(&app).await.is_empty());
}

#[tokio::test]
async fn test_upload_rejects_path_traversal_name() {
    let storage = Arc::new(MemoryStorage::new());
    let app = create_app(test_state(storage));

    let status = upload(&app, "../../etc/passwd", "root:x:0:0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(list_files(&app).await.is_empty());
}

#[tokio::test]
async fn test_upload_without_file_field_is_rejected() {
    let storage = Arc::new(MemoryStorage::new());
    let app = create_app(test_state(storage));

    let body = format!(
        "--{b}\r\n\
        Content-Disposition: form-data; name=\"comment\"\r\n\r\n\
        not a file\r\n\
        --{b}--\r\n",
        b = BOUNDARY
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header(
                    "Content-Type",
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
