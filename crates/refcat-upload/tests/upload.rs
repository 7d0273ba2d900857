//! End-to-end tests for the upload server and the uploader.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, routing::post, Json, Router};
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use refcat_upload::{create_router, PushConfig, UploadConfig, UploadResponse, Uploader};
use serde_json::Value;
use tokio::net::TcpListener;

fn upload_server(dir: &std::path::Path) -> TestServer {
    TestServer::new(create_router(&UploadConfig::new(dir))).unwrap()
}

/// Serve `app` on an ephemeral local port and return the upload URL.
async fn spawn_app(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/upload", addr)
}

#[tokio::test]
async fn test_upload_stores_file() {
    let dir = tempfile::tempdir().unwrap();
    let server = upload_server(dir.path());

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"hello upload".to_vec())
            .file_name("hello.txt")
            .mime_type("text/plain"),
    );
    let response = server.post("/upload").multipart(form).await;
    response.assert_status_ok();

    let body: UploadResponse = response.json();
    assert_eq!(body.message, "File hello.txt uploaded successfully");
    let stored = std::fs::read(dir.path().join("hello.txt")).unwrap();
    assert_eq!(stored, b"hello upload");
}

#[tokio::test]
async fn test_upload_strips_directories_from_name() {
    let dir = tempfile::tempdir().unwrap();
    let server = upload_server(dir.path());

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"x".to_vec()).file_name("../../escape.txt"),
    );
    server.post("/upload").multipart(form).await.assert_status_ok();

    assert!(dir.path().join("escape.txt").exists());
    assert!(!dir.path().parent().unwrap().join("escape.txt").exists());
}

#[tokio::test]
async fn test_upload_without_file_part() {
    let dir = tempfile::tempdir().unwrap();
    let server = upload_server(dir.path());

    let form = MultipartForm::new().add_text("note", "no file here");
    let response = server.post("/upload").multipart(form).await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["result"], "error");
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_upload_with_unusable_name() {
    let dir = tempfile::tempdir().unwrap();
    let server = upload_server(dir.path());

    let form = MultipartForm::new().add_part("file", Part::bytes(b"x".to_vec()).file_name(".."));
    let response = server.post("/upload").multipart(form).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_upload_over_size_limit() {
    let dir = tempfile::tempdir().unwrap();
    let config = UploadConfig {
        max_upload_bytes: 1024,
        ..UploadConfig::new(dir.path())
    };
    let server = TestServer::new(create_router(&config)).unwrap();

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(vec![0u8; 4096]).file_name("big.bin"),
    );
    let response = server.post("/upload").multipart(form).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(!dir.path().join("big.bin").exists());
}

#[tokio::test]
async fn test_push_directory() {
    let target = tempfile::tempdir().unwrap();
    let source = tempfile::tempdir().unwrap();
    for i in 0..5 {
        std::fs::write(source.path().join(format!("img{}.bin", i)), vec![i as u8; 64]).unwrap();
    }

    let url = spawn_app(create_router(&UploadConfig::new(target.path()))).await;
    let uploader = Uploader::new(&PushConfig::new(url, source.path())).unwrap();
    let report = uploader.upload_dir(source.path()).await.unwrap();

    assert!(report.is_success());
    assert_eq!(report.succeeded.len(), 5);
    assert_eq!(
        report.succeeded[0].message,
        "File img0.bin uploaded successfully"
    );
    for i in 0..5 {
        let stored = std::fs::read(target.path().join(format!("img{}.bin", i))).unwrap();
        assert_eq!(stored, vec![i as u8; 64]);
    }
}

#[tokio::test]
async fn test_push_respects_concurrency_limit() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let app = {
        let in_flight = in_flight.clone();
        let peak = peak.clone();
        Router::new().route(
            "/upload",
            post(move || {
                let in_flight = in_flight.clone();
                let peak = peak.clone();
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Json(UploadResponse {
                        message: "ok".into(),
                    })
                }
            }),
        )
    };
    let url = spawn_app(app).await;

    let source = tempfile::tempdir().unwrap();
    for i in 0..8 {
        std::fs::write(source.path().join(format!("{}.txt", i)), b"data").unwrap();
    }

    let config = PushConfig::new(url, source.path()).with_concurrency(2);
    let report = Uploader::new(&config)
        .unwrap()
        .upload_dir(source.path())
        .await
        .unwrap();

    assert_eq!(report.succeeded.len(), 8);
    assert!(peak.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn test_push_records_failures_and_continues() {
    let app = Router::new().route(
        "/upload",
        post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "busy") }),
    );
    let url = spawn_app(app).await;

    let source = tempfile::tempdir().unwrap();
    std::fs::write(source.path().join("a.txt"), b"a").unwrap();
    std::fs::write(source.path().join("b.txt"), b"b").unwrap();

    let report = Uploader::new(&PushConfig::new(url, source.path()))
        .unwrap()
        .upload_dir(source.path())
        .await
        .unwrap();

    assert!(report.succeeded.is_empty());
    assert_eq!(report.failed.len(), 2);
    assert!(report.failed[0].reason.contains("503"));
    assert!(report.failed[1].file.ends_with("b.txt"));
}
