//! HTTP API tests against a stubbed OCR engine

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use eam_ocr_server::config::Config;
use eam_ocr_server::ocr::{EngineFactory, OcrEngine, OcrError, ReadingOrder};
use eam_ocr_server::state::AppState;

const BOUNDARY: &str = "eam-ocr-test-boundary";

/// Returns canned pages and records the staged file it was given
struct StubEngine {
    pages: Result<Value, fn() -> OcrError>,
    seen: Mutex<Vec<(PathBuf, bool)>>,
}

#[async_trait]
impl OcrEngine for StubEngine {
    fn name(&self) -> &str {
        "stub"
    }

    async fn recognize(&self, path: &Path) -> Result<Value, OcrError> {
        self.seen
            .lock()
            .unwrap()
            .push((path.to_path_buf(), path.exists()));
        self.pages.clone().map_err(|error| error())
    }
}

struct StubFactory {
    engine: Arc<StubEngine>,
    fail_init: bool,
    attempts: AtomicUsize,
}

#[async_trait]
impl EngineFactory for StubFactory {
    async fn initialize(&self) -> Result<Arc<dyn OcrEngine>, OcrError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_init {
            return Err(OcrError::EngineInit("model files missing".to_string()));
        }
        Ok(self.engine.clone())
    }
}

struct Harness {
    app: Router,
    engine: Arc<StubEngine>,
    factory: Arc<StubFactory>,
    temp_dir: TempDir,
}

fn harness_with(pages: Result<Value, fn() -> OcrError>, fail_init: bool, order: ReadingOrder) -> Harness {
    let temp_dir = TempDir::new().unwrap();

    let mut config = Config::default();
    config.ocr.temp_dir = Some(temp_dir.path().to_path_buf());
    config.ocr.reading_order = order;

    let engine = Arc::new(StubEngine {
        pages,
        seen: Mutex::new(Vec::new()),
    });
    let factory = Arc::new(StubFactory {
        engine: engine.clone(),
        fail_init,
        attempts: AtomicUsize::new(0),
    });

    let state = AppState::with_factory(config, factory.clone());

    Harness {
        app: eam_ocr_server::app(state),
        engine,
        factory,
        temp_dir,
    }
}

fn decode_failure() -> OcrError {
    OcrError::Processing("cannot decode image".to_string())
}

fn worker_exit() -> OcrError {
    OcrError::WorkerExited("exit status: 137".to_string())
}

fn harness(pages: Value) -> Harness {
    harness_with(Ok(pages), false, ReadingOrder::Global)
}

fn hello_world_pages() -> Value {
    json!([[
        [[[0, 50], [100, 50], [100, 70], [0, 70]], ["World", 0.95]],
        [[[0, 0], [100, 0], [100, 20], [0, 20]], ["Hello", 0.90]],
        [[[0, 100], [100, 100], [100, 120], [0, 120]], ["", 0.99]],
    ]])
}

fn multipart_request(field: &str, file_name: &str, content_type: Option<&str>, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, file_name
        )
        .as_bytes(),
    );
    if let Some(content_type) = content_type {
        body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
    }
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/ocr")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn staged_files(dir: &TempDir) -> usize {
    std::fs::read_dir(dir.path()).unwrap().count()
}

#[tokio::test]
async fn test_health() {
    let h = harness(json!([]));
    let server = TestServer::new(h.app).unwrap();

    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({ "status": "ok", "service": "paddleocr" })
    );
}

#[tokio::test]
async fn test_root() {
    let h = harness(json!([]));
    let server = TestServer::new(h.app).unwrap();

    let response = server.get("/").await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({ "message": "EAM OCR Service is running", "status": "ok" })
    );
}

#[tokio::test]
async fn test_ocr_success() {
    let h = harness(hello_world_pages());

    let (status, body) = send(
        &h.app,
        multipart_request("file", "scan.png", Some("image/png"), b"\x89PNG fake image"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "text": "Hello\nWorld", "confidence": 92.5 }));

    let seen = h.engine.seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 1);
    let (path, existed) = &seen[0];
    assert!(existed, "engine should see the staged upload");
    assert_eq!(path.extension().unwrap(), "png");
    assert!(path.starts_with(h.temp_dir.path()));
    assert_eq!(staged_files(&h.temp_dir), 0);
}

#[tokio::test]
async fn test_ocr_accepts_legacy_image_field_and_pdf() {
    let h = harness(hello_world_pages());

    let (status, body) = send(
        &h.app,
        multipart_request("image", "doc.pdf", Some("application/pdf"), b"%PDF-1.7"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "Hello\nWorld");
}

#[tokio::test]
async fn test_ocr_empty_result() {
    let h = harness(json!([]));

    let (status, body) = send(
        &h.app,
        multipart_request("file", "blank.jpg", Some("image/jpeg"), b"jpeg bytes"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "text": "", "confidence": 0.0 }));
}

#[tokio::test]
async fn test_ocr_per_page_order() {
    let pages = json!([
        [[[[0, 80]], ["page one", 0.8]]],
        [[[[0, 10]], ["page two", 0.6]]],
    ]);
    let h = harness_with(Ok(pages), false, ReadingOrder::PerPage);

    let (status, body) = send(
        &h.app,
        multipart_request("file", "doc.pdf", Some("application/pdf"), b"%PDF-1.7"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "text": "page one\npage two", "confidence": 70.0 }));
}

#[tokio::test]
async fn test_ocr_rejects_unsupported_type() {
    let h = harness(hello_world_pages());

    let (status, body) = send(
        &h.app,
        multipart_request("file", "notes.txt", Some("text/plain"), b"hello"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["detail"],
        "Unsupported file type: text/plain. Please upload an image or PDF."
    );
    assert_eq!(h.factory.attempts.load(Ordering::SeqCst), 0);
    assert_eq!(staged_files(&h.temp_dir), 0);
}

#[tokio::test]
async fn test_ocr_rejects_missing_content_type() {
    let h = harness(hello_world_pages());

    let (status, _) = send(&h.app, multipart_request("file", "scan.png", None, b"data")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ocr_rejects_empty_file() {
    let h = harness(hello_world_pages());

    let (status, body) = send(
        &h.app,
        multipart_request("file", "scan.png", Some("image/png"), b""),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Empty file uploaded");
    assert_eq!(h.factory.attempts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_ocr_rejects_missing_file_field() {
    let h = harness(hello_world_pages());

    let (status, body) = send(
        &h.app,
        multipart_request("attachment", "scan.png", Some("image/png"), b"data"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_engine_failure_cleans_up() {
    let h = harness_with(Err(decode_failure), false, ReadingOrder::Global);

    let (status, body) = send(
        &h.app,
        multipart_request("file", "scan.png", Some("image/png"), b"garbage"),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "OCR processing failed: cannot decode image");
    assert_eq!(h.engine.seen.lock().unwrap().len(), 1);
    assert_eq!(staged_files(&h.temp_dir), 0);
}

#[tokio::test]
async fn test_dead_worker_is_replaced_on_next_request() {
    let h = harness_with(Err(worker_exit), false, ReadingOrder::Global);

    for attempt in 1..=2 {
        let (status, body) = send(
            &h.app,
            multipart_request("file", "scan.png", Some("image/png"), b"data"),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body["detail"],
            "OCR processing failed: OCR worker exited: exit status: 137"
        );
        assert_eq!(h.factory.attempts.load(Ordering::SeqCst), attempt);
    }

    assert_eq!(h.engine.seen.lock().unwrap().len(), 2);
    assert_eq!(staged_files(&h.temp_dir), 0);
}

#[tokio::test]
async fn test_engine_failure_keeps_engine() {
    let h = harness_with(Err(decode_failure), false, ReadingOrder::Global);

    for _ in 0..2 {
        let (status, _) = send(
            &h.app,
            multipart_request("file", "scan.png", Some("image/png"), b"data"),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    assert_eq!(h.factory.attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_engine_init_failure_is_retried() {
    let h = harness_with(Ok(json!([])), true, ReadingOrder::Global);

    for attempt in 1..=2 {
        let (status, body) = send(
            &h.app,
            multipart_request("file", "scan.png", Some("image/png"), b"data"),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body["detail"],
            "Failed to initialize OCR engine: model files missing"
        );
        assert_eq!(h.factory.attempts.load(Ordering::SeqCst), attempt);
    }

    assert_eq!(staged_files(&h.temp_dir), 0);
}

#[tokio::test]
async fn test_engine_initialized_once_across_requests() {
    let h = harness(hello_world_pages());

    for _ in 0..3 {
        let (status, _) = send(
            &h.app,
            multipart_request("file", "scan.png", Some("image/png"), b"data"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(h.factory.attempts.load(Ordering::SeqCst), 1);
    assert_eq!(h.engine.seen.lock().unwrap().len(), 3);
}
