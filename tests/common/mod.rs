//! Shared helpers for the HTTP integration tests.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request};
use pdf2docx_api::{
    ConversionHandler, ConverterError, DocumentConverter, LifecycleObserver, RequestPhase,
    ServiceConfig,
};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;

pub const BOUNDARY: &str = "pdf2docx-test-boundary";

/// Writes `DOCX(` + source bytes + `)` to the destination.
pub struct EchoConverter {
    pub delay: Duration,
}

impl EchoConverter {
    pub fn new() -> Self {
        Self {
            delay: Duration::ZERO,
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self { delay }
    }
}

impl DocumentConverter for EchoConverter {
    fn name(&self) -> &str {
        "echo"
    }

    fn convert(&self, source: &Path, dest: &Path) -> Result<(), ConverterError> {
        std::thread::sleep(self.delay);
        let input = std::fs::read(source).map_err(|e| ConverterError::Backend(e.to_string()))?;
        let mut out = b"DOCX(".to_vec();
        out.extend_from_slice(&input);
        out.push(b')');
        std::fs::write(dest, out).map_err(|e| ConverterError::Backend(e.to_string()))
    }
}

/// Always fails after scribbling into the destination.
pub struct BrokenConverter;

impl DocumentConverter for BrokenConverter {
    fn name(&self) -> &str {
        "broken"
    }

    fn convert(&self, _source: &Path, dest: &Path) -> Result<(), ConverterError> {
        std::fs::write(dest, b"PK half a zip").ok();
        Err(ConverterError::Backend("stream ended before xref table".into()))
    }
}

/// Records every phase event.
#[derive(Default)]
pub struct PhaseRecorder {
    pub events: Mutex<Vec<(Uuid, RequestPhase)>>,
}

impl PhaseRecorder {
    pub fn phases(&self) -> Vec<RequestPhase> {
        self.events.lock().unwrap().iter().map(|(_, p)| *p).collect()
    }
}

impl LifecycleObserver for PhaseRecorder {
    fn on_phase(&self, request_id: Uuid, phase: RequestPhase) {
        self.events.lock().unwrap().push((request_id, phase));
    }
}

/// A handler whose temp files go to a private directory.
pub struct TestService {
    pub temp: TempDir,
    pub handler: Arc<ConversionHandler>,
    pub recorder: Arc<PhaseRecorder>,
}

impl TestService {
    pub fn new(converter: Arc<dyn DocumentConverter>) -> Self {
        Self::with_limit(converter, pdf2docx_api::config::DEFAULT_MAX_UPLOAD_BYTES)
    }

    pub fn with_limit(converter: Arc<dyn DocumentConverter>, max_upload_bytes: usize) -> Self {
        let temp = tempfile::tempdir().expect("temp dir");
        let config = ServiceConfig::builder()
            .temp_dir(temp.path())
            .max_upload_bytes(max_upload_bytes)
            .build()
            .expect("valid config");
        let recorder = Arc::new(PhaseRecorder::default());
        let handler = Arc::new(
            ConversionHandler::new(config, converter).with_observer(recorder.clone()),
        );
        Self {
            temp,
            handler,
            recorder,
        }
    }

    pub fn router(&self) -> axum::Router {
        pdf2docx_api::server::router(self.handler.clone())
    }

    /// Number of entries left in the temp dir.
    pub fn leftover_files(&self) -> usize {
        std::fs::read_dir(self.temp.path()).unwrap().count()
    }
}

/// One multipart part.
pub struct Part<'a> {
    pub name: &'a str,
    pub filename: Option<&'a str>,
    pub content: &'a [u8],
}

pub fn file_part<'a>(filename: &'a str, content: &'a [u8]) -> Part<'a> {
    Part {
        name: "file",
        filename: Some(filename),
        content,
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part.filename {
            Some(f) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/pdf\r\n\r\n",
                    part.name, f
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name)
                    .as_bytes(),
            ),
        }
        body.extend_from_slice(part.content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn upload_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

pub async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn error_body(response: axum::response::Response) -> pdf2docx_api::server::ErrorBody {
    serde_json::from_slice(&body_bytes(response).await).expect("JSON error body")
}
