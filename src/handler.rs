//! The conversion handler: one upload in, one DOCX (or one error) out.
//!
//! [`ConversionHandler`] is deliberately free of any HTTP types. The axum
//! layer in [`crate::server`] only extracts an [`Upload`] and turns the
//! returned [`ConvertedDocument`] or [`Pdf2DocxError`] into a response, so
//! the whole lifecycle can be driven and tested without a web framework.

use crate::config::ServiceConfig;
use crate::converter::DocumentConverter;
use crate::error::Pdf2DocxError;
use crate::lifecycle::{LifecycleObserver, NoopObserver, RequestPhase, SharedObserver};
use crate::pipeline::stage::StagedFiles;
use crate::pipeline::validate::{self, Upload, ValidatedUpload};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, Instrument, Span};
use uuid::Uuid;

/// A successfully converted document, ready to be sent as a download.
#[derive(Debug, Clone)]
pub struct ConvertedDocument {
    /// Download name, e.g. `Report.docx`.
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ConvertedDocument {
    /// `Content-Disposition` value for this document.
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

/// Runs validate → stage → convert → cleanup for each request.
///
/// Cheap to share: wrap it in an `Arc` and hand it to as many tasks as you
/// like. It holds no per-request state.
pub struct ConversionHandler {
    config: ServiceConfig,
    converter: Arc<dyn DocumentConverter>,
    observer: SharedObserver,
}

impl ConversionHandler {
    pub fn new(config: ServiceConfig, converter: Arc<dyn DocumentConverter>) -> Self {
        Self {
            config,
            converter,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Build a handler using the converter selected by `config.backend`.
    pub fn from_config(config: ServiceConfig) -> Result<Self, Pdf2DocxError> {
        let converter = config.build_converter()?;
        Ok(Self::new(config, converter))
    }

    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Convert one upload. `None` means the request carried no file at all.
    pub async fn handle(&self, upload: Option<Upload>) -> Result<ConvertedDocument, Pdf2DocxError> {
        self.handle_request(Uuid::new_v4(), upload).await
    }

    /// Like [`handle`](Self::handle) with a caller-chosen request id, so the
    /// HTTP layer can log the same id it hands to the observer.
    pub async fn handle_request(
        &self,
        request_id: Uuid,
        upload: Option<Upload>,
    ) -> Result<ConvertedDocument, Pdf2DocxError> {
        let span = info_span!("convert", %request_id);
        async {
            let start = Instant::now();
            let result = self.run(request_id, upload).await;
            self.phase(request_id, RequestPhase::Responded);
            match &result {
                Ok(doc) => info!(
                    "Converted to '{}' ({} bytes) in {}ms",
                    doc.filename,
                    doc.bytes.len(),
                    start.elapsed().as_millis()
                ),
                Err(e) if e.is_client_error() => info!("Rejected upload: {e}"),
                Err(e) => error!("{e}"),
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Report an upload that failed validation before it could be handed to
    /// [`handle_request`](Self::handle_request), e.g. while the HTTP layer
    /// was still streaming it in.
    pub fn reject(&self, request_id: Uuid, err: Pdf2DocxError) -> Pdf2DocxError {
        self.phase(request_id, RequestPhase::Validating);
        info!(%request_id, "Rejected upload: {err}");
        self.phase(request_id, RequestPhase::Responded);
        err
    }

    async fn run(
        &self,
        request_id: Uuid,
        upload: Option<Upload>,
    ) -> Result<ConvertedDocument, Pdf2DocxError> {
        // ── Step 1: Validate ─────────────────────────────────────────────────
        self.phase(request_id, RequestPhase::Validating);
        let validated = validate::validate(upload, &self.config)?;

        // ── Step 2: Stage ────────────────────────────────────────────────────
        let staged = StagedFiles::stage(
            &self.config.temp_dir,
            &validated.upload.bytes,
            &self.config.output_extension,
        )?;
        self.phase(request_id, RequestPhase::Staged);

        // ── Step 3: Convert ──────────────────────────────────────────────────
        self.phase(request_id, RequestPhase::Converting);
        let bytes = self.convert_staged(request_id, staged).await?;

        Ok(self.document(&validated, bytes))
    }

    /// Run the converter on the blocking pool, read the result back in full
    /// and remove both temp files.
    ///
    /// The staged files move into the blocking task together with the
    /// converter, so they are deleted only once the converter has returned.
    /// Dropping the request future (e.g. on client disconnect) detaches the
    /// task but does not shorten the files' lifetime.
    async fn convert_staged(
        &self,
        request_id: Uuid,
        staged: StagedFiles,
    ) -> Result<Vec<u8>, Pdf2DocxError> {
        let converter = Arc::clone(&self.converter);
        let observer = Arc::clone(&self.observer);
        let span = Span::current();
        debug!("Invoking converter '{}'", converter.name());

        tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            let outcome = convert_and_read(converter.as_ref(), &staged);
            report(
                observer.as_ref(),
                request_id,
                if outcome.is_ok() {
                    RequestPhase::Succeeded
                } else {
                    RequestPhase::Failed
                },
            );

            // ── Step 4: Cleanup ──────────────────────────────────────────────
            staged.cleanup();
            report(observer.as_ref(), request_id, RequestPhase::CleanedUp);
            outcome
        })
        .await
        .map_err(|e| Pdf2DocxError::ConversionFailed {
            reason: format!("converter task failed: {e}"),
        })?
    }

    fn document(&self, validated: &ValidatedUpload, bytes: Vec<u8>) -> ConvertedDocument {
        ConvertedDocument {
            filename: validated.output_filename(&self.config.output_extension),
            content_type: self.config.content_type.clone(),
            bytes,
        }
    }

    fn phase(&self, request_id: Uuid, phase: RequestPhase) {
        report(self.observer.as_ref(), request_id, phase);
    }
}

fn report(observer: &dyn LifecycleObserver, request_id: Uuid, phase: RequestPhase) {
    debug!("phase → {phase}");
    observer.on_phase(request_id, phase);
}

/// Convert `staged.source` into `staged.target` and read the target back.
/// A converter panic is caught here so the caller can still clean up.
fn convert_and_read(
    converter: &dyn DocumentConverter,
    staged: &StagedFiles,
) -> Result<Vec<u8>, Pdf2DocxError> {
    let (source, target) = (staged.source.path(), staged.target.path());

    panic::catch_unwind(AssertUnwindSafe(|| converter.convert(source, target)))
        .map_err(|payload| Pdf2DocxError::ConversionFailed {
            reason: format!("converter panicked: {}", panic_message(payload.as_ref())),
        })??;

    let bytes = std::fs::read(target).map_err(|e| Pdf2DocxError::ConversionFailed {
        reason: format!("cannot read converted file: {e}"),
    })?;
    if bytes.is_empty() {
        return Err(Pdf2DocxError::ConversionFailed {
            reason: "converter produced an empty file".into(),
        });
    }
    Ok(bytes)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConverterError;
    use std::path::Path;
    use std::sync::Mutex;
    use std::time::Duration;

    struct EchoConverter;

    impl DocumentConverter for EchoConverter {
        fn name(&self) -> &str {
            "echo"
        }

        fn convert(&self, source: &Path, dest: &Path) -> Result<(), ConverterError> {
            let mut bytes = b"DOCX:".to_vec();
            bytes.extend(std::fs::read(source).map_err(|e| ConverterError::Backend(e.to_string()))?);
            std::fs::write(dest, bytes).map_err(|e| ConverterError::Backend(e.to_string()))
        }
    }

    struct FailingConverter;

    impl DocumentConverter for FailingConverter {
        fn name(&self) -> &str {
            "failing"
        }

        fn convert(&self, _source: &Path, dest: &Path) -> Result<(), ConverterError> {
            std::fs::write(dest, b"partial").ok();
            Err(ConverterError::Backend("unsupported font encoding".into()))
        }
    }

    struct SilentConverter;

    impl DocumentConverter for SilentConverter {
        fn name(&self) -> &str {
            "silent"
        }

        fn convert(&self, _source: &Path, _dest: &Path) -> Result<(), ConverterError> {
            Ok(())
        }
    }

    struct PanickingConverter;

    impl DocumentConverter for PanickingConverter {
        fn name(&self) -> &str {
            "panicking"
        }

        fn convert(&self, _source: &Path, _dest: &Path) -> Result<(), ConverterError> {
            panic!("converter blew up")
        }
    }

    /// Reads the source, pauses, then writes the destination.
    struct SlowConverter(Duration);

    impl DocumentConverter for SlowConverter {
        fn name(&self) -> &str {
            "slow"
        }

        fn convert(&self, source: &Path, dest: &Path) -> Result<(), ConverterError> {
            let input = std::fs::read(source).map_err(|e| ConverterError::Backend(e.to_string()))?;
            std::thread::sleep(self.0);
            std::fs::write(dest, input).map_err(|e| ConverterError::Backend(e.to_string()))
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<RequestPhase>>);

    impl LifecycleObserver for Recorder {
        fn on_phase(&self, _request_id: Uuid, phase: RequestPhase) {
            self.0.lock().unwrap().push(phase);
        }
    }

    fn handler_in(
        dir: &Path,
        converter: Arc<dyn DocumentConverter>,
    ) -> (ConversionHandler, Arc<Recorder>) {
        let config = ServiceConfig::builder().temp_dir(dir).build().unwrap();
        let recorder = Arc::new(Recorder::default());
        let handler = ConversionHandler::new(config, converter).with_observer(recorder.clone());
        (handler, recorder)
    }

    fn leftover(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn success_returns_docx_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let (handler, recorder) = handler_in(dir.path(), Arc::new(EchoConverter));

        let doc = handler
            .handle(Some(Upload::new("Report.PDF", b"%PDF-1.7".to_vec())))
            .await
            .unwrap();

        assert_eq!(doc.filename, "Report.docx");
        assert_eq!(doc.bytes, b"DOCX:%PDF-1.7");
        assert_eq!(doc.content_disposition(), "attachment; filename=\"Report.docx\"");
        assert_eq!(leftover(dir.path()), 0);
        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec![
                RequestPhase::Validating,
                RequestPhase::Staged,
                RequestPhase::Converting,
                RequestPhase::Succeeded,
                RequestPhase::CleanedUp,
                RequestPhase::Responded,
            ]
        );
    }

    #[tokio::test]
    async fn converter_failure_is_conversion_failed_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let (handler, recorder) = handler_in(dir.path(), Arc::new(FailingConverter));

        let err = handler
            .handle(Some(Upload::new("a.pdf", b"%PDF".to_vec())))
            .await
            .unwrap_err();

        assert!(matches!(err, Pdf2DocxError::ConversionFailed { .. }));
        assert!(err.to_string().contains("unsupported font encoding"));
        assert_eq!(leftover(dir.path()), 0);
        let phases = recorder.0.lock().unwrap();
        assert!(phases.contains(&RequestPhase::Failed));
        assert_eq!(phases[phases.len() - 2], RequestPhase::CleanedUp);
    }

    #[tokio::test]
    async fn empty_output_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let (handler, _) = handler_in(dir.path(), Arc::new(SilentConverter));

        let err = handler
            .handle(Some(Upload::new("a.pdf", b"%PDF".to_vec())))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("empty"), "got: {err}");
        assert_eq!(leftover(dir.path()), 0);
    }

    #[tokio::test]
    async fn converter_panic_is_contained() {
        let dir = tempfile::tempdir().unwrap();
        let (handler, _) = handler_in(dir.path(), Arc::new(PanickingConverter));

        let err = handler
            .handle(Some(Upload::new("a.pdf", b"%PDF".to_vec())))
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2DocxError::ConversionFailed { .. }));
        assert!(err.to_string().contains("converter blew up"), "got: {err}");
        assert_eq!(leftover(dir.path()), 0);
    }

    #[tokio::test]
    async fn dropped_request_still_cleans_up_after_converter() {
        let dir = tempfile::tempdir().unwrap();
        let (handler, recorder) =
            handler_in(dir.path(), Arc::new(SlowConverter(Duration::from_millis(300))));

        let cancelled = tokio::time::timeout(
            Duration::from_millis(50),
            handler.handle(Some(Upload::new("a.pdf", b"%PDF-1.7".to_vec()))),
        )
        .await;
        assert!(cancelled.is_err(), "request should still be converting");

        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(leftover(dir.path()), 0);
        let phases = recorder.0.lock().unwrap();
        assert_eq!(
            phases[phases.len() - 2..],
            [RequestPhase::Succeeded, RequestPhase::CleanedUp]
        );
        assert!(!phases.contains(&RequestPhase::Responded));
    }

    #[tokio::test]
    async fn validation_failure_never_stages() {
        let dir = tempfile::tempdir().unwrap();
        let (handler, recorder) = handler_in(dir.path(), Arc::new(EchoConverter));

        let err = handler
            .handle(Some(Upload::new("notes.txt", b"hello".to_vec())))
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2DocxError::UnsupportedType { .. }));
        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec![RequestPhase::Validating, RequestPhase::Responded]
        );
        assert_eq!(leftover(dir.path()), 0);
    }

    #[tokio::test]
    async fn oversized_upload_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig::builder()
            .temp_dir(dir.path())
            .max_upload_bytes(4)
            .build()
            .unwrap();
        let handler = ConversionHandler::new(config, Arc::new(EchoConverter));

        let err = handler
            .handle(Some(Upload::new("a.pdf", b"%PDF-1.7".to_vec())))
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2DocxError::TooLarge { limit_bytes: 4 }));
    }

    #[test]
    fn handle_can_be_driven_synchronously() {
        let dir = tempfile::tempdir().unwrap();
        let (handler, _) = handler_in(dir.path(), Arc::new(EchoConverter));
        let err = tokio_test::block_on(handler.handle(None)).unwrap_err();
        assert_eq!(err.to_string(), "No file uploaded");
    }
}
