//! Configuration for the conversion service.
//!
//! Everything the request handler needs is injected through one
//! [`ServiceConfig`] value at startup, built via its [`ServiceConfigBuilder`].
//! There is no module-level state: two handlers with different configs can
//! live side by side in the same process (the integration tests rely on it).

use crate::converter::{CommandConverter, DocumentConverter};
use crate::error::Pdf2DocxError;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Default upload limit: 10 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// MIME type of a Word OOXML document.
pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Configuration for a [`crate::handler::ConversionHandler`] and its server.
///
/// # Example
/// ```rust
/// use pdf2docx_api::ServiceConfig;
///
/// let config = ServiceConfig::builder()
///     .max_upload_mb(5)
///     .temp_dir(std::env::temp_dir())
///     .build()
///     .unwrap();
/// assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
/// ```
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address the HTTP server binds to. Default: `127.0.0.1:5000`.
    pub bind_addr: SocketAddr,

    /// Largest accepted upload in bytes. Default: 10 MiB.
    ///
    /// This is the only size limit. The router derives its request-body limit
    /// from it, so a request is never cut off by the transport below this
    /// size and never buffered far beyond it.
    pub max_upload_bytes: usize,

    /// Lowercase extensions accepted for uploads (without the dot). Default: `["pdf"]`.
    pub allowed_extensions: Vec<String>,

    /// Extension given to the download name. Default: `"docx"`.
    pub output_extension: String,

    /// `Content-Type` of a successful response. Default: the DOCX MIME type.
    pub content_type: String,

    /// Directory that receives the per-request staging files. Default: the OS temp dir.
    pub temp_dir: PathBuf,

    /// Which converter backend turns the staged PDF into a DOCX.
    pub backend: ConverterBackend,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_extensions: vec!["pdf".to_string()],
            output_extension: "docx".to_string(),
            content_type: DOCX_CONTENT_TYPE.to_string(),
            temp_dir: std::env::temp_dir(),
            backend: ConverterBackend::default(),
        }
    }
}

impl ServiceConfig {
    /// Create a new builder for `ServiceConfig`.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder {
            config: Self::default(),
        }
    }

    /// Human-readable list of allowed types, e.g. `"PDF"`, used in error messages.
    pub fn allowed_types_label(&self) -> String {
        self.allowed_extensions
            .iter()
            .map(|e| e.to_uppercase())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Instantiate the converter selected by [`ServiceConfig::backend`].
    pub fn build_converter(&self) -> Result<Arc<dyn DocumentConverter>, Pdf2DocxError> {
        match &self.backend {
            ConverterBackend::Command { program, args } => Ok(Arc::new(
                CommandConverter::new(program.clone()).with_args(args.clone()),
            )),
            #[cfg(feature = "pdfium")]
            ConverterBackend::Pdfium { library_dir } => Ok(Arc::new(
                crate::converter::PdfiumConverter::new(library_dir.clone()),
            )),
            #[cfg(not(feature = "pdfium"))]
            ConverterBackend::Pdfium { .. } => Err(Pdf2DocxError::InvalidConfig(
                "the pdfium backend requires the `pdfium` cargo feature".into(),
            )),
        }
    }
}

/// Builder for [`ServiceConfig`].
#[derive(Debug)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    pub fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.config.bind_addr = addr;
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub fn max_upload_mb(mut self, mb: usize) -> Self {
        self.config.max_upload_bytes = mb.saturating_mul(1024 * 1024);
        self
    }

    /// Replace the allowed extension set. Leading dots are stripped and
    /// entries are lowercased.
    pub fn allowed_extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.allowed_extensions = exts
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    pub fn output_extension(mut self, ext: impl Into<String>) -> Self {
        self.config.output_extension = ext.into().trim_start_matches('.').to_string();
        self
    }

    pub fn content_type(mut self, ct: impl Into<String>) -> Self {
        self.config.content_type = ct.into();
        self
    }

    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = dir.into();
        self
    }

    pub fn backend(mut self, backend: ConverterBackend) -> Self {
        self.config.backend = backend;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServiceConfig, Pdf2DocxError> {
        let c = &self.config;
        if c.max_upload_bytes == 0 {
            return Err(Pdf2DocxError::InvalidConfig(
                "max upload size must be > 0".into(),
            ));
        }
        if c.allowed_extensions.is_empty() {
            return Err(Pdf2DocxError::InvalidConfig(
                "at least one allowed extension is required".into(),
            ));
        }
        if c.output_extension.is_empty() {
            return Err(Pdf2DocxError::InvalidConfig(
                "output extension must not be empty".into(),
            ));
        }
        if let ConverterBackend::Command { program, .. } = &c.backend {
            if program.trim().is_empty() {
                return Err(Pdf2DocxError::InvalidConfig(
                    "converter program must not be empty".into(),
                ));
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which [`DocumentConverter`] implementation the service uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConverterBackend {
    /// Run an external program. `{input}` and `{output}` in `args` are
    /// replaced with the staged PDF and target DOCX paths.
    Command { program: String, args: Vec<String> },
    /// Extract the text layer with pdfium and write it with docx-rs.
    /// `library_dir` is the directory holding the pdfium shared library;
    /// `None` falls back to `PDFIUM_LIB_PATH`, then the system library.
    Pdfium { library_dir: Option<PathBuf> },
}

impl Default for ConverterBackend {
    /// `pdf2docx convert {input} {output}`.
    fn default() -> Self {
        ConverterBackend::Command {
            program: "pdf2docx".to_string(),
            args: vec![
                "convert".to_string(),
                "{input}".to_string(),
                "{output}".to_string(),
            ],
        }
    }
}
