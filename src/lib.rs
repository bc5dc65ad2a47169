//! # pdf2docx-api
//!
//! A small HTTP service that turns an uploaded PDF into a Word (`.docx`)
//! document.
//!
//! The service itself does no document parsing. It validates the upload,
//! stages it to a temporary file, hands both paths to a
//! [`DocumentConverter`], and streams the result back as a download. Every
//! temporary file is removed before the response goes out, whatever the
//! outcome.
//!
//! ## Request Lifecycle
//!
//! ```text
//! POST /convert (multipart, field "file")
//!  │
//!  ├─ 1. Validate  file present → filename non-empty → .pdf → ≤ 10 MiB
//!  ├─ 2. Stage     upload → tmp .pdf, empty tmp .docx   (drop guards)
//!  ├─ 3. Convert   DocumentConverter on the blocking pool
//!  ├─ 4. Cleanup   both temp files removed, failures only logged
//!  └─ 5. Respond   200 {base}.docx  |  400/500 {"success":false,"error":…}
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2docx_api::{server, ConversionHandler, ServiceConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServiceConfig::default();
//!     let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
//!     let handler = Arc::new(ConversionHandler::from_config(config)?);
//!     server::serve(listener, handler, async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | Enables the `pdf2docx-server` binary (clap + anyhow + tracing-subscriber) |
//! | `pdfium` | on      | Enables [`converter::PdfiumConverter`] (pdfium-render + docx-rs) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod converter;
pub mod error;
pub mod handler;
pub mod lifecycle;
pub mod pipeline;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConverterBackend, ServiceConfig, ServiceConfigBuilder, DOCX_CONTENT_TYPE};
pub use converter::{CommandConverter, DocumentConverter};
#[cfg(feature = "pdfium")]
pub use converter::PdfiumConverter;
pub use error::{ConverterError, Pdf2DocxError};
pub use handler::{ConversionHandler, ConvertedDocument};
pub use lifecycle::{LifecycleObserver, NoopObserver, RequestPhase};
pub use pipeline::validate::Upload;
