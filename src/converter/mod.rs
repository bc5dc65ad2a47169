//! The document-converter seam.
//!
//! The service never looks inside a PDF itself. It hands a staged file to a
//! [`DocumentConverter`] and gets back either a populated `.docx` at the
//! destination path or a [`ConverterError`].
//!
//! ```text
//!            ┌────────────────────┐
//! source.pdf │ DocumentConverter  │ dest.docx
//!  ─────────▶│  • CommandConverter│──────────▶
//!            │  • PdfiumConverter │
//!            └────────────────────┘
//! ```
//!
//! Implementations are called from tokio's blocking pool, so they are free to
//! block, spawn processes, or hold thread-local library state.

mod command;
#[cfg(feature = "pdfium")]
mod pdfium;

pub use command::CommandConverter;
#[cfg(feature = "pdfium")]
pub use pdfium::PdfiumConverter;

use crate::error::ConverterError;
use std::path::Path;

/// Turns the PDF at `source` into a DOCX written to `dest`.
///
/// `dest` already exists as an empty file owned by the caller; the converter
/// overwrites it. The whole document is converted, there is no page range.
pub trait DocumentConverter: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    fn convert(&self, source: &Path, dest: &Path) -> Result<(), ConverterError>;
}
