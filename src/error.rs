//! Error types for the pdf2docx-api service.
//!
//! Two distinct error types reflect two distinct layers:
//!
//! * [`Pdf2DocxError`]: everything that can end a request (or, for
//!   [`Pdf2DocxError::InvalidConfig`], stop the service from starting). Each
//!   request-level variant maps to exactly one HTTP status, see
//!   [`Pdf2DocxError::is_client_error`].
//!
//! * [`ConverterError`]: what a [`crate::converter::DocumentConverter`]
//!   reports. The handler folds it into [`Pdf2DocxError::ConversionFailed`]
//!   so callers only ever see the message, never the backend's own type.

use std::path::PathBuf;
use thiserror::Error;

const MIB: usize = 1024 * 1024;

/// All errors surfaced by the conversion pipeline.
#[derive(Debug, Error)]
pub enum Pdf2DocxError {
    // ── Validation errors (HTTP 400) ──────────────────────────────────────
    /// No `file` field, or a file field with an empty filename.
    #[error("{reason}")]
    MissingFile { reason: &'static str },

    /// The claimed filename does not carry an allowed extension.
    #[error("Only {allowed} files are allowed")]
    UnsupportedType { filename: String, allowed: String },

    /// The upload is larger than the configured limit.
    #[error("File size exceeds {}MB limit", .limit_bytes / MIB)]
    TooLarge { limit_bytes: usize },

    /// The multipart stream broke while the file field was being read.
    #[error("Malformed upload: {detail}")]
    InvalidUpload { detail: String },

    // ── Processing errors (HTTP 500) ──────────────────────────────────────
    /// Could not create or write one of the temporary files.
    #[error("Failed to stage upload: {source}")]
    StagingFailed {
        #[source]
        source: std::io::Error,
    },

    /// The document converter reported a failure.
    #[error("Conversion failed: {reason}")]
    ConversionFailed { reason: String },

    // ── Logged only ───────────────────────────────────────────────────────
    /// A temporary file could not be removed. Never returned to a caller.
    #[error("Failed to remove temporary file '{path}': {source}")]
    CleanupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Pdf2DocxError {
    pub(crate) fn no_file_uploaded() -> Self {
        Self::MissingFile {
            reason: "No file uploaded",
        }
    }

    pub(crate) fn no_file_selected() -> Self {
        Self::MissingFile {
            reason: "No file selected",
        }
    }

    /// `true` when the request itself was at fault (HTTP 400), `false` for
    /// failures on our side (HTTP 500).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingFile { .. }
                | Self::UnsupportedType { .. }
                | Self::TooLarge { .. }
                | Self::InvalidUpload { .. }
        )
    }
}

/// Failure reported by a document converter backend.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// The external converter program could not be started.
    #[error("could not run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The external converter ran but exited unsuccessfully.
    #[error("'{program}' exited with {status}: {stderr}")]
    Exited {
        program: String,
        status: String,
        stderr: String,
    },

    /// The in-process backend failed.
    #[error("{0}")]
    Backend(String),
}

impl From<ConverterError> for Pdf2DocxError {
    fn from(e: ConverterError) -> Self {
        Pdf2DocxError::ConversionFailed {
            reason: e.to_string(),
        }
    }
}
