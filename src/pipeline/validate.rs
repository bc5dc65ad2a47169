//! Upload validation and filename handling.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. a file was uploaded at all
//! 2. its claimed filename is non-empty
//! 3. the extension after the last `.` is allowed (case-insensitive)
//! 4. the byte length is within the limit
//!
//! The HTTP layer calls [`check_filename`] and [`check_size`] while it is
//! still reading the multipart field, so an oversized upload is rejected
//! without being buffered. [`validate`] runs all four again on a complete
//! [`Upload`] for callers that do not come through HTTP.

use crate::config::ServiceConfig;
use crate::error::Pdf2DocxError;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Fallback base name when sanitising leaves nothing behind.
pub const FALLBACK_BASE_NAME: &str = "document";

static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.\-]").unwrap());

/// Client-submitted file: claimed name plus content.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// An upload that passed every check, with its derived names.
#[derive(Debug)]
pub struct ValidatedUpload {
    pub upload: Upload,
    /// Filename after [`sanitize_filename`].
    pub safe_name: String,
    /// `safe_name` without its last extension; never empty.
    pub base_name: String,
}

impl ValidatedUpload {
    /// Download name for the converted file, e.g. `Report.docx`.
    pub fn output_filename(&self, extension: &str) -> String {
        format!("{}.{}", self.base_name, extension)
    }
}

/// Run all four checks, in order, on a complete upload.
pub fn validate(
    upload: Option<Upload>,
    config: &ServiceConfig,
) -> Result<ValidatedUpload, Pdf2DocxError> {
    let upload = upload.ok_or_else(Pdf2DocxError::no_file_uploaded)?;
    check_filename(&upload.filename, config)?;
    check_size(upload.size(), config.max_upload_bytes)?;

    let safe_name = sanitize_filename(&upload.filename);
    let base_name = base_name(&safe_name);
    Ok(ValidatedUpload {
        upload,
        safe_name,
        base_name,
    })
}

/// Checks 2 and 3: non-empty filename with an allowed extension.
pub fn check_filename(filename: &str, config: &ServiceConfig) -> Result<(), Pdf2DocxError> {
    if filename.is_empty() {
        return Err(Pdf2DocxError::no_file_selected());
    }
    let allowed = extension_of(filename)
        .map(|ext| config.allowed_extensions.iter().any(|a| *a == ext))
        .unwrap_or(false);
    if !allowed {
        return Err(Pdf2DocxError::UnsupportedType {
            filename: filename.to_string(),
            allowed: config.allowed_types_label(),
        });
    }
    Ok(())
}

/// Check 4: the upload is no larger than `limit` bytes.
pub fn check_size(size: usize, limit: usize) -> Result<(), Pdf2DocxError> {
    if size > limit {
        return Err(Pdf2DocxError::TooLarge { limit_bytes: limit });
    }
    Ok(())
}

/// Lowercased text after the last `.`, or `None` if there is no dot.
pub fn extension_of(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
}

/// Reduce a client-supplied filename to something safe to echo back in a
/// `Content-Disposition` header.
///
/// The name is NFKD-decomposed and whatever is still non-ASCII is dropped,
/// so accented letters keep their base letter (`résumé` → `resume`). Path
/// separators and whitespace runs
/// become `_`, anything outside `[A-Za-z0-9_.-]` is removed, and leading or
/// trailing `.`/`_` are stripped. The result may be empty.
pub fn sanitize_filename(filename: &str) -> String {
    let ascii: String = filename
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = UNSAFE_CHARS.replace_all(&joined, "");
    cleaned.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Strip the last extension from a sanitised name. A name that is only an
/// extension (`.pdf`) or empty yields [`FALLBACK_BASE_NAME`].
pub fn base_name(safe_name: &str) -> String {
    let stem = match safe_name.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => safe_name,
    };
    if stem.is_empty() {
        FALLBACK_BASE_NAME.to_string()
    } else {
        stem.to_string()
    }
}
