//! Per-request temporary files.
//!
//! The converter needs real paths, so every request gets two files in the
//! configured temp dir: the uploaded bytes (`.pdf`) and an empty target
//! (`.docx`). Names come from `tempfile`'s random allocator with exclusive
//! create, so concurrent requests cannot collide.
//!
//! Each file is owned by a [`ScratchFile`] guard that deletes it on drop.
//! Cleanup therefore runs on every exit path (early `?` returns, converter
//! failures, panics) without the handler having to remember it. Deletion
//! failures are logged and swallowed; they never change a response.

use crate::error::Pdf2DocxError;
use std::io::Write;
use std::path::Path;
use tempfile::{Builder, TempPath};
use tracing::{debug, warn};

const FILE_PREFIX: &str = "pdf2docx-";

/// A temporary file deleted when the guard goes out of scope.
#[derive(Debug)]
pub struct ScratchFile {
    path: Option<TempPath>,
}

impl ScratchFile {
    /// Create an empty file with a random name and the given suffix.
    pub fn create_in(dir: &Path, suffix: &str) -> Result<Self, Pdf2DocxError> {
        let file = Builder::new()
            .prefix(FILE_PREFIX)
            .suffix(suffix)
            .tempfile_in(dir)
            .map_err(|source| Pdf2DocxError::StagingFailed { source })?;
        Ok(Self {
            path: Some(file.into_temp_path()),
        })
    }

    /// Create a file holding `bytes`.
    pub fn with_contents(dir: &Path, suffix: &str, bytes: &[u8]) -> Result<Self, Pdf2DocxError> {
        let mut file = Builder::new()
            .prefix(FILE_PREFIX)
            .suffix(suffix)
            .tempfile_in(dir)
            .map_err(|source| Pdf2DocxError::StagingFailed { source })?;
        file.write_all(bytes)
            .and_then(|_| file.flush())
            .map_err(|source| Pdf2DocxError::StagingFailed { source })?;
        Ok(Self {
            path: Some(file.into_temp_path()),
        })
    }

    pub fn path(&self) -> &Path {
        self.path
            .as_deref()
            .unwrap_or_else(|| Path::new(""))
    }

    /// Delete now instead of at drop.
    pub fn close(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        let Some(temp) = self.path.take() else {
            return;
        };
        let path = temp.to_path_buf();
        match temp.close() {
            Ok(()) => debug!("Removed {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                let err = Pdf2DocxError::CleanupFailed { path, source };
                warn!("{err}");
            }
        }
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        self.remove();
    }
}

/// The source/target pair for one request.
#[derive(Debug)]
pub struct StagedFiles {
    pub source: ScratchFile,
    pub target: ScratchFile,
}

impl StagedFiles {
    /// Write `bytes` to a fresh `.pdf` and allocate an empty `.{target_ext}`.
    ///
    /// If the second file cannot be created the first is already owned by a
    /// guard and is removed before the error propagates.
    pub fn stage(dir: &Path, bytes: &[u8], target_ext: &str) -> Result<Self, Pdf2DocxError> {
        let source = ScratchFile::with_contents(dir, ".pdf", bytes)?;
        let target = ScratchFile::create_in(dir, &format!(".{target_ext}"))?;
        debug!(
            "Staged {} bytes: {} → {}",
            bytes.len(),
            source.path().display(),
            target.path().display()
        );
        Ok(Self { source, target })
    }

    /// Remove both files now.
    pub fn cleanup(self) {
        self.source.close();
        self.target.close();
    }
}
