//! In-process converter: pdfium text layer → DOCX.
//!
//! pdfium reads the PDF and yields each page's text layer; docx-rs writes one
//! paragraph per non-blank line with a page break between PDF pages. Layout,
//! images and tables are not reconstructed. Deployments that need a faithful
//! layout use [`super::CommandConverter`] with a dedicated tool instead.
//!
//! pdfium keeps thread-local state and is not async-safe, which is fine here:
//! the handler always calls converters from `spawn_blocking`.

use super::DocumentConverter;
use crate::error::ConverterError;
use docx_rs::{BreakType, Docx, Paragraph, Run};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Converts the PDF text layer to a DOCX using pdfium and docx-rs.
#[derive(Debug, Clone, Default)]
pub struct PdfiumConverter {
    library_dir: Option<PathBuf>,
}

impl PdfiumConverter {
    /// `library_dir` is the directory containing `libpdfium.so` /
    /// `libpdfium.dylib` / `pdfium.dll`. `None` tries `PDFIUM_LIB_PATH`, then
    /// the system library search path.
    pub fn new(library_dir: Option<PathBuf>) -> Self {
        Self { library_dir }
    }

    fn bind(&self) -> Result<Pdfium, ConverterError> {
        let dir = self
            .library_dir
            .clone()
            .or_else(|| std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from));

        let bindings = match dir {
            Some(dir) => {
                let lib = Pdfium::pdfium_platform_library_name_at_path(&dir);
                debug!("Binding pdfium from {}", lib.display());
                Pdfium::bind_to_library(&lib)
            }
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| ConverterError::Backend(format!("failed to bind pdfium: {e:?}")))?;

        Ok(Pdfium::new(bindings))
    }
}

impl DocumentConverter for PdfiumConverter {
    fn name(&self) -> &str {
        "pdfium"
    }

    fn convert(&self, source: &Path, dest: &Path) -> Result<(), ConverterError> {
        let pdfium = self.bind()?;

        let document = pdfium.load_pdf_from_file(source, None).map_err(|e| {
            let detail = format!("{e:?}");
            if detail.contains("Password") || detail.contains("password") {
                ConverterError::Backend("PDF is encrypted and requires a password".into())
            } else {
                ConverterError::Backend(format!("PDF is corrupt: {detail}"))
            }
        })?;

        let mut docx = Docx::new();
        let mut page_count = 0usize;

        for (idx, page) in document.pages().iter().enumerate() {
            let text = page
                .text()
                .map_err(|e| {
                    ConverterError::Backend(format!(
                        "text extraction failed for page {}: {e:?}",
                        idx + 1
                    ))
                })?
                .all();

            if idx > 0 {
                docx = docx.add_paragraph(
                    Paragraph::new().add_run(Run::new().add_break(BreakType::Page)),
                );
            }
            for line in page_paragraphs(&text) {
                docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(line)));
            }
            page_count += 1;
        }

        let file = std::fs::File::create(dest)
            .map_err(|e| ConverterError::Backend(format!("cannot open output: {e}")))?;
        docx.build()
            .pack(file)
            .map_err(|e| ConverterError::Backend(format!("failed to write docx: {e}")))?;

        info!("pdfium converted {} pages", page_count);
        Ok(())
    }
}

/// Split one page's text layer into paragraph strings: trailing whitespace
/// trimmed, blank lines dropped.
fn page_paragraphs(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .collect()
}
