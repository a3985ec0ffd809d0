use merge_traits::{ExtractError, PageText, TextSource};
use pdf_extract::{Document, PlainTextOutput};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;

#[cfg(feature = "logging")]
use log::warn;

/// Pulls the text layer out of digital PDFs through pdf-extract.
///
/// Only the first page is rendered to text; the page count comes from the
/// page tree.
#[derive(Debug, Default, Clone, Copy)]
pub struct Extractor;

impl Extractor {
    pub fn new() -> Self {
        Self
    }

    pub fn first_page_of(&self, bytes: &[u8], path: &Path) -> Result<PageText, ExtractError> {
        let not_a_pdf = |reason: String| ExtractError::NotAPdf {
            path: path.to_path_buf(),
            reason,
        };

        let mut doc = Document::load_mem(bytes).map_err(|e| not_a_pdf(e.to_string()))?;
        if doc.is_encrypted() {
            doc.decrypt("").map_err(|e| not_a_pdf(e.to_string()))?;
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(ExtractError::NoPages {
                path: path.to_path_buf(),
            });
        }

        let mut text = String::new();
        // pdf-extract can panic on malformed fonts rather than returning an error
        let rendered = catch_unwind(AssertUnwindSafe(|| {
            let mut output = PlainTextOutput::new(&mut text);
            pdf_extract::output_doc_page(&doc, &mut output, 1)
        }));

        match rendered {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(not_a_pdf(e.to_string())),
            Err(_) => {
                #[cfg(feature = "logging")]
                warn!("pdf-extract panicked on {}", path.display());

                return Err(not_a_pdf("text extraction panicked".to_string()));
            }
        }

        debug!(
            "Extracted {} chars from page 1 of {} ({} pages)",
            text.len(),
            path.display(),
            page_count
        );

        Ok(PageText { text, page_count })
    }
}

impl TextSource for Extractor {
    fn first_page(&self, path: &Path) -> Result<PageText, ExtractError> {
        let bytes = std::fs::read(path).map_err(|source| ExtractError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        self.first_page_of(&bytes, path)
    }
}
