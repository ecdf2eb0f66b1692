use crate::error::IngestError;
use crate::models::{document_id_for, DocumentText};
use chrono::Utc;
use lopdf::Document;
use std::path::Path;

/// Supplies extracted text per document. The pipeline takes this as an
/// injected dependency so tests can substitute a deterministic source.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<DocumentText, IngestError>;
}

#[derive(Default)]
pub struct LopdfExtractor;

impl TextExtractor for LopdfExtractor {
    fn extract(&self, path: &Path) -> Result<DocumentText, IngestError> {
        let source = path.display().to_string();
        let document = Document::load(path).map_err(|error| IngestError::Extraction {
            src: source.clone(),
            reason: error.to_string(),
        })?;

        let page_count = document.get_pages().len();
        let mut pages = Vec::new();
        for (page_no, _page_id) in document.get_pages() {
            let text = document
                .extract_text(&[page_no])
                .map_err(|error| IngestError::Extraction {
                    src: source.clone(),
                    reason: error.to_string(),
                })?;

            if !text.trim().is_empty() {
                pages.push(text);
            }
        }

        if pages.is_empty() {
            return Err(IngestError::Extraction {
                src: source,
                reason: "pdf had no readable page text".to_string(),
            });
        }

        let source_path = path.to_string_lossy().to_string();
        Ok(DocumentText {
            document_id: document_id_for(&source_path),
            source_path,
            text: pages.join("\n"),
            page_count,
            extracted_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn unreadable_pdf_fails_with_extraction_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("broken.pdf");
        fs::write(&path, b"%PDF-1.4\n%broken")?;

        let result = LopdfExtractor.extract(&path);
        assert!(matches!(result, Err(IngestError::Extraction { .. })));
        Ok(())
    }

    #[test]
    fn missing_file_fails_with_extraction_error() {
        let result = LopdfExtractor.extract(Path::new("/nonexistent/paper.pdf"));
        assert!(matches!(result, Err(IngestError::Extraction { .. })));
    }
}
