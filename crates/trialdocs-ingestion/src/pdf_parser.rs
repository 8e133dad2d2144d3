//! lopdf-based plain-text extraction.
//!
//! Every page contributes its text followed by a newline; a page lopdf cannot
//! read text from contributes only the newline.

use std::path::Path;

use anyhow::{Context, Result};
use lopdf::Document as PdfDoc;
use tracing::debug;

/// Extract the text of every page of the PDF at `pdf_path`.
pub fn extract_text(pdf_path: &Path) -> Result<String> {
    let pdf = PdfDoc::load(pdf_path)
        .with_context(|| format!("failed to load PDF {}", pdf_path.display()))?;
    Ok(page_text(&pdf))
}

/// Same as [`extract_text`] for a document already in memory.
pub fn extract_text_from_bytes(bytes: &[u8]) -> Result<String> {
    let pdf = PdfDoc::load_mem(bytes).context("failed to parse PDF bytes")?;
    Ok(page_text(&pdf))
}

fn page_text(pdf: &PdfDoc) -> String {
    let pages = pdf.get_pages();
    let mut full_text = String::new();

    for &page_num in pages.keys() {
        match pdf.extract_text(&[page_num]) {
            Ok(text) => full_text.push_str(&text),
            Err(e) => debug!(page = page_num, error = %e, "No extractable text on page"),
        }
        full_text.push('\n');
    }

    debug!(pages = pages.len(), chars = full_text.len(), "PDF text extracted");
    full_text
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Dictionary, Object, Stream};

    /// A structurally valid PDF with `n` pages and empty content streams.
    fn blank_pdf(n: usize) -> Vec<u8> {
        let mut doc = PdfDoc::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids: Vec<Object> = Vec::new();
        for _ in 0..n {
            let content_id = doc.add_object(Stream::new(Dictionary::new(), Vec::new()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            });
            kids.push(page_id.into());
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => n as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_blank_pages_contribute_only_newlines() {
        let text = extract_text_from_bytes(&blank_pdf(3)).unwrap();
        assert_eq!(text, "\n\n\n");
    }

    #[test]
    fn test_corrupt_bytes_are_an_error() {
        assert!(extract_text_from_bytes(b"this is not a pdf").is_err());
    }

    #[test]
    fn test_extract_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("two.pdf");
        std::fs::write(&path, blank_pdf(2)).unwrap();
        assert_eq!(extract_text(&path).unwrap().matches('\n').count(), 2);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(extract_text(&dir.path().join("absent.pdf")).is_err());
    }
}
