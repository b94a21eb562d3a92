use super::ExtractionError;

/// Extract the text layer of a PDF, one entry per non-empty page.
///
/// Scanned/image-only PDFs have no text layer and yield no pages.
pub fn extract_pdf(bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| ExtractionError::PdfError(e.to_string()))?;

    let trimmed = text.trim();
    if trimmed.is_empty() {
        tracing::warn!("PDF has no extractable text layer");
        return Ok(Vec::new());
    }

    // Page breaks survive as form feeds, when there are any.
    let pages = if text.contains('\x0C') {
        text.split('\x0C')
            .map(str::trim)
            .filter(|page| !page.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        vec![trimmed.to_string()]
    };

    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentExtractor, PdfExtractor};

    #[test]
    fn garbage_bytes_are_rejected() {
        let result = extract_pdf(b"definitely not a pdf");
        assert!(matches!(result, Err(ExtractionError::PdfError(_))));
    }

    #[tokio::test]
    async fn async_extractor_reports_errors() {
        let result = PdfExtractor.extract(b"%PDF-1.4 truncated").await;
        assert!(result.is_err());
    }
}
