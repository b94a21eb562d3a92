mod pdf;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

pub use pdf::extract_pdf;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("PDF extraction failed: {0}")]
    PdfError(String),
    #[error("Transcription failed: {0}")]
    Transcription(String),
    #[error("Extractor not configured: {0}")]
    NotConfigured(String),
    #[error("Extraction task failed: {0}")]
    Task(String),
}

/// Turns an uploaded document into plain text.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError>;
}

/// Text-layer PDF extraction via `pdf-extract`, run on the blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

#[async_trait]
impl DocumentExtractor for PdfExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let owned = bytes.to_vec();
        // pdf-extract is CPU-bound and can panic on malformed input; a
        // panicking blocking task surfaces here as a JoinError.
        let pages = tokio::task::spawn_blocking(move || extract_pdf(&owned))
            .await
            .map_err(|e| ExtractionError::Task(e.to_string()))??;

        let text = pages.join("\n\n");
        info!("Extracted {} pages ({} chars) from PDF", pages.len(), text.len());
        Ok(text)
    }
}
