//! Turns uploaded files into plain text: PDF text layers and audio
//! transcripts.

pub mod audio;
pub mod document;

pub use audio::{transcriber_from_config, DisabledTranscriber, Transcriber, WhisperTranscriber};
pub use document::{extract_pdf, DocumentExtractor, ExtractionError, PdfExtractor};
