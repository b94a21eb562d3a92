//! Speech-to-text for uploaded audio clips.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::multipart;
use tracing::{debug, info};

use mindmap_core::config::TranscriptionConfig;

use crate::document::ExtractionError;

#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe `audio`. `filename` is the uploaded name, used to pick the
    /// MIME type sent upstream.
    async fn transcribe(&self, audio: &[u8], filename: Option<&str>) -> Result<String, ExtractionError>;
}

/// Any OpenAI-compatible `/audio/transcriptions` endpoint (OpenAI Whisper,
/// faster-whisper servers, LocalAI, ...).
pub struct WhisperTranscriber {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl WhisperTranscriber {
    pub fn new(base_url: String, api_key: Option<String>, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio: &[u8], filename: Option<&str>) -> Result<String, ExtractionError> {
        let url = format!("{}/audio/transcriptions", self.base_url);
        let filename = filename.unwrap_or("audio.wav").to_string();
        let mime = audio_mime(&filename);

        let file_part = multipart::Part::bytes(audio.to_vec())
            .file_name(filename)
            .mime_str(mime)
            .map_err(|e| ExtractionError::Transcription(format!("mime: {}", e)))?;

        let form = multipart::Form::new()
            .text("model", self.model.clone())
            .text("response_format", "text")
            .part("file", file_part);

        debug!(model = %self.model, "Sending audio to transcription API");

        let mut request = self.client.post(&url).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ExtractionError::Transcription(format!("request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ExtractionError::Transcription(format!(
                "status {}: {}",
                status, body
            )));
        }

        let transcript = response
            .text()
            .await
            .map_err(|e| ExtractionError::Transcription(format!("body: {}", e)))?;

        info!(chars = transcript.len(), "Transcription completed");

        Ok(transcript.trim().to_string())
    }
}

/// Used when no transcription endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledTranscriber;

#[async_trait]
impl Transcriber for DisabledTranscriber {
    async fn transcribe(&self, _audio: &[u8], _filename: Option<&str>) -> Result<String, ExtractionError> {
        Err(ExtractionError::NotConfigured("TRANSCRIPTION_URL not set".into()))
    }
}

/// Build the transcriber described by config.
pub fn transcriber_from_config(config: &TranscriptionConfig) -> Arc<dyn Transcriber> {
    match &config.url {
        Some(url) => Arc::new(WhisperTranscriber::new(
            url.clone(),
            config.api_key.clone(),
            config.model.clone(),
        )),
        None => Arc::new(DisabledTranscriber),
    }
}

/// MIME type by file extension; unknown extensions are sent as octet-stream.
pub fn audio_mime(filename: &str) -> &'static str {
    let ext = filename.rsplit('.').next().unwrap_or("").to_lowercase();
    match ext.as_str() {
        "wav" => "audio/wav",
        "mp3" | "mpeg" | "mpga" => "audio/mpeg",
        "m4a" | "mp4" => "audio/mp4",
        "ogg" | "oga" => "audio/ogg",
        "webm" => "audio/webm",
        "flac" => "audio/flac",
        _ => "application/octet-stream",
    }
}
