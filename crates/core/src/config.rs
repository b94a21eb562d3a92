use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub ollama: OllamaConfig,
    pub transcription: TranscriptionConfig,
    pub prompts: PromptConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `MINDMAP_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("MINDMAP_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            llm: LlmConfig::from_env_profiled(p),
            ollama: OllamaConfig::from_env_profiled(p),
            transcription: TranscriptionConfig::from_env_profiled(p),
            prompts: PromptConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:        {}:{}, cors={}", self.server.host, self.server.port, self.server.cors_origins.join(","));
        tracing::info!("  gemini:        model={}, key={}", self.llm.gemini_model, presence(&self.llm.gemini_api_key));
        tracing::info!("  claude:        model={}, key={}", self.llm.anthropic_model, presence(&self.llm.anthropic_api_key));
        tracing::info!("  mistral:       model={}, key={}, chunk_tokens={}", self.llm.mistral_model, presence(&self.llm.mistral_api_key), self.llm.mistral_chunk_tokens);
        tracing::info!("  cloud timeout: {}s", self.llm.request_timeout_secs);
        tracing::info!("  ollama:        url={}, model={}, chunk_tokens={}", self.ollama.url, self.ollama.model, self.ollama.chunk_tokens);
        tracing::info!("  transcription: url={}", self.transcription.url.as_deref().unwrap_or("(none)"));
    }

    /// Return a redacted view safe for API responses (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "server": { "host": self.server.host, "port": self.server.port },
            "gemini": {
                "model": self.llm.gemini_model,
                "configured": self.llm.gemini_api_key.is_some(),
            },
            "claude": {
                "model": self.llm.anthropic_model,
                "configured": self.llm.anthropic_api_key.is_some(),
            },
            "mistral": {
                "model": self.llm.mistral_model,
                "configured": self.llm.mistral_api_key.is_some(),
                "chunk_tokens": self.llm.mistral_chunk_tokens,
            },
            "llm_timeout_secs": self.llm.request_timeout_secs,
            "ollama": {
                "url": self.ollama.url,
                "model": self.ollama.model,
                "chunk_tokens": self.ollama.chunk_tokens,
            },
            "transcription": { "configured": self.transcription.is_configured() },
        })
    }
}

fn presence(key: &Option<String>) -> &'static str {
    if key.is_some() { "set" } else { "(none)" }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins. A single `*` means any origin.
    pub cors_origins: Vec<String>,
    pub max_upload_mb: usize,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_parse(p, "PORT", 8000),
            cors_origins: parse_list(&profiled_env_or(p, "CORS_ORIGINS", "*")),
            max_upload_mb: profiled_env_parse(p, "MAX_UPLOAD_MB", 50),
        }
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|o| o == "*")
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ── LLM (Gemini / Claude / Mistral) ───────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub anthropic_base_url: String,
    pub mistral_api_key: Option<String>,
    pub mistral_model: String,
    pub mistral_base_url: String,
    pub mistral_chunk_tokens: usize,
    /// Whole-request timeout for the cloud providers.
    pub request_timeout_secs: u64,
}

impl LlmConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            gemini_api_key: profiled_env_opt(p, "GEMINI_KEY"),
            gemini_model: profiled_env_or(p, "GEMINI_MODEL", "gemini-1.5-flash"),
            gemini_base_url: profiled_env_or(p, "GEMINI_BASE_URL", "https://generativelanguage.googleapis.com"),
            anthropic_api_key: profiled_env_opt(p, "ANTHROPIC_API_KEY"),
            anthropic_model: profiled_env_or(p, "ANTHROPIC_MODEL", "claude-3-5-sonnet-20241022"),
            anthropic_base_url: profiled_env_or(p, "ANTHROPIC_BASE_URL", "https://api.anthropic.com"),
            mistral_api_key: profiled_env_opt(p, "MISTRAL_API_KEY"),
            mistral_model: profiled_env_or(p, "MISTRAL_MODEL", "mistral-large-latest"),
            mistral_base_url: profiled_env_or(p, "MISTRAL_BASE_URL", "https://api.mistral.ai"),
            mistral_chunk_tokens: profiled_env_parse(p, "MISTRAL_CHUNK_TOKENS", 8000),
            request_timeout_secs: profiled_env_parse(p, "LLM_TIMEOUT_SECS", 120),
        }
    }
}

// ── Ollama (local models) ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
    pub chunk_tokens: usize,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl OllamaConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            url: profiled_env_or(p, "OLLAMA_URL", "http://ollama:11434"),
            model: profiled_env_or(p, "OLLAMA_MODEL", "tinyllama"),
            chunk_tokens: profiled_env_parse(p, "OLLAMA_CHUNK_TOKENS", 2000),
            timeout_secs: profiled_env_parse(p, "OLLAMA_TIMEOUT_SECS", 90),
            max_attempts: profiled_env_parse(p, "OLLAMA_MAX_ATTEMPTS", 3),
            retry_backoff_ms: profiled_env_parse(p, "OLLAMA_RETRY_BACKOFF_MS", 1000),
        }
    }
}

// ── Speech-to-text ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// Base URL of a Whisper-compatible API, e.g. `https://api.openai.com/v1`.
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
}

impl TranscriptionConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            url: profiled_env_opt(p, "TRANSCRIPTION_URL"),
            api_key: profiled_env_opt(p, "TRANSCRIPTION_API_KEY"),
            model: profiled_env_or(p, "TRANSCRIPTION_MODEL", "whisper-1"),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }
}

// ── Prompt templates ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Directory holding `mindmap.md` / `summary.md` overrides.
    pub dir: Option<PathBuf>,
}

impl PromptConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            dir: profiled_env_opt(p, "PROMPTS_DIR").map(PathBuf::from),
        }
    }
}
