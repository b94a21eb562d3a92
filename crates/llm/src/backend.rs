//! Backend adapters: one selectable generation backend per provider.
//!
//! A [`Backend`] wraps an [`LlmProvider`] with the provider's fixed sampling
//! parameters and its chunking policy. Whole-input backends make exactly one
//! call and fail hard; chunked backends call once per chunk, in order, and
//! skip chunks that overflow the budget or fail.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use mindmap_core::config::{LlmConfig, OllamaConfig};

use crate::chunker::{chunk_budget, chunk_text, estimate_joined};
use crate::provider::{CompletionRequest, LlmError, LlmProvider, Message, SamplingParams};
use crate::providers::create_provider;

// ── Backend kind ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Gemini,
    Claude,
    Mistral,
    Ollama,
}

impl BackendKind {
    pub const ALL: [BackendKind; 4] = [
        BackendKind::Gemini,
        BackendKind::Claude,
        BackendKind::Mistral,
        BackendKind::Ollama,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Gemini => "gemini",
            BackendKind::Claude => "claude",
            BackendKind::Mistral => "mistral",
            BackendKind::Ollama => "ollama",
        }
    }

    /// Fixed generation parameters for this provider.
    pub fn sampling_params(self) -> SamplingParams {
        match self {
            BackendKind::Gemini | BackendKind::Claude => SamplingParams {
                temperature: 0.7,
                top_p: Some(0.9),
                max_tokens: 2048,
                repeat_penalty: None,
            },
            BackendKind::Mistral => SamplingParams {
                temperature: 0.7,
                top_p: Some(0.9),
                max_tokens: 1024,
                repeat_penalty: None,
            },
            BackendKind::Ollama => SamplingParams {
                temperature: 0.7,
                top_p: Some(0.9),
                max_tokens: 512,
                repeat_penalty: Some(1.1),
            },
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = UnknownModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(BackendKind::Gemini),
            "claude" => Ok(BackendKind::Claude),
            "mistral" => Ok(BackendKind::Mistral),
            "ollama" => Ok(BackendKind::Ollama),
            _ => Err(UnknownModelError(s.to_string())),
        }
    }
}

// ── Errors ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown model '{0}': expected one of gemini, claude, mistral, ollama")]
pub struct UnknownModelError(pub String);

/// A provider call that could not be recovered.
#[derive(Debug, thiserror::Error)]
#[error("{provider} backend failed: {source}")]
pub struct BackendError {
    pub provider: BackendKind,
    pub source: LlmError,
}

// ── Generation ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkPolicy {
    /// Send the whole input in one call.
    Whole,
    /// Split the input and call once per chunk. `max_tokens` bounds the
    /// estimate of system prompt plus chunk.
    Chunked { max_tokens: usize },
}

/// Per-call inputs. Credentials and model travel here, never through
/// shared state.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub system_prompt: String,
    pub model: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// System prompt plus chunk still exceeded the budget.
    Overflow { estimated: usize, budget: usize },
    /// The provider call failed.
    Failed { message: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Overflow { estimated, budget } => {
                write!(f, "estimated {estimated} tokens exceeds budget {budget}")
            }
            SkipReason::Failed { message } => write!(f, "{message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedChunk {
    /// 0-based chunk position.
    pub index: usize,
    pub reason: SkipReason,
}

/// Ordered raw results of one generation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generation {
    pub results: Vec<String>,
    pub skipped: Vec<SkippedChunk>,
}

// ── Backend ───────────────────────────────────────────────────

#[derive(Clone)]
pub struct Backend {
    kind: BackendKind,
    provider: Arc<dyn LlmProvider>,
    params: SamplingParams,
    chunking: ChunkPolicy,
}

impl Backend {
    pub fn new(kind: BackendKind, provider: Arc<dyn LlmProvider>, chunking: ChunkPolicy) -> Self {
        Self {
            kind,
            provider,
            params: kind.sampling_params(),
            chunking,
        }
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    pub fn is_chunked(&self) -> bool {
        matches!(self.chunking, ChunkPolicy::Chunked { .. })
    }

    /// Run one generation pass over `text`.
    ///
    /// Chunked backends only fail when every attempted chunk failed; the
    /// last provider error is returned in that case.
    pub async fn generate(
        &self,
        text: &str,
        options: &GenerateOptions,
    ) -> Result<Generation, BackendError> {
        match self.chunking {
            ChunkPolicy::Whole => self.generate_whole(text, options).await,
            ChunkPolicy::Chunked { max_tokens } => {
                self.generate_chunked(text, options, max_tokens).await
            }
        }
    }

    async fn generate_whole(
        &self,
        text: &str,
        options: &GenerateOptions,
    ) -> Result<Generation, BackendError> {
        info!(provider = %self.kind, chars = text.len(), "generating from whole input");
        let reply = self.call(text, options).await.map_err(|source| {
            warn!(provider = %self.kind, "generation failed: {}", source);
            BackendError { provider: self.kind, source }
        })?;
        Ok(Generation {
            results: vec![reply],
            skipped: Vec::new(),
        })
    }

    async fn generate_chunked(
        &self,
        text: &str,
        options: &GenerateOptions,
        max_tokens: usize,
    ) -> Result<Generation, BackendError> {
        let chunk_budget = chunk_budget(&options.system_prompt, max_tokens);
        let chunks = chunk_text(text, chunk_budget);
        info!(
            provider = %self.kind,
            chunks = chunks.len(),
            chunk_budget,
            "generating from chunked input"
        );

        let mut generation = Generation::default();
        let mut last_error = None;

        for (index, chunk) in chunks.iter().enumerate() {
            let estimated = estimate_joined(&[options.system_prompt.as_str(), chunk.as_str()]);
            if estimated > max_tokens {
                warn!(provider = %self.kind, index, estimated, max_tokens, "chunk over budget, skipping");
                generation.skipped.push(SkippedChunk {
                    index,
                    reason: SkipReason::Overflow { estimated, budget: max_tokens },
                });
                continue;
            }

            match self.call(chunk, options).await {
                Ok(reply) => generation.results.push(reply),
                Err(e) => {
                    warn!(provider = %self.kind, index, "chunk generation failed, skipping: {}", e);
                    generation.skipped.push(SkippedChunk {
                        index,
                        reason: SkipReason::Failed { message: e.to_string() },
                    });
                    last_error = Some(e);
                }
            }
        }

        if generation.results.is_empty() {
            if let Some(source) = last_error {
                return Err(BackendError { provider: self.kind, source });
            }
        }
        Ok(generation)
    }

    async fn call(&self, text: &str, options: &GenerateOptions) -> Result<String, LlmError> {
        let mut messages = Vec::with_capacity(2);
        if !options.system_prompt.is_empty() {
            messages.push(Message::system(options.system_prompt.clone()));
        }
        messages.push(Message::user(text));

        let request = CompletionRequest {
            messages,
            params: self.params,
            model: options.model.clone(),
            api_key: options.api_key.clone(),
        };
        self.provider.complete(&request).await
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("kind", &self.kind)
            .field("params", &self.params)
            .field("chunking", &self.chunking)
            .finish()
    }
}

// ── Registry ──────────────────────────────────────────────────

/// Discriminator → backend, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct BackendRegistry {
    backends: HashMap<BackendKind, Backend>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All four backends with their configured chunk budgets.
    pub fn from_config(
        llm_config: &LlmConfig,
        ollama_config: &OllamaConfig,
    ) -> Result<Self, LlmError> {
        let mut registry = Self::new();
        for kind in BackendKind::ALL {
            let provider = create_provider(kind, llm_config, ollama_config)?;
            let chunking = match kind {
                BackendKind::Gemini | BackendKind::Claude => ChunkPolicy::Whole,
                BackendKind::Mistral => ChunkPolicy::Chunked {
                    max_tokens: llm_config.mistral_chunk_tokens,
                },
                BackendKind::Ollama => ChunkPolicy::Chunked {
                    max_tokens: ollama_config.chunk_tokens,
                },
            };
            registry.insert(Backend::new(kind, provider, chunking));
        }
        Ok(registry)
    }

    pub fn insert(&mut self, backend: Backend) {
        self.backends.insert(backend.kind(), backend);
    }

    /// Look up a backend by its request discriminator.
    pub fn resolve(&self, name: &str) -> Result<&Backend, UnknownModelError> {
        let kind: BackendKind = name.parse()?;
        self.backends
            .get(&kind)
            .ok_or_else(|| UnknownModelError(name.to_string()))
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<BackendKind> {
        let mut kinds: Vec<_> = self.backends.keys().copied().collect();
        kinds.sort();
        kinds
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    /// Replays scripted replies and records every request it sees.
    #[derive(Default)]
    struct ScriptedProvider {
        replies: Mutex<VecDeque<Result<String, LlmError>>>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Result<String, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
            self.seen.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("default reply".into()))
        }
    }

    fn api_error() -> LlmError {
        LlmError::ApiError { status: 500, body: "boom".into() }
    }

    fn options(system: &str) -> GenerateOptions {
        GenerateOptions {
            system_prompt: system.into(),
            model: Some("tinyllama".into()),
            api_key: Some("per-request".into()),
        }
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("Gemini".parse::<BackendKind>().unwrap(), BackendKind::Gemini);
        assert_eq!(" ollama ".parse::<BackendKind>().unwrap(), BackendKind::Ollama);
        assert_eq!(
            "gpt".parse::<BackendKind>(),
            Err(UnknownModelError("gpt".into()))
        );
        for kind in BackendKind::ALL {
            assert_eq!(kind.as_str().parse::<BackendKind>().unwrap(), kind);
        }
    }

    #[tokio::test]
    async fn whole_backend_makes_one_call_with_system_and_user() {
        let provider = ScriptedProvider::new(vec![Ok("**A**".into())]);
        let backend = Backend::new(BackendKind::Gemini, provider.clone(), ChunkPolicy::Whole);

        let long_text = "Sentence. ".repeat(5_000);
        let generation = backend.generate(&long_text, &options("sys")).await.unwrap();

        assert_eq!(generation.results, vec!["**A**".to_string()]);
        assert!(generation.skipped.is_empty());
        assert_eq!(provider.calls(), 1);

        let seen = provider.seen.lock().unwrap();
        let request = &seen[0];
        assert_eq!(request.system(), Some("sys"));
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[1].content, long_text);
        assert_eq!(request.api_key.as_deref(), Some("per-request"));
        assert_eq!(request.params, BackendKind::Gemini.sampling_params());
    }

    #[tokio::test]
    async fn whole_backend_failure_is_fatal() {
        let provider = ScriptedProvider::new(vec![Err(api_error())]);
        let backend = Backend::new(BackendKind::Claude, provider, ChunkPolicy::Whole);

        let err = backend.generate("text.", &options("")).await.unwrap_err();
        assert_eq!(err.provider, BackendKind::Claude);
        assert!(matches!(err.source, LlmError::ApiError { status: 500, .. }));
    }

    #[tokio::test]
    async fn chunked_backend_calls_in_order_and_skips_failures() {
        let provider = ScriptedProvider::new(vec![
            Ok("first".into()),
            Err(api_error()),
            Ok("third".into()),
        ]);
        let backend = Backend::new(
            BackendKind::Ollama,
            provider.clone(),
            ChunkPolicy::Chunked { max_tokens: 10 },
        );

        // Three sentences of ~8 estimated tokens each, one per chunk.
        let text = "Alpha alpha alpha alpha. Beta beta beta beta beta. Gamma gamma gamma gamma.";
        let generation = backend.generate(text, &options("")).await.unwrap();

        assert_eq!(generation.results, vec!["first".to_string(), "third".to_string()]);
        assert_eq!(generation.skipped.len(), 1);
        assert_eq!(generation.skipped[0].index, 1);
        assert!(matches!(generation.skipped[0].reason, SkipReason::Failed { .. }));
        assert_eq!(provider.calls(), 3);

        let seen = provider.seen.lock().unwrap();
        assert!(seen[0].messages[0].content.starts_with("Alpha"));
        assert!(seen[2].messages[0].content.starts_with("Gamma"));
    }

    #[tokio::test]
    async fn oversized_word_chunk_is_skipped_without_a_call() {
        let provider = ScriptedProvider::new(vec![]);
        let backend = Backend::new(
            BackendKind::Mistral,
            provider.clone(),
            ChunkPolicy::Chunked { max_tokens: 5 },
        );

        // The second word alone estimates to 10 tokens.
        let text = "ok fine. abcdefghijabcdefghijabcdefghij.";
        let generation = backend.generate(text, &options("")).await.unwrap();

        assert_eq!(generation.results.len(), 1);
        assert_eq!(generation.skipped.len(), 1);
        assert_eq!(
            generation.skipped[0].reason,
            SkipReason::Overflow { estimated: 10, budget: 5 }
        );
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn system_prompt_shrinks_the_chunk_budget() {
        let provider = ScriptedProvider::new(vec![]);
        let backend = Backend::new(
            BackendKind::Ollama,
            provider.clone(),
            ChunkPolicy::Chunked { max_tokens: 20 },
        );

        // 30 chars of system prompt plus a separator leave 29 chars: 9 tokens.
        let system = "s".repeat(30);
        let text = "Alpha alpha alpha alpha. Beta beta beta beta beta.";
        let generation = backend.generate(text, &options(&system)).await.unwrap();

        assert_eq!(generation.results.len(), 2);
        assert!(generation.skipped.is_empty());
        for request in provider.seen.lock().unwrap().iter() {
            assert_eq!(request.system(), Some(system.as_str()));
            let chunk = &request.messages[1].content;
            assert!(estimate_joined(&[system.as_str(), chunk.as_str()]) <= 20);
        }
    }

    #[tokio::test]
    async fn chunk_filling_its_budget_is_not_skipped_as_overflow() {
        let provider = ScriptedProvider::new(vec![]);
        let backend = Backend::new(
            BackendKind::Ollama,
            provider.clone(),
            ChunkPolicy::Chunked { max_tokens: 20 },
        );

        // 32 chars of system prompt do not divide by 3; a 30-char sentence
        // (estimate 10) used to be packed whole and then rejected at 21.
        let system = "s".repeat(32);
        let text = "Alpha alpha alpha alpha alpha.";
        let generation = backend.generate(text, &options(&system)).await.unwrap();

        assert!(generation.skipped.is_empty(), "skipped: {:?}", generation.skipped);
        assert_eq!(generation.results.len(), 2);
        assert_eq!(provider.calls(), 2);
        for request in provider.seen.lock().unwrap().iter() {
            let chunk = &request.messages[1].content;
            assert!(estimate_joined(&[system.as_str(), chunk.as_str()]) <= 20);
        }
    }

    #[tokio::test]
    async fn no_system_prompt_length_causes_overflow_skips() {
        let text = "Alpha beta gamma delta. Epsilon zeta eta theta iota. Kappa lambda mu.";
        for system_len in 0..=40 {
            let provider = ScriptedProvider::new(vec![]);
            let backend = Backend::new(
                BackendKind::Mistral,
                provider,
                ChunkPolicy::Chunked { max_tokens: 20 },
            );
            let system = "s".repeat(system_len);
            let generation = backend.generate(text, &options(&system)).await.unwrap();
            assert!(
                generation.skipped.is_empty(),
                "system of {system_len} chars skipped {:?}",
                generation.skipped
            );
        }
    }

    #[tokio::test]
    async fn chunked_backend_fails_when_every_chunk_fails() {
        let provider = ScriptedProvider::new(vec![Err(api_error()), Err(api_error())]);
        let backend = Backend::new(
            BackendKind::Ollama,
            provider,
            ChunkPolicy::Chunked { max_tokens: 10 },
        );

        let text = "Alpha alpha alpha alpha. Beta beta beta beta beta.";
        let err = backend.generate(text, &options("")).await.unwrap_err();
        assert_eq!(err.provider, BackendKind::Ollama);
    }

    #[tokio::test]
    async fn blank_input_makes_no_chunked_calls() {
        let provider = ScriptedProvider::new(vec![]);
        let backend = Backend::new(
            BackendKind::Ollama,
            provider.clone(),
            ChunkPolicy::Chunked { max_tokens: 100 },
        );

        let generation = backend.generate("\n\n\n", &options("")).await.unwrap();
        assert_eq!(generation, Generation::default());
        assert_eq!(provider.calls(), 0);
    }

    #[test]
    fn registry_resolves_only_known_kinds() {
        let mut registry = BackendRegistry::new();
        registry.insert(Backend::new(
            BackendKind::Gemini,
            ScriptedProvider::new(vec![]),
            ChunkPolicy::Whole,
        ));

        assert_eq!(registry.resolve("gemini").unwrap().kind(), BackendKind::Gemini);
        assert_eq!(
            registry.resolve("unknown").unwrap_err(),
            UnknownModelError("unknown".into())
        );
        // Valid name but not registered.
        assert!(registry.resolve("claude").is_err());
        assert_eq!(registry.kinds(), vec![BackendKind::Gemini]);
    }
}
