pub mod backend;
pub mod chunker;
pub mod prompts;
pub mod provider;
pub mod providers;
pub mod retry;

pub use backend::{
    Backend, BackendError, BackendKind, BackendRegistry, ChunkPolicy, GenerateOptions, Generation,
    SkipReason, SkippedChunk, UnknownModelError,
};
pub use prompts::PromptTemplates;
pub use provider::{CompletionRequest, LlmError, LlmProvider, Message, Role, SamplingParams};
pub use retry::RetryPolicy;
