use std::path::Path;

use tracing::info;

use mindmap_core::MindmapError;

/// File name of the mind-map system prompt inside a prompts directory.
pub const MINDMAP_TEMPLATE_FILE: &str = "mindmap.md";
/// File name of the summary system prompt inside a prompts directory.
pub const SUMMARY_TEMPLATE_FILE: &str = "summary.md";

const BUILTIN_MINDMAP: &str = include_str!("../prompts/mindmap.md");
const BUILTIN_SUMMARY: &str = include_str!("../prompts/summary.md");

/// System prompts for the two generation passes of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplates {
    pub mindmap: String,
    pub summary: String,
}

impl PromptTemplates {
    /// Templates compiled into the binary.
    pub fn builtin() -> Self {
        Self {
            mindmap: BUILTIN_MINDMAP.trim().to_string(),
            summary: BUILTIN_SUMMARY.trim().to_string(),
        }
    }

    /// Load overrides from `dir`, or the built-ins when `dir` is `None`.
    /// A configured directory must contain both templates.
    pub fn load(dir: Option<&Path>) -> Result<Self, MindmapError> {
        let Some(dir) = dir else {
            return Ok(Self::builtin());
        };
        let templates = Self {
            mindmap: load_template(&dir.join(MINDMAP_TEMPLATE_FILE))?,
            summary: load_template(&dir.join(SUMMARY_TEMPLATE_FILE))?,
        };
        info!("Loaded prompt templates from {}", dir.display());
        Ok(templates)
    }
}

fn load_template(path: &Path) -> Result<String, MindmapError> {
    if !path.is_file() {
        return Err(MindmapError::TemplateNotFound(path.display().to_string()));
    }
    Ok(std::fs::read_to_string(path)?.trim().to_string())
}
