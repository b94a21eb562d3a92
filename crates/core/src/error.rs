use thiserror::Error;

#[derive(Error, Debug)]
pub enum MindmapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Prompt template not found: {0}")]
    TemplateNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
