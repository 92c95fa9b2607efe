use thiserror::Error;

#[derive(Debug, Error)]
pub enum BatchlineError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse config: {0}")]
    Config(#[from] toml::de::Error),
    #[error("entry index {index} is out of range ({count} entries)")]
    EntryIndexOutOfRange { index: usize, count: usize },
    #[error("invalid prompt record on line {line}: {message}")]
    PromptLine { line: usize, message: String },
}

pub type Result<T> = std::result::Result<T, BatchlineError>;
