mod composer;
mod config;
mod error;

pub mod prompts;
pub mod types;

pub use composer::{BatchComposer, DEFAULT_MODEL, DEFAULT_OUTPUT_DIR, DEFAULT_REASONING_EFFORT};
pub use config::ComposeConfig;
pub use error::{BatchlineError, Result};
pub use prompts::{PromptRecord, read_prompts};
pub use types::{
    BatchEntry, CHAT_COMPLETIONS_URL, Message, REQUEST_SEED, RequestBody, ResponseFormat, Role,
};
