use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{BatchlineError, Result};

/// One line of a prompts file: the id echoed back by the batch
/// executor and the user prompt to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRecord {
    pub id: String,
    pub prompt: String,
}

/// Reads newline-delimited JSON prompt records, skipping blank lines.
pub fn read_prompts(path: impl AsRef<Path>) -> Result<Vec<PromptRecord>> {
    let contents = fs::read_to_string(path)?;
    let mut records = Vec::<PromptRecord>::new();
    for (idx, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record =
            serde_json::from_str::<PromptRecord>(line).map_err(|err| BatchlineError::PromptLine {
                line: idx + 1,
                message: err.to_string(),
            })?;
        records.push(record);
    }
    Ok(records)
}
