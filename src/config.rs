use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;

/// Optional on-disk defaults for a compose run. Unknown keys are
/// rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComposeConfig {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub reasoning_effort: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub system_prompt_file: Option<PathBuf>,
    #[serde(default)]
    pub schema_file: Option<PathBuf>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl ComposeConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Inline prompt wins over the file variant when both are set.
    pub fn resolved_system_prompt(&self) -> Result<Option<String>> {
        if let Some(prompt) = self.system_prompt.as_ref() {
            return Ok(Some(prompt.clone()));
        }
        match self.system_prompt_file.as_ref() {
            Some(path) => {
                let contents = fs::read_to_string(path)?;
                Ok(Some(contents.trim_end().to_string()))
            }
            None => Ok(None),
        }
    }

    pub fn resolved_schema(&self) -> Result<Option<Value>> {
        match self.schema_file.as_ref() {
            Some(path) => {
                let raw = fs::read_to_string(path)?;
                Ok(Some(serde_json::from_str(&raw)?))
            }
            None => Ok(None),
        }
    }
}
