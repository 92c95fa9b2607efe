use std::fs;
use std::path::PathBuf;

use serde_json::Value;
use tracing::{debug, info};

use crate::config::ComposeConfig;
use crate::types::{
    BatchEntry, CHAT_COMPLETIONS_URL, Message, REQUEST_SEED, RequestBody, ResponseFormat,
};
use crate::{BatchlineError, Result};

pub const DEFAULT_MODEL: &str = "o4-mini";
pub const DEFAULT_REASONING_EFFORT: &str = "medium";
pub const DEFAULT_OUTPUT_DIR: &str = "data/batches";

/// Accumulates chat-completion requests and writes them out as one
/// JSONL batch input file.
#[derive(Debug, Clone)]
pub struct BatchComposer {
    model: String,
    reasoning_effort: String,
    json_schema: Option<Value>,
    system_prompt: String,
    output_dir: PathBuf,
    entries: Vec<BatchEntry>,
}

impl BatchComposer {
    pub fn new() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            reasoning_effort: DEFAULT_REASONING_EFFORT.to_string(),
            json_schema: None,
            system_prompt: String::new(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            entries: Vec::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_reasoning_effort(mut self, effort: impl Into<String>) -> Self {
        self.reasoning_effort = effort.into();
        self
    }

    pub fn with_json_schema(mut self, schema: Value) -> Self {
        self.json_schema = Some(schema);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn from_config(config: &ComposeConfig) -> Result<Self> {
        let mut composer = Self::new();
        if let Some(model) = config.model.as_deref().filter(|s| !s.trim().is_empty()) {
            composer = composer.with_model(model);
        }
        if let Some(effort) = config
            .reasoning_effort
            .as_deref()
            .filter(|s| !s.trim().is_empty())
        {
            composer = composer.with_reasoning_effort(effort);
        }
        if let Some(prompt) = config.resolved_system_prompt()? {
            composer = composer.with_system_prompt(prompt);
        }
        if let Some(schema) = config.resolved_schema()? {
            composer = composer.with_json_schema(schema);
        }
        if let Some(dir) = config.output_dir.as_ref() {
            composer = composer.with_output_dir(dir);
        }
        Ok(composer)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Appends one request envelope. The id and prompt are taken as
    /// given, duplicates included.
    pub fn add_entry(&mut self, custom_id: impl Into<String>, user_prompt: impl Into<String>) {
        let body = RequestBody {
            model: self.model.clone(),
            seed: REQUEST_SEED,
            reasoning_effort: self.reasoning_effort.clone(),
            response_format: self
                .json_schema
                .clone()
                .map(|json_schema| ResponseFormat::JsonSchema { json_schema }),
            messages: vec![
                Message::system(self.system_prompt.clone()),
                Message::user(user_prompt),
            ],
        };
        self.entries.push(BatchEntry {
            custom_id: custom_id.into(),
            method: "POST".to_string(),
            url: CHAT_COMPLETIONS_URL.to_string(),
            body,
        });
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn clear_entries(&mut self) {
        debug!(discarded = self.entries.len(), "cleared batch entries");
        self.entries.clear();
    }

    pub fn preview_entry(&self, index: usize) -> Result<&BatchEntry> {
        self.entries
            .get(index)
            .ok_or(BatchlineError::EntryIndexOutOfRange {
                index,
                count: self.entries.len(),
            })
    }

    pub fn batch_path(&self, batch_id: &str) -> PathBuf {
        self.output_dir.join(format!("batch_{batch_id}.jsonl"))
    }

    /// Writes every entry as one JSON line to
    /// `<output_dir>/batch_<batch_id>.jsonl`, overwriting any previous
    /// file. The output directory is never created here.
    pub fn save_to_file(&self, batch_id: &str) -> Result<()> {
        let path = self.batch_path(batch_id);
        let mut payload = String::new();
        for entry in &self.entries {
            payload.push_str(&serde_json::to_string(entry)?);
            payload.push('\n');
        }
        fs::write(&path, payload)?;
        info!(
            path = %path.display(),
            entries = self.entries.len(),
            "wrote batch file"
        );
        Ok(())
    }
}

impl Default for BatchComposer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;
    use serde_json::json;

    #[test]
    fn entry_uses_configured_fields() -> Result<()> {
        let mut composer = BatchComposer::new()
            .with_model("gpt-test")
            .with_reasoning_effort("low")
            .with_system_prompt("You are helpful.");
        composer.add_entry("r1", "Hello");

        assert_eq!(composer.entry_count(), 1);
        let entry = composer.preview_entry(0)?;
        assert_eq!(
            entry,
            &BatchEntry {
                custom_id: "r1".to_string(),
                method: "POST".to_string(),
                url: "/v1/chat/completions".to_string(),
                body: RequestBody {
                    model: "gpt-test".to_string(),
                    seed: 334,
                    reasoning_effort: "low".to_string(),
                    response_format: None,
                    messages: vec![
                        Message {
                            role: Role::System,
                            content: "You are helpful.".to_string(),
                        },
                        Message {
                            role: Role::User,
                            content: "Hello".to_string(),
                        },
                    ],
                },
            }
        );
        Ok(())
    }

    #[test]
    fn defaults_apply_without_builders() -> Result<()> {
        let mut composer = BatchComposer::new();
        composer.add_entry("a", "b");
        let entry = composer.preview_entry(0)?;
        assert_eq!(entry.body.model, "o4-mini");
        assert_eq!(entry.body.reasoning_effort, "medium");
        assert_eq!(entry.body.messages[0].content, "");
        assert!(entry.body.response_format.is_none());
        Ok(())
    }

    #[test]
    fn schema_attaches_to_every_entry() -> Result<()> {
        let schema = json!({"name": "answer", "schema": {"type": "object"}});
        let mut composer = BatchComposer::new().with_json_schema(schema.clone());
        composer.add_entry("a", "first");
        composer.add_entry("b", "second");

        for index in 0..composer.entry_count() {
            let entry = composer.preview_entry(index)?;
            assert_eq!(
                entry.body.response_format,
                Some(ResponseFormat::JsonSchema {
                    json_schema: schema.clone(),
                })
            );
        }
        Ok(())
    }

    #[test]
    fn entries_keep_insertion_order() -> Result<()> {
        let mut composer = BatchComposer::new();
        composer.add_entry("first", "1");
        composer.add_entry("second", "2");
        composer.add_entry("third", "3");

        assert_eq!(composer.preview_entry(0)?.custom_id, "first");
        assert_eq!(composer.preview_entry(1)?.custom_id, "second");
        assert_eq!(composer.preview_entry(2)?.custom_id, "third");
        Ok(())
    }

    #[test]
    fn preview_past_the_end_reports_index_and_count() {
        let mut composer = BatchComposer::new();
        composer.add_entry("only", "one");

        let err = composer
            .preview_entry(3)
            .expect_err("index 3 should be out of range");
        match err {
            BatchlineError::EntryIndexOutOfRange { index, count } => {
                assert_eq!(index, 3);
                assert_eq!(count, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn preview_on_empty_composer_is_out_of_range() {
        let composer = BatchComposer::new();
        let err = composer
            .preview_entry(0)
            .expect_err("empty composer has no entry 0");
        match err {
            BatchlineError::EntryIndexOutOfRange { index: 0, count: 0 } => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn clear_resets_count_but_keeps_settings() -> Result<()> {
        let mut composer = BatchComposer::new().with_model("gpt-test");
        composer.add_entry("a", "1");
        composer.add_entry("b", "2");
        composer.clear_entries();
        assert_eq!(composer.entry_count(), 0);

        composer.add_entry("c", "3");
        assert_eq!(composer.preview_entry(0)?.body.model, "gpt-test");
        Ok(())
    }

    #[test]
    fn batch_path_joins_output_dir_and_id() {
        let composer = BatchComposer::new().with_output_dir("out/files");
        assert_eq!(
            composer.batch_path("2024_07"),
            PathBuf::from("out/files/batch_2024_07.jsonl")
        );
    }

    #[test]
    fn default_output_dir_matches_layout() {
        let composer = BatchComposer::new();
        assert_eq!(
            composer.batch_path("x"),
            PathBuf::from("data/batches/batch_x.jsonl")
        );
    }

    #[test]
    fn entries_snapshot_settings_at_add_time() -> Result<()> {
        let mut composer = BatchComposer::new().with_model("first-model");
        composer.add_entry("a", "1");
        composer = composer.with_model("second-model");
        composer.add_entry("b", "2");

        assert_eq!(composer.preview_entry(0)?.body.model, "first-model");
        assert_eq!(composer.preview_entry(1)?.body.model, "second-model");
        Ok(())
    }
}
