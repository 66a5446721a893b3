//! Instructions, rewrite prompt pool and message construction

use crate::backend::ChatMessage;
use crate::core::time::format_system_time;
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::Value;
use std::path::Path;
use std::time::SystemTime;

pub const SUMMARIZE_INSTRUCTION: &str = "You are CodeWalker, an expert static analyzer. \
    Read the file content and produce a compact, actionable JSON summary. \
    Focus on purpose, key functions, inputs/outputs, dependencies, side effects, \
    security or performance risks, and immediate TODOs. \
    If it is a LOG, extract patterns, error types, and anomalies from the given tail. \
    Return *valid JSON only* with keys: \
    {file_purpose, key_functions, inputs_outputs, dependencies, side_effects, risks, todos, test_ideas}.";

pub const REWRITE_INSTRUCTION_PREFIX: &str = "You are CodeWalker, a careful refactoring assistant. \
    Rewrite the file for clarity and modularity while preserving behavior. \
    Target language must remain the same. Keep comments helpful. \
    Output only one fenced code block with the full rewritten file.";

/// Rewrite prompts available to a run. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPool {
    prompts: Vec<String>,
}

impl PromptPool {
    /// Load the pool from an optional JSON document.
    ///
    /// Accepted shapes: `{"prompts": [{"text": ..}, ..]}`, or the older
    /// `{"rewrite_prompts": [..]}` / `{"rewrite_prompts": {"group": [..]}}`.
    /// A missing file, unreadable JSON or an empty result yields the single
    /// `fallback` prompt.
    pub fn load(prompt_file: Option<&Path>, fallback: &str) -> Self {
        let fallback_pool = || Self {
            prompts: vec![fallback.trim().to_string()],
        };

        let path = match prompt_file {
            Some(path) if path.is_file() => path,
            Some(path) => {
                log::debug!("Prompt file {} not found, using rewrite-prompt", path.display());
                return fallback_pool();
            }
            None => return fallback_pool(),
        };

        let document = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|text| serde_json::from_str::<Value>(&text).map_err(|e| e.to_string()));

        match document {
            Ok(value) => {
                let prompts = Self::collect(&value);
                if prompts.is_empty() {
                    log::warn!("No prompts in {}, using rewrite-prompt", path.display());
                    fallback_pool()
                } else {
                    log::debug!("Loaded {} rewrite prompts from {}", prompts.len(), path.display());
                    Self { prompts }
                }
            }
            Err(e) => {
                log::warn!("Failed to load prompts {}: {}", path.display(), e);
                fallback_pool()
            }
        }
    }

    fn collect(value: &Value) -> Vec<String> {
        let mut raw: Vec<String> = Vec::new();

        if let Some(prompts) = value.get("prompts").and_then(Value::as_array) {
            raw.extend(
                prompts
                    .iter()
                    .filter_map(|p| p.get("text"))
                    .filter_map(scalar_text),
            );
        } else if let Some(legacy) = value.get("rewrite_prompts") {
            match legacy {
                Value::Array(items) => raw.extend(items.iter().filter_map(scalar_text)),
                Value::Object(groups) => {
                    for items in groups.values().filter_map(Value::as_array) {
                        raw.extend(items.iter().filter_map(scalar_text));
                    }
                }
                _ => {}
            }
        }

        let mut prompts: Vec<String> = Vec::new();
        for prompt in raw.into_iter().map(|p| p.trim().to_string()) {
            if !prompt.is_empty() && !prompts.contains(&prompt) {
                prompts.push(prompt);
            }
        }
        prompts
    }

    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        self.prompts
            .choose(rng)
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// File facts included in every user message
#[derive(Debug, Clone)]
pub struct FileMeta<'a> {
    pub path: &'a Path,
    pub ext: &'a str,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

impl FileMeta<'_> {
    pub fn render(&self) -> String {
        let modified = self
            .modified
            .map(format_system_time)
            .unwrap_or_else(|| "unknown".to_string());
        format!(
            "File: {}\nExt: {}\nSize: {} bytes\nLastModified: {}\n",
            self.path.display(),
            self.ext,
            self.size,
            modified
        )
    }
}

/// System instruction recorded for a rewrite
pub fn rewrite_instruction(prompt: &str) -> String {
    format!("{} {}", REWRITE_INSTRUCTION_PREFIX, prompt)
        .trim()
        .to_string()
}

pub fn summarize_messages(meta: &FileMeta<'_>, payload: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SUMMARIZE_INSTRUCTION),
        ChatMessage::user(format!(
            "{}\nCONTENT:\n```{}\n{}\n```",
            meta.render(),
            meta.ext,
            payload
        )),
    ]
}

pub fn rewrite_messages(meta: &FileMeta<'_>, payload: &str, instruction: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(instruction),
        ChatMessage::user(format!(
            "{}\nRewrite the entire file below.\n```{}\n{}\n```",
            meta.render(),
            meta.ext,
            escape_fences(payload)
        )),
    ]
}

/// Break up triple backticks so the payload cannot close the outer fence
pub fn escape_fences(payload: &str) -> String {
    payload.replace("```", "``\\`")
}
