use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One source file produced by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
    /// Display label only; never checked against the content.
    pub language: String,
}

/// A complete generated project as returned by one generation call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratedApp {
    pub name: String,
    pub description: String,
    pub files: Vec<GeneratedFile>,
    /// Free-form ASCII rendering of the file hierarchy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree: Option<String>,
}

impl GeneratedApp {
    /// Check the invariants the viewer relies on. Returns a short description
    /// of the first violation found.
    pub fn validate(&self) -> Result<(), String> {
        if self.files.is_empty() {
            return Err("the project contains no files".to_string());
        }

        let mut seen = HashSet::new();
        for (index, file) in self.files.iter().enumerate() {
            let path = file.path.trim();
            if path.is_empty() {
                return Err(format!("file #{} has an empty path", index + 1));
            }
            if is_absolute_path(path) {
                return Err(format!("path '{path}' must be relative"));
            }
            if path.split(['/', '\\']).any(|segment| segment == "..") {
                return Err(format!("path '{path}' escapes the project root"));
            }
            if file.content.is_empty() {
                return Err(format!("file '{path}' has no content"));
            }
            if !seen.insert(path) {
                return Err(format!("path '{path}' appears more than once"));
            }
        }

        Ok(())
    }
}

fn is_absolute_path(path: &str) -> bool {
    if path.starts_with('/') || path.starts_with('\\') {
        return true;
    }
    // Windows drive prefix, e.g. "C:\" or "c:/"
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationStatus {
    #[default]
    Idle,
    Thinking,
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout")]
    pub request_timeout: u64,
    /// Ask the provider to enforce the response schema (`json_schema`)
    /// instead of plain JSON mode.
    #[serde(default)]
    pub structured_output: bool,
    #[serde(default = "default_app_title")]
    pub app_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
    #[serde(default = "default_caption_interval")]
    pub caption_interval_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
}

fn default_api_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_model() -> String {
    "tngtech/deepseek-r1t2-chimera:free".to_string()
}

const fn default_timeout() -> u64 {
    600
}

fn default_app_title() -> String {
    "AppForge Architect".to_string()
}

const fn default_caption_interval() -> u64 {
    3000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            model: default_model(),
            api_key: None,
            request_timeout: default_timeout(),
            structured_output: false,
            app_title: default_app_title(),
            referer: None,
            caption_interval_ms: default_caption_interval(),
            output_dir: None,
        }
    }
}
