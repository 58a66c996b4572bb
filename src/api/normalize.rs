// Cleanup and validation of raw model output

use regex::Regex;
use std::sync::LazyLock;

use super::GenerationError;
use crate::models::GeneratedApp;

static REASONING_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<thought>.*?</thought>|<think>.*?</think>").expect("reasoning pattern is valid")
});

// Only a fence wrapping the whole payload is removed; fences inside JSON
// string values (README code blocks) are file content.
static LEADING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\A\s*```(?:json)?\s*").expect("fence pattern is valid"));

static TRAILING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*```\s*\z").expect("fence pattern is valid"));

/// Remove reasoning blocks and the markdown fence that models tend to wrap
/// around the JSON payload.
pub fn strip_wrappers(text: &str) -> String {
    let without_reasoning = REASONING_BLOCK.replace_all(text, "");
    let without_leading = LEADING_FENCE.replace(&without_reasoning, "");
    TRAILING_FENCE
        .replace(&without_leading, "")
        .trim()
        .to_string()
}

/// Parse raw model output into a validated `GeneratedApp`.
pub fn parse_generated_app(text: &str) -> Result<GeneratedApp, GenerationError> {
    let cleaned = strip_wrappers(text);

    let app: GeneratedApp = serde_json::from_str(&cleaned).map_err(|e| {
        tracing::warn!(length = cleaned.len(), error = %e, "Model output is not a valid project document");
        GenerationError::InvalidFormat(e.to_string())
    })?;

    app.validate().map_err(|detail| {
        tracing::warn!(%detail, "Model output failed project validation");
        GenerationError::InvalidFormat(detail)
    })?;

    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ErrorKind;

    const PAYLOAD: &str = r#"{"name":"X","description":"d","files":[{"path":"a.txt","content":"hi","language":"text"}]}"#;

    #[test]
    fn test_strip_wrappers_leaves_plain_json_alone() {
        assert_eq!(strip_wrappers(PAYLOAD), PAYLOAD);
    }

    #[test]
    fn test_strip_wrappers_removes_json_fence() {
        let fenced = format!("```json\n{PAYLOAD}\n```");
        assert_eq!(strip_wrappers(&fenced), PAYLOAD);
    }

    #[test]
    fn test_strip_wrappers_removes_bare_fence() {
        let fenced = format!("```\n{PAYLOAD}\n```\n");
        assert_eq!(strip_wrappers(&fenced), PAYLOAD);
    }

    #[test]
    fn test_strip_wrappers_removes_reasoning_blocks() {
        let wrapped = format!(
            "<thought>\nThe user wants a file.\nLet me plan.\n</thought>\n<think>more</think>{PAYLOAD}"
        );
        assert_eq!(strip_wrappers(&wrapped), PAYLOAD);
    }

    #[test]
    fn test_fences_inside_file_content_are_preserved() {
        let payload = r#"{"name":"X","description":"d","files":[{"path":"README.md","content":"Run:\n```bash\nnpm i\n```","language":"markdown"}]}"#;

        assert_eq!(strip_wrappers(payload), payload);

        let plain = parse_generated_app(payload).unwrap();
        let fenced = parse_generated_app(&format!("```json\n{payload}\n```")).unwrap();
        assert_eq!(plain, fenced);
        assert_eq!(plain.files[0].content, "Run:\n```bash\nnpm i\n```");
    }

    #[test]
    fn test_wrapped_and_unwrapped_parse_identically() {
        let plain = parse_generated_app(PAYLOAD).unwrap();
        let fenced = parse_generated_app(&format!("```json\n{PAYLOAD}\n```")).unwrap();
        let thought = parse_generated_app(&format!("<thought>plan</thought>\n```json\n{PAYLOAD}\n```")).unwrap();

        assert_eq!(plain, fenced);
        assert_eq!(plain, thought);
        assert_eq!(plain.name, "X");
        assert_eq!(plain.files[0].path, "a.txt");
        assert_eq!(plain.files[0].content, "hi");
    }

    #[test]
    fn test_truncated_json_is_invalid_format() {
        let err = parse_generated_app(r#"{"name":"X""#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn test_missing_required_field_is_invalid_format() {
        let err = parse_generated_app(r#"{"name":"X","description":"d","files":[{"path":"a.txt","content":"hi"}]}"#)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
        assert!(err.to_string().contains("language"));
    }

    #[test]
    fn test_empty_file_list_is_invalid_format() {
        let err = parse_generated_app(r#"{"name":"X","description":"d","files":[]}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
    }

    #[test]
    fn test_only_wrappers_is_invalid_format() {
        let err = parse_generated_app("<thought>nothing useful</thought>```json\n```").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
    }
}
