// Chat-completions client for project generation

pub mod normalize;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::models::{AppConfig, GeneratedApp};

const SYSTEM_INSTRUCTION: &str = r#"You are a world-class Full-Stack Project Architect.
Your goal is to generate a complete, working web application.

OUTPUT FORMAT:
You must return ONLY a raw JSON object. Do not include markdown formatting like ```json.
The JSON must exactly match this structure:
{
  "name": "App Name",
  "description": "App Description",
  "tree": "Visual ASCII file tree",
  "files": [
    { "path": "index.html", "content": "...", "language": "html" },
    { "path": "api/server.js", "content": "...", "language": "javascript" },
    { "path": "package.json", "content": "...", "language": "json" },
    { "path": "vercel.json", "content": "...", "language": "json" }
  ]
}

ARCHITECTURE RULES:
1. Frontend must be in the root (index.html, styles.css, etc.).
2. Backend logic must be in the 'api/' directory for Vercel Serverless compatibility.
3. Frontend MUST fetch from '/api/filename' to interact with the backend.
4. Include all necessary config files (package.json, vercel.json).
5. Ensure the code is production-ready and fully functional."#;

const TRANSPORT_FALLBACK: &str = "Failed to communicate with the generation service";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    EmptyResponse,
    InvalidFormat,
}

/// Failure of a single generation call. `Display` is the message shown to the user.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("{0}")]
    Transport(String),
    #[error("The model returned an empty response.")]
    EmptyResponse,
    #[error("The model returned an invalid format ({0}). Please refine your request.")]
    InvalidFormat(String),
}

impl GenerationError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) => ErrorKind::Transport,
            Self::EmptyResponse => ErrorKind::EmptyResponse,
            Self::InvalidFormat(_) => ErrorKind::InvalidFormat,
        }
    }

    /// Whether pressing retry with the same prompt has a reasonable chance of
    /// succeeding. Format problems usually need a different prompt.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::EmptyResponse)
    }
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub response_format: Value,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub error: Option<ProviderError>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProviderError {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ProviderError>,
}

/// JSON schema every generated project must satisfy.
pub fn response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": { "type": "string" },
            "description": { "type": "string" },
            "tree": { "type": "string" },
            "files": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "path": { "type": "string" },
                        "content": { "type": "string" },
                        "language": { "type": "string" }
                    },
                    "required": ["path", "content", "language"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["name", "description", "files"],
        "additionalProperties": false
    })
}

#[derive(Debug, Clone)]
pub struct GenerationClient {
    base_url: String,
    api_key: String,
    model: String,
    app_title: String,
    referer: Option<String>,
    structured_output: bool,
    client: Client,
}

impl GenerationClient {
    pub fn new(config: &AppConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            app_title: config.app_title.clone(),
            referer: config.referer.clone(),
            structured_output: config.structured_output,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn build_request(&self, prompt: &str) -> ChatRequest {
        let response_format = if self.structured_output {
            json!({
                "type": "json_schema",
                "json_schema": {
                    "name": "generated_app",
                    "strict": true,
                    "schema": response_schema()
                }
            })
        } else {
            json!({ "type": "json_object" })
        };

        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_INSTRUCTION.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            response_format,
        }
    }

    /// Issue exactly one generation request and normalize its outcome.
    pub async fn generate(&self, prompt: &str) -> Result<GeneratedApp, GenerationError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = self.build_request(prompt);

        tracing::info!(model = %self.model, prompt_len = prompt.len(), "Sending generation request");

        let mut builder = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("X-Title", &self.app_title)
            .json(&request);
        if let Some(referer) = &self.referer {
            builder = builder.header("HTTP-Referer", referer);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(error = %e, "Generation request failed to send");
            GenerationError::Transport(format!("{TRANSPORT_FALLBACK}: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .ok()
                .and_then(|envelope| envelope.error)
                .and_then(|error| error.message)
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| format!("{TRANSPORT_FALLBACK} (HTTP {status})."));
            tracing::warn!(%status, %message, "Generation request rejected");
            return Err(GenerationError::Transport(message));
        }

        let body = response.json::<ChatResponse>().await.map_err(|e| {
            tracing::warn!(error = %e, "Generation response body could not be decoded");
            GenerationError::Transport(format!("{TRANSPORT_FALLBACK}: unexpected response body."))
        })?;

        let app = Self::extract_app(body)?;
        tracing::info!(name = %app.name, files = app.files.len(), "Generation succeeded");
        Ok(app)
    }

    fn extract_app(body: ChatResponse) -> Result<GeneratedApp, GenerationError> {
        if let Some(message) = body.error.and_then(|error| error.message) {
            tracing::warn!(%message, "Provider reported an error in a successful response");
            return Err(GenerationError::Transport(message));
        }

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                tracing::warn!("Provider returned no content");
                GenerationError::EmptyResponse
            })?;

        normalize::parse_generated_app(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAYLOAD: &str = r#"{"name":"X","description":"d","files":[{"path":"a.txt","content":"hi","language":"text"}]}"#;

    fn client_for(server: &MockServer) -> GenerationClient {
        let config = AppConfig {
            api_url: format!("{}/api/v1", server.uri()),
            request_timeout: 5,
            ..Default::default()
        };
        GenerationClient::new(&config, "test-key".to_string()).unwrap()
    }

    fn completion(content: &str) -> Value {
        json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })
    }

    #[test]
    fn test_client_creation() {
        let client = GenerationClient::new(&AppConfig::default(), "key".to_string());
        assert!(client.is_ok());
        assert_eq!(client.unwrap().model(), "tngtech/deepseek-r1t2-chimera:free");
    }

    #[test]
    fn test_build_request_uses_json_mode_by_default() {
        let client = GenerationClient::new(&AppConfig::default(), "key".to_string()).unwrap();
        let request = client.build_request("A todo app");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["messages"][0]["role"], "system");
        assert!(json["messages"][0]["content"].as_str().unwrap().contains("vercel.json"));
        assert_eq!(json["messages"][1]["content"], "A todo app");
    }

    #[test]
    fn test_build_request_with_structured_output() {
        let config = AppConfig {
            structured_output: true,
            ..Default::default()
        };
        let client = GenerationClient::new(&config, "key".to_string()).unwrap();
        let json = serde_json::to_value(client.build_request("x")).unwrap();

        assert_eq!(json["response_format"]["type"], "json_schema");
        let schema = &json["response_format"]["json_schema"]["schema"];
        assert_eq!(schema["required"], json!(["name", "description", "files"]));
        assert_eq!(
            schema["properties"]["files"]["items"]["required"],
            json!(["path", "content", "language"])
        );
    }

    #[test]
    fn test_error_kinds_and_retryability() {
        assert!(GenerationError::Transport("x".to_string()).is_retryable());
        assert!(GenerationError::EmptyResponse.is_retryable());
        let format = GenerationError::InvalidFormat("bad".to_string());
        assert!(!format.is_retryable());
        assert_eq!(format.kind(), ErrorKind::InvalidFormat);
        assert!(format.to_string().contains("refine"));
    }

    #[tokio::test]
    async fn test_generate_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(header("x-title", "AppForge Architect"))
            .and(body_partial_json(json!({ "response_format": { "type": "json_object" } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(PAYLOAD)))
            .expect(1)
            .mount(&server)
            .await;

        let app = assert_ok!(client_for(&server).generate("make it").await);
        assert_eq!(app.name, "X");
        assert_eq!(app.files.len(), 1);
        assert_eq!(app.files[0].path, "a.txt");
    }

    #[tokio::test]
    async fn test_generate_strips_wrapped_content() {
        let server = MockServer::start().await;
        let wrapped = format!("<thought>planning</thought>\n```json\n{PAYLOAD}\n```");

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(&wrapped)))
            .expect(1)
            .mount(&server)
            .await;

        let app = assert_ok!(client_for(&server).generate("make it").await);
        assert_eq!(app.files[0].content, "hi");
    }

    #[tokio::test]
    async fn test_http_error_uses_provider_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_json(json!({ "error": { "message": "Rate limit exceeded", "code": 429 } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = assert_err!(client_for(&server).generate("x").await);
        assert_eq!(err, GenerationError::Transport("Rate limit exceeded".to_string()));
    }

    #[tokio::test]
    async fn test_http_error_without_body_uses_fallback() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .expect(1)
            .mount(&server)
            .await;

        let err = assert_err!(client_for(&server).generate("x").await);
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.to_string().contains("502"));
    }

    #[tokio::test]
    async fn test_error_object_in_success_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "error": { "message": "Provider overloaded" } })),
            )
            .mount(&server)
            .await;

        let err = assert_err!(client_for(&server).generate("x").await);
        assert_eq!(err, GenerationError::Transport("Provider overloaded".to_string()));
    }

    #[tokio::test]
    async fn test_empty_content_is_empty_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("   ")))
            .mount(&server)
            .await;

        let err = assert_err!(client_for(&server).generate("x").await);
        assert_eq!(err, GenerationError::EmptyResponse);
    }

    #[tokio::test]
    async fn test_missing_choices_is_empty_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let err = assert_err!(client_for(&server).generate("x").await);
        assert_eq!(err.kind(), ErrorKind::EmptyResponse);
    }

    #[tokio::test]
    async fn test_malformed_json_is_invalid_format() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(r#"{"name":"X""#)))
            .mount(&server)
            .await;

        let err = assert_err!(client_for(&server).generate("x").await);
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
    }

    #[tokio::test]
    async fn test_non_json_body_is_transport_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = assert_err!(client_for(&server).generate("x").await);
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let config = AppConfig {
            api_url: "http://127.0.0.1:1".to_string(),
            request_timeout: 2,
            ..Default::default()
        };
        let client = GenerationClient::new(&config, "k".to_string()).unwrap();

        let err = assert_err!(client.generate("x").await);
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.to_string().starts_with(TRANSPORT_FALLBACK));
    }
}
