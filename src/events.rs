// Event types for async communication

use crate::api::GenerationError;
use crate::models::GeneratedApp;

#[allow(clippy::enum_variant_names)]
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The in-flight generation produced a project
    GenerationSucceeded(GeneratedApp),
    /// The in-flight generation failed
    GenerationFailed { message: String, retryable: bool },
}

impl From<Result<GeneratedApp, GenerationError>> for AppEvent {
    fn from(result: Result<GeneratedApp, GenerationError>) -> Self {
        match result {
            Ok(app) => Self::GenerationSucceeded(app),
            Err(error) => {
                tracing::debug!(kind = ?error.kind(), "Generation finished with an error");
                Self::GenerationFailed {
                    message: error.to_string(),
                    retryable: error.is_retryable(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_carries_user_message() {
        let event = AppEvent::from(Err(GenerationError::EmptyResponse));
        match event {
            AppEvent::GenerationFailed { message, retryable } => {
                assert_eq!(message, "The model returned an empty response.");
                assert!(retryable);
            }
            AppEvent::GenerationSucceeded(_) => panic!("expected failure"),
        }
    }
}
