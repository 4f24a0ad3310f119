//! crates/course_generator_core/src/outline.rs
//!
//! Turns a course request into a free-text outline with a single model call.

use crate::{
    domain::{CourseRequest, ModelTier, Outline},
    ports::{CompletionError, TextCompletionService},
    prompts,
};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct OutlineGenerator {
    completion: Arc<dyn TextCompletionService>,
    model: ModelTier,
}

impl OutlineGenerator {
    pub fn new(completion: Arc<dyn TextCompletionService>, model: ModelTier) -> Self {
        Self { completion, model }
    }

    /// Returns the model's outline verbatim. Completion failures propagate
    /// unchanged; an empty answer is reported as `EmptyResponse`.
    pub async fn generate_outline(&self, request: &CourseRequest) -> Result<Outline, CompletionError> {
        info!(course = %request.name, model = %self.model, "Generating course outline");

        let prompt = prompts::outline_prompt(request);
        let text = self.completion.complete(&prompt, self.model).await?;
        if text.trim().is_empty() {
            return Err(CompletionError::EmptyResponse);
        }
        Ok(Outline::new(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AudienceLevel, Difficulty};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingClient {
        reply: Result<String, CompletionError>,
        calls: Mutex<Vec<(String, ModelTier)>>,
    }

    #[async_trait]
    impl TextCompletionService for RecordingClient {
        async fn complete(&self, prompt: &str, model: ModelTier) -> Result<String, CompletionError> {
            self.calls.lock().unwrap().push((prompt.to_string(), model));
            self.reply.clone()
        }
    }

    fn request() -> CourseRequest {
        CourseRequest {
            name: "Intro to X".to_string(),
            audience_level: AudienceLevel::Beginner,
            difficulty: Difficulty::Easy,
            module_count: 1,
            duration: "1 Week".to_string(),
            credit: "1".to_string(),
        }
    }

    #[tokio::test]
    async fn outline_is_returned_verbatim_from_the_configured_tier() {
        let client = Arc::new(RecordingClient {
            reply: Ok("  | Module | Lesson |\n".to_string()),
            calls: Mutex::new(Vec::new()),
        });
        let generator = OutlineGenerator::new(client.clone(), ModelTier::Quality);

        let outline = generator.generate_outline(&request()).await.unwrap();

        assert_eq!(outline.as_str(), "  | Module | Lesson |\n");
        let calls = client.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, ModelTier::Quality);
        assert!(calls[0].0.contains("Topic: Intro to X"));
    }

    #[tokio::test]
    async fn completion_failure_propagates_unchanged() {
        let client = Arc::new(RecordingClient {
            reply: Err(CompletionError::RateLimited("quota".to_string())),
            calls: Mutex::new(Vec::new()),
        });
        let generator = OutlineGenerator::new(client, ModelTier::Quality);

        let err = generator.generate_outline(&request()).await.unwrap_err();
        assert_eq!(err, CompletionError::RateLimited("quota".to_string()));
    }

    #[tokio::test]
    async fn blank_outline_is_an_empty_response() {
        let client = Arc::new(RecordingClient {
            reply: Ok(" \n ".to_string()),
            calls: Mutex::new(Vec::new()),
        });
        let generator = OutlineGenerator::new(client, ModelTier::Fast);

        let err = generator.generate_outline(&request()).await.unwrap_err();
        assert_eq!(err, CompletionError::EmptyResponse);
    }
}
