//! services/api/src/adapters/completion_llm.rs
//!
//! This module contains the adapter for the hosted text-generation model.
//! It implements the `TextCompletionService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use course_generator_core::{
    domain::ModelTier,
    ports::{CompletionError, TextCompletionService},
};
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `TextCompletionService` using OpenAI chat completions.
///
/// Built without an API key it still exists, but every call fails with
/// `MissingCredential` instead of reaching the network.
#[derive(Clone)]
pub struct OpenAiCompletionAdapter {
    client: Option<Client<OpenAIConfig>>,
    fast_model: String,
    quality_model: String,
    temperature: f32,
}

impl OpenAiCompletionAdapter {
    pub fn new(
        api_key: Option<&str>,
        fast_model: String,
        quality_model: String,
        temperature: f32,
    ) -> Self {
        let client = api_key.map(|key| Client::with_config(OpenAIConfig::new().with_api_key(key)));
        Self {
            client,
            fast_model,
            quality_model,
            temperature,
        }
    }

    /// The configured model name serving a tier.
    pub fn model_name(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Fast => &self.fast_model,
            ModelTier::Quality => &self.quality_model,
        }
    }
}

//=========================================================================================
// `TextCompletionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl TextCompletionService for OpenAiCompletionAdapter {
    fn ensure_ready(&self) -> Result<(), CompletionError> {
        match self.client {
            Some(_) => Ok(()),
            None => Err(CompletionError::MissingCredential),
        }
    }

    async fn complete(&self, prompt: &str, model: ModelTier) -> Result<String, CompletionError> {
        let client = self
            .client
            .as_ref()
            .ok_or(CompletionError::MissingCredential)?;
        if prompt.trim().is_empty() {
            return Err(CompletionError::EmptyPrompt);
        }

        let model_name = self.model_name(model);
        debug!(model = %model_name, prompt_chars = prompt.len(), "Requesting completion");

        let messages = vec![ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| CompletionError::Unexpected(e.to_string()))?,
        )];

        let request = CreateChatCompletionRequestArgs::default()
            .model(model_name)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| CompletionError::Unexpected(e.to_string()))?;

        // Map the client error by hand, which respects the orphan rule.
        let response = client
            .chat()
            .create(request)
            .await
            .map_err(classify_error)?;

        // Extract the text content from the first choice in the response.
        response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::Unexpected("The model returned no choices.".to_string()))?
            .message
            .content
            .ok_or(CompletionError::EmptyResponse)
    }
}

fn classify_error(error: OpenAIError) -> CompletionError {
    match error {
        OpenAIError::Reqwest(e) => CompletionError::Transport(e.to_string()),
        OpenAIError::ApiError(api) => classify_api_message(&api.message),
        other => CompletionError::Unexpected(other.to_string()),
    }
}

/// Sorts an error message from the provider into authentication,
/// rate/quota, or anything else.
fn classify_api_message(message: &str) -> CompletionError {
    let lowered = message.to_lowercase();
    if lowered.contains("api key") || lowered.contains("unauthorized") || lowered.contains("authentication") {
        CompletionError::Authentication(message.to_string())
    } else if lowered.contains("rate limit") || lowered.contains("quota") {
        CompletionError::RateLimited(message.to_string())
    } else {
        CompletionError::Unexpected(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(api_key: Option<&str>) -> OpenAiCompletionAdapter {
        OpenAiCompletionAdapter::new(
            api_key,
            "fast-model".to_string(),
            "quality-model".to_string(),
            0.7,
        )
    }

    #[test]
    fn tiers_resolve_to_configured_models() {
        let adapter = adapter(Some("sk-test"));
        assert_eq!(adapter.model_name(ModelTier::Fast), "fast-model");
        assert_eq!(adapter.model_name(ModelTier::Quality), "quality-model");
    }

    #[tokio::test]
    async fn missing_key_fails_deterministically() {
        let adapter = adapter(None);
        assert_eq!(adapter.ensure_ready(), Err(CompletionError::MissingCredential));
        assert_eq!(
            adapter.complete("Write a lesson", ModelTier::Fast).await,
            Err(CompletionError::MissingCredential)
        );
    }

    #[tokio::test]
    async fn empty_prompt_is_rejected_before_any_request() {
        let adapter = adapter(Some("sk-test"));
        assert!(adapter.ensure_ready().is_ok());
        assert_eq!(
            adapter.complete("   ", ModelTier::Quality).await,
            Err(CompletionError::EmptyPrompt)
        );
    }

    #[test]
    fn provider_messages_are_classified() {
        assert!(matches!(
            classify_api_message("Incorrect API key provided: sk-***"),
            CompletionError::Authentication(_)
        ));
        assert!(matches!(
            classify_api_message("Rate limit reached for gpt-4o"),
            CompletionError::RateLimited(_)
        ));
        assert!(matches!(
            classify_api_message("You exceeded your current quota"),
            CompletionError::RateLimited(_)
        ));
        assert!(matches!(
            classify_api_message("The server had an error"),
            CompletionError::Unexpected(_)
        ));
    }
}
