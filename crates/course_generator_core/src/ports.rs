//! crates/course_generator_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the hosted model, the export renderers and the history file.

use crate::document::CourseDocument;
use crate::domain::{ChatTurn, ExportFormat, ModelTier};
use async_trait::async_trait;

//=========================================================================================
// Port Error and Result Types
//=========================================================================================

/// Failure of a single call to the hosted text-generation model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    #[error("No API credential is configured for the completion service")]
    MissingCredential,
    #[error("Refusing to send an empty prompt")]
    EmptyPrompt,
    #[error("The model returned an empty response")]
    EmptyResponse,
    #[error("Authentication with the completion service failed: {0}")]
    Authentication(String),
    #[error("Completion service rate limit or quota exceeded: {0}")]
    RateLimited(String),
    #[error("Could not reach the completion service: {0}")]
    Transport(String),
    #[error("An unexpected completion error occurred: {0}")]
    Unexpected(String),
}

/// Failure to render a course document into a downloadable artifact.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExportError {
    #[error("The course document has no content to export")]
    EmptyDocument,
    #[error("Rendering the {format} failed: {reason}")]
    Render { format: &'static str, reason: String },
}

/// Failure of the chat-history store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("History store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("History store contents are corrupt: {0}")]
    Corrupt(String),
}

/// A convenience type alias for `Result<T, StoreError>`.
pub type StoreResult<T> = Result<T, StoreError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait TextCompletionService: Send + Sync {
    /// Fails with `MissingCredential` when the service cannot issue calls at all.
    fn ensure_ready(&self) -> Result<(), CompletionError> {
        Ok(())
    }

    /// Sends one prompt to the model behind `model` and returns its text.
    /// Every call is billable and is never retried here.
    async fn complete(&self, prompt: &str, model: ModelTier) -> Result<String, CompletionError>;
}

#[async_trait]
pub trait ChatHistoryStore: Send + Sync {
    async fn load_history(&self) -> StoreResult<Vec<ChatTurn>>;

    /// Replaces the stored history wholesale.
    async fn save_history(&self, turns: &[ChatTurn]) -> StoreResult<()>;

    /// Adds `turns` after the stored history as one step, so concurrent
    /// appends never lose each other's turns.
    async fn append_history(&self, turns: &[ChatTurn]) -> StoreResult<()>;

    async fn clear_history(&self) -> StoreResult<()> {
        self.save_history(&[]).await
    }
}

pub trait DocumentExporter: Send + Sync {
    /// Renders a finished document into the bytes of a downloadable file.
    fn export(&self, document: &CourseDocument, format: ExportFormat) -> Result<Vec<u8>, ExportError>;
}
