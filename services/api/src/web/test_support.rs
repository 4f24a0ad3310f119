//! Fakes shared by the web-layer tests.

use crate::{
    adapters::{DocumentExportAdapter, JsonFileHistoryStore},
    config::Config,
    web::state::AppState,
};
use async_trait::async_trait;
use course_generator_core::{
    AudienceLevel, CompletionError, CourseGenerator, CourseRequest, Difficulty, ModelPolicy,
    ModelTier, TextCompletionService,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::Notify;

/// Holds the first lesson call open until the test releases it.
#[derive(Default)]
pub struct LessonGate {
    pub started: Notify,
    pub release: Notify,
    armed: AtomicBool,
}

impl LessonGate {
    pub fn armed() -> Arc<Self> {
        let gate = Self::default();
        gate.armed.store(true, Ordering::SeqCst);
        Arc::new(gate)
    }
}

/// Answers each stage by recognising its prompt.
#[derive(Default)]
pub struct CourseClient {
    outline_calls: AtomicUsize,
    gate: Option<Arc<LessonGate>>,
}

impl CourseClient {
    pub fn gated(gate: Arc<LessonGate>) -> Self {
        Self {
            outline_calls: AtomicUsize::new(0),
            gate: Some(gate),
        }
    }
}

#[async_trait]
impl TextCompletionService for CourseClient {
    async fn complete(&self, prompt: &str, _model: ModelTier) -> Result<String, CompletionError> {
        if prompt.contains("User Input Topic:") {
            let draft = self.outline_calls.fetch_add(1, Ordering::SeqCst) + 1;
            return Ok(format!("| Module | Lesson |\n| Basics | What is X? | draft {}", draft));
        }
        if prompt.contains("Course Outline:") {
            return Ok("```json\n{\"Basics\": [\"What is X?\", \"Why X?\"]}\n```".to_string());
        }
        if prompt.contains("Module Content:") {
            return Ok("1. What is X?\n   A. A thing".to_string());
        }
        if let Some(gate) = &self.gate {
            if gate.armed.swap(false, Ordering::SeqCst) {
                gate.started.notify_one();
                gate.release.notified().await;
            }
        }
        Ok("X is a thing worth learning.".to_string())
    }
}

/// A client with no credential configured.
pub struct UnconfiguredClient;

#[async_trait]
impl TextCompletionService for UnconfiguredClient {
    fn ensure_ready(&self) -> Result<(), CompletionError> {
        Err(CompletionError::MissingCredential)
    }

    async fn complete(&self, _prompt: &str, _model: ModelTier) -> Result<String, CompletionError> {
        Err(CompletionError::MissingCredential)
    }
}

pub fn app_state(client: Arc<dyn TextCompletionService>, dir: &TempDir) -> Arc<AppState> {
    let config = Config::from_lookup(|_| None).expect("default config is valid");
    Arc::new(AppState::new(
        Arc::new(config),
        Arc::new(CourseGenerator::new(client, ModelPolicy::default())),
        Arc::new(DocumentExportAdapter::new()),
        Arc::new(JsonFileHistoryStore::new(dir.path().join("history.json"))),
    ))
}

pub fn request() -> CourseRequest {
    CourseRequest {
        name: "Intro to X".to_string(),
        audience_level: AudienceLevel::Beginner,
        difficulty: Difficulty::Easy,
        module_count: 1,
        duration: "1 Week".to_string(),
        credit: "1".to_string(),
    }
}
