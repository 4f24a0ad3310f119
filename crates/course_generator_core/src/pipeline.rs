//! crates/course_generator_core/src/pipeline.rs
//!
//! Drives the per-lesson and per-module generation calls for a course.
//!
//! Units run strictly one after another in structure order: every lesson of a
//! module, then that module's quiz. A failed or empty unit is replaced by a
//! placeholder body and the run carries on, so one bad call never costs the
//! whole course.

use crate::{
    document::{CourseDocument, CourseDocumentBuilder, LessonSection, QuizSection},
    domain::{
        CourseStructure, GenerationProgress, ModelTier, ProgressUpdate, UnitKind, UnitReport,
    },
    ports::{CompletionError, TextCompletionService},
    prompts,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Body used in place of a lesson whose generation failed.
pub const LESSON_PLACEHOLDER: &str = "Error generating content.";

/// Body used in place of a quiz whose generation failed.
pub const QUIZ_PLACEHOLDER: &str = "Error generating quiz.";

#[derive(Clone)]
pub struct ContentPipeline {
    completion: Arc<dyn TextCompletionService>,
    lesson_model: ModelTier,
    quiz_model: ModelTier,
}

impl ContentPipeline {
    pub fn new(
        completion: Arc<dyn TextCompletionService>,
        lesson_model: ModelTier,
        quiz_model: ModelTier,
    ) -> Self {
        Self {
            completion,
            lesson_model,
            quiz_model,
        }
    }

    /// Generates every lesson and quiz of `structure` and assembles the document.
    ///
    /// `on_progress` is called once per finished unit with a strictly
    /// increasing `completed_units`, the last call carrying
    /// `completed_units == total_units`. The only error is the up-front
    /// readiness check of the completion service; once units start running
    /// the run always completes.
    pub async fn run<F>(
        &self,
        structure: &CourseStructure,
        course_name: &str,
        mut on_progress: F,
    ) -> Result<CourseDocument, CompletionError>
    where
        F: FnMut(&ProgressUpdate) + Send,
    {
        self.completion.ensure_ready()?;

        let mut progress = GenerationProgress {
            total_units: structure.total_units(),
            completed_units: 0,
        };
        info!(
            course = %course_name,
            total_units = progress.total_units,
            "Starting course content generation"
        );

        let mut builder = CourseDocumentBuilder::new(course_name);

        for module in structure.modules() {
            let mut draft = builder.begin_module(&module.name);

            for lesson in &module.lessons {
                let prompt = prompts::lesson_prompt(lesson, &module.name, course_name);
                let (body, placeholder) = self
                    .generate_unit(&prompt, self.lesson_model, LESSON_PLACEHOLDER)
                    .await;
                if placeholder {
                    warn!(module = %module.name, lesson = %lesson, "Lesson replaced by placeholder");
                }

                draft.push_lesson(LessonSection {
                    title: lesson.clone(),
                    body: body.clone(),
                    placeholder,
                });

                progress.completed_units += 1;
                on_progress(&ProgressUpdate {
                    progress,
                    unit: UnitReport {
                        kind: UnitKind::Lesson,
                        module: module.name.clone(),
                        title: lesson.clone(),
                        body,
                        placeholder,
                    },
                });
            }

            let prompt = prompts::quiz_prompt(&draft.to_markdown());
            let (body, placeholder) = self
                .generate_unit(&prompt, self.quiz_model, QUIZ_PLACEHOLDER)
                .await;
            if placeholder {
                warn!(module = %module.name, "Quiz replaced by placeholder");
            }

            builder.push_module(draft.finish(QuizSection {
                body: body.clone(),
                placeholder,
            }));

            progress.completed_units += 1;
            on_progress(&ProgressUpdate {
                progress,
                unit: UnitReport {
                    kind: UnitKind::Quiz,
                    module: module.name.clone(),
                    title: module.name.clone(),
                    body,
                    placeholder,
                },
            });
        }

        debug_assert!(progress.is_complete());
        let document = builder.build();
        info!(
            course = %course_name,
            placeholders = document.placeholder_count(),
            "Course content generation finished"
        );
        Ok(document)
    }

    /// Runs one unit, returning its body and whether it is the placeholder.
    async fn generate_unit(
        &self,
        prompt: &str,
        model: ModelTier,
        placeholder: &str,
    ) -> (String, bool) {
        match self.completion.complete(prompt, model).await {
            Ok(text) if !text.trim().is_empty() => (text, false),
            Ok(_) => (placeholder.to_string(), true),
            Err(e) => {
                warn!("Unit generation failed: {}", e);
                (placeholder.to_string(), true)
            }
        }
    }
}
