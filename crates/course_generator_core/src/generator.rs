//! crates/course_generator_core/src/generator.rs
//!
//! Wires the three generation stages to one completion service under a
//! single model policy.

use crate::{
    domain::ModelPolicy, extractor::StructureExtractor, outline::OutlineGenerator,
    pipeline::ContentPipeline, ports::TextCompletionService,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct CourseGenerator {
    pub outline: OutlineGenerator,
    pub extractor: StructureExtractor,
    pub pipeline: ContentPipeline,
}

impl CourseGenerator {
    pub fn new(completion: Arc<dyn TextCompletionService>, policy: ModelPolicy) -> Self {
        Self {
            outline: OutlineGenerator::new(completion.clone(), policy.outline),
            extractor: StructureExtractor::new(completion.clone(), policy.structure),
            pipeline: ContentPipeline::new(completion, policy.lesson, policy.quiz),
        }
    }
}
