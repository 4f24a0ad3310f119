//! crates/course_generator_core/src/extractor.rs
//!
//! Turns a free-text outline into a `CourseStructure`.
//!
//! The model is asked for a module→lessons JSON object, but its answer is free
//! text and is treated as untrusted: code fences are stripped, the remainder is
//! parsed, and the parsed value must be an object of string arrays. Anything
//! else is a typed `ParseError`; nothing is guessed.

use crate::{
    domain::{CourseStructure, ModelTier, ModuleOutline, Outline},
    ports::{CompletionError, TextCompletionService},
    prompts,
};
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Structure completion failed: {0}")]
    Completion(#[from] CompletionError),
    #[error("The structure response was empty")]
    Empty,
    #[error("The structure response is not valid JSON: {cause}")]
    InvalidJson { raw_text: String, cause: String },
    #[error("The structure response is not a module to lesson-list mapping: {cause}")]
    InvalidShape { raw_text: String, cause: String },
}

impl ParseError {
    /// The model text that failed to parse, when there was any.
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            ParseError::InvalidJson { raw_text, .. } | ParseError::InvalidShape { raw_text, .. } => {
                Some(raw_text)
            }
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct StructureExtractor {
    completion: Arc<dyn TextCompletionService>,
    model: ModelTier,
}

impl StructureExtractor {
    pub fn new(completion: Arc<dyn TextCompletionService>, model: ModelTier) -> Self {
        Self { completion, model }
    }

    pub async fn extract_structure(&self, outline: &Outline) -> Result<CourseStructure, ParseError> {
        info!(model = %self.model, "Extracting course structure from outline");

        let prompt = prompts::structure_prompt(outline);
        let raw = self.completion.complete(&prompt, self.model).await?;

        let structure = parse_course_structure(&raw).inspect_err(|e| {
            warn!("Could not parse course structure: {}", e);
        })?;

        info!(
            modules = structure.module_count(),
            lessons = structure.lesson_count(),
            "Course structure extracted"
        );
        Ok(structure)
    }
}

/// Removes the literal markdown fence markers a model tends to wrap JSON in.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "")
}

/// Parses and validates a model response as an ordered module→lessons object.
pub fn parse_course_structure(raw: &str) -> Result<CourseStructure, ParseError> {
    let cleaned = strip_code_fences(raw);
    let text = cleaned.trim();
    if text.is_empty() {
        return Err(ParseError::Empty);
    }

    let value: Value = serde_json::from_str(text).map_err(|e| ParseError::InvalidJson {
        raw_text: raw.to_string(),
        cause: e.to_string(),
    })?;

    let shape_error = |cause: String| ParseError::InvalidShape {
        raw_text: raw.to_string(),
        cause,
    };

    if !value.is_object() {
        return Err(shape_error(format!(
            "expected a JSON object, found {}",
            json_kind(&value)
        )));
    }

    // A `Value` map keeps only the last of repeated keys; read the entries
    // again in source order so a repeated module reaches the duplicate check.
    let ModuleEntries(entries) =
        serde_json::from_str(text).map_err(|e: serde_json::Error| shape_error(e.to_string()))?;

    let mut modules = Vec::with_capacity(entries.len());
    for (module, lessons) in entries {
        let Value::Array(items) = lessons else {
            return Err(shape_error(format!(
                "lessons of module '{}' must be an array, found {}",
                module,
                json_kind(&lessons)
            )));
        };

        let mut names = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::String(name) => names.push(name),
                other => {
                    return Err(shape_error(format!(
                        "lesson names of module '{}' must be strings, found {}",
                        module,
                        json_kind(&other)
                    )))
                }
            }
        }
        modules.push(ModuleOutline::new(module, names));
    }

    CourseStructure::new(modules).map_err(|e| shape_error(e.to_string()))
}

/// Every key/value pair of a JSON object, in source order, repeats included.
struct ModuleEntries(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for ModuleEntries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = ModuleEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A>(self, mut map: A) -> Result<ModuleEntries, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, serde_json::Value>()? {
                    entries.push(entry);
                }
                Ok(ModuleEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
