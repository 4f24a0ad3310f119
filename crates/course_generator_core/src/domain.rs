//! crates/course_generator_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any web, storage or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;

/// Largest module count a course request may ask for.
pub const MAX_MODULE_COUNT: u8 = 10;

//=========================================================================================
// Course Request
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudienceLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl fmt::Display for AudienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudienceLevel::Beginner => write!(f, "Beginner"),
            AudienceLevel::Intermediate => write!(f, "Intermediate"),
            AudienceLevel::Advanced => write!(f, "Advanced"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "Easy"),
            Difficulty::Medium => write!(f, "Medium"),
            Difficulty::Hard => write!(f, "Hard"),
        }
    }
}

/// The user-supplied parameters of a course. Immutable once submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseRequest {
    pub name: String,
    pub audience_level: AudienceLevel,
    pub difficulty: Difficulty,
    pub module_count: u8,
    pub duration: String,
    pub credit: String,
}

/// A course request field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid value for {field}: {reason}")]
pub struct InvalidRequest {
    pub field: &'static str,
    pub reason: String,
}

impl CourseRequest {
    /// Checks the request against the limits the course form enforces.
    pub fn validate(&self) -> Result<(), InvalidRequest> {
        let blank = |field: &'static str| InvalidRequest {
            field,
            reason: "must not be blank".to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(blank("name"));
        }
        if self.module_count == 0 || self.module_count > MAX_MODULE_COUNT {
            return Err(InvalidRequest {
                field: "module_count",
                reason: format!(
                    "must be between 1 and {}, got {}",
                    MAX_MODULE_COUNT, self.module_count
                ),
            });
        }
        if self.duration.trim().is_empty() {
            return Err(blank("duration"));
        }
        if self.credit.trim().is_empty() {
            return Err(blank("credit"));
        }
        Ok(())
    }

    /// A one-paragraph summary of the request, used as the user's chat turn.
    pub fn summary(&self) -> String {
        format!(
            "Course '{}' for {} learners, {} difficulty, {} modules over {}, {} credit(s).",
            self.name,
            self.audience_level,
            self.difficulty,
            self.module_count,
            self.duration,
            self.credit
        )
    }
}

//=========================================================================================
// Outline and Structure
//=========================================================================================

/// Free-text course skeleton produced by the model, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outline(String);

impl Outline {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Outline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One module of a course and the ordered names of its lessons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleOutline {
    pub name: String,
    pub lessons: Vec<String>,
}

impl ModuleOutline {
    pub fn new(name: impl Into<String>, lessons: Vec<String>) -> Self {
        Self {
            name: name.into(),
            lessons,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Module '{0}' appears more than once in the course structure")]
pub struct DuplicateModule(pub String);

/// Ordered module→lessons mapping parsed from an outline.
///
/// Module names are unique and keep the order they were given in. Lesson
/// names need not be unique, and a module may have no lessons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseStructure {
    modules: Vec<ModuleOutline>,
}

impl CourseStructure {
    pub fn new(modules: Vec<ModuleOutline>) -> Result<Self, DuplicateModule> {
        for (index, module) in modules.iter().enumerate() {
            if modules[..index].iter().any(|m| m.name == module.name) {
                return Err(DuplicateModule(module.name.clone()));
            }
        }
        Ok(Self { modules })
    }

    pub fn modules(&self) -> &[ModuleOutline] {
        &self.modules
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn lesson_count(&self) -> usize {
        self.modules.iter().map(|m| m.lessons.len()).sum()
    }

    /// One unit per lesson plus one quiz unit per module.
    pub fn total_units(&self) -> usize {
        self.lesson_count() + self.module_count()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

//=========================================================================================
// Model Selection
//=========================================================================================

/// The enumerated set of models a completion may be requested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelTier {
    /// Cheap and fast; used for parsing and quizzes.
    Fast,
    /// Higher quality; used for the outline and lesson bodies.
    Quality,
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelTier::Fast => write!(f, "fast"),
            ModelTier::Quality => write!(f, "quality"),
        }
    }
}

/// Which tier serves each kind of call in a course run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelPolicy {
    pub outline: ModelTier,
    pub structure: ModelTier,
    pub lesson: ModelTier,
    pub quiz: ModelTier,
}

impl Default for ModelPolicy {
    fn default() -> Self {
        Self {
            outline: ModelTier::Quality,
            structure: ModelTier::Fast,
            lesson: ModelTier::Quality,
            quiz: ModelTier::Fast,
        }
    }
}

//=========================================================================================
// Progress Reporting
//=========================================================================================

/// Position of a run over its known-size list of units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationProgress {
    pub total_units: usize,
    pub completed_units: usize,
}

impl GenerationProgress {
    pub fn is_complete(&self) -> bool {
        self.completed_units == self.total_units
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Lesson,
    Quiz,
}

/// The unit that has just finished, as shown to whoever observes the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitReport {
    pub kind: UnitKind,
    pub module: String,
    /// Lesson name, or the module name for a quiz.
    pub title: String,
    pub body: String,
    /// True when the body is the placeholder substituted for a failed call.
    pub placeholder: bool,
}

/// Emitted to the progress callback once per finished unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub progress: GenerationProgress,
    pub unit: UnitReport,
}

//=========================================================================================
// Chat History and Export
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

/// A single persisted chat turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Pptx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Pptx => "pptx",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Pptx => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
        }
    }

    /// Download name for a course, e.g. `Intro_to_Python_Course.pdf`.
    pub fn file_name(&self, course_name: &str) -> String {
        format!("{}_Course.{}", course_name.replace(' ', "_"), self.extension())
    }
}
