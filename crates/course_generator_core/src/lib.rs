pub mod document;
pub mod domain;
pub mod extractor;
pub mod generator;
pub mod outline;
pub mod pipeline;
pub mod ports;
pub mod prompts;
pub mod session;

pub use document::{CourseDocument, CourseDocumentBuilder, LessonSection, ModuleSection, QuizSection};
pub use domain::{
    AudienceLevel, ChatRole, ChatTurn, CourseRequest, CourseStructure, Difficulty, ExportFormat,
    GenerationProgress, InvalidRequest, ModelPolicy, ModelTier, ModuleOutline, Outline,
    ProgressUpdate, UnitKind, UnitReport,
};
pub use extractor::{ParseError, StructureExtractor};
pub use generator::CourseGenerator;
pub use outline::OutlineGenerator;
pub use pipeline::ContentPipeline;
pub use ports::{
    ChatHistoryStore, CompletionError, DocumentExporter, ExportError, StoreError, StoreResult,
    TextCompletionService,
};
pub use session::{CourseSession, CourseStage, SessionError};
