pub mod completion_llm;
pub mod export;
pub mod history_store;
pub mod pdf;
pub mod pptx;

pub use completion_llm::OpenAiCompletionAdapter;
pub use export::DocumentExportAdapter;
pub use history_store::JsonFileHistoryStore;
