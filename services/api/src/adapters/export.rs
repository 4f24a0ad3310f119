//! services/api/src/adapters/export.rs
//!
//! The `DocumentExporter` port implementation. Picks the renderer for the
//! requested format.

use super::{pdf::render_pdf, pptx::render_pptx};
use course_generator_core::{
    document::CourseDocument,
    domain::ExportFormat,
    ports::{DocumentExporter, ExportError},
};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentExportAdapter;

impl DocumentExportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentExporter for DocumentExportAdapter {
    fn export(
        &self,
        document: &CourseDocument,
        format: ExportFormat,
    ) -> Result<Vec<u8>, ExportError> {
        let bytes = match format {
            ExportFormat::Pdf => render_pdf(document)?,
            ExportFormat::Pptx => render_pptx(document)?,
        };
        debug!(
            course = %document.course_name(),
            format = format.extension(),
            bytes = bytes.len(),
            "Rendered course export"
        );
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use course_generator_core::document::{CourseDocumentBuilder, LessonSection, QuizSection};

    fn document() -> CourseDocument {
        let mut builder = CourseDocumentBuilder::new("Intro to X");
        let mut draft = builder.begin_module("Basics");
        draft.push_lesson(LessonSection {
            title: "What is X?".to_string(),
            body: "### What is X?\nX is a thing.".to_string(),
            placeholder: false,
        });
        builder.push_module(draft.finish(QuizSection {
            body: "1. What is X?".to_string(),
            placeholder: false,
        }));
        builder.build()
    }

    #[test]
    fn each_format_gets_its_own_container() {
        let exporter = DocumentExportAdapter::new();

        let pdf = exporter.export(&document(), ExportFormat::Pdf).unwrap();
        let pptx = exporter.export(&document(), ExportFormat::Pptx).unwrap();

        assert!(pdf.starts_with(b"%PDF"));
        // Zip local file header.
        assert!(pptx.starts_with(b"PK\x03\x04"));
    }

    #[test]
    fn empty_document_fails_for_every_format() {
        let exporter = DocumentExportAdapter::new();
        let empty = CourseDocumentBuilder::new("Nothing").build();

        for format in [ExportFormat::Pdf, ExportFormat::Pptx] {
            assert_eq!(
                exporter.export(&empty, format).unwrap_err(),
                ExportError::EmptyDocument
            );
        }
    }
}
