//! crates/course_generator_core/src/session.rs
//!
//! The state of one course as it moves through its stages:
//! request → outline → structure → document.
//!
//! Each stage is derived from the one before it. Replacing a stage discards
//! everything downstream and bumps the session revision, so a document that
//! was generated from replaced inputs can be recognised and dropped.

use crate::{
    document::CourseDocument,
    domain::{CourseRequest, CourseStructure, Outline},
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseStage {
    Requested,
    Outlined,
    Structured,
    Generated,
}

impl CourseStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseStage::Requested => "requested",
            CourseStage::Outlined => "outlined",
            CourseStage::Structured => "structured",
            CourseStage::Generated => "generated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("The course has no outline yet")]
    MissingOutline,
    #[error("The course has no structure yet")]
    MissingStructure,
    #[error("The course has not been generated yet")]
    MissingDocument,
    #[error("The result was produced for revision {produced_for} but the course is at revision {current}")]
    StaleRevision { produced_for: u64, current: u64 },
}

#[derive(Debug, Clone)]
pub struct CourseSession {
    pub id: Uuid,
    pub request: CourseRequest,
    outline: Option<Outline>,
    structure: Option<CourseStructure>,
    document: Option<CourseDocument>,
    revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CourseSession {
    pub fn new(request: CourseRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            request,
            outline: None,
            structure: None,
            document: None,
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn stage(&self) -> CourseStage {
        if self.document.is_some() {
            CourseStage::Generated
        } else if self.structure.is_some() {
            CourseStage::Structured
        } else if self.outline.is_some() {
            CourseStage::Outlined
        } else {
            CourseStage::Requested
        }
    }

    /// Incremented every time a stage is replaced.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn outline(&self) -> Option<&Outline> {
        self.outline.as_ref()
    }

    pub fn structure(&self) -> Option<&CourseStructure> {
        self.structure.as_ref()
    }

    pub fn document(&self) -> Option<&CourseDocument> {
        self.document.as_ref()
    }

    pub fn require_outline(&self) -> Result<&Outline, SessionError> {
        self.outline.as_ref().ok_or(SessionError::MissingOutline)
    }

    pub fn require_structure(&self) -> Result<&CourseStructure, SessionError> {
        self.structure.as_ref().ok_or(SessionError::MissingStructure)
    }

    pub fn require_document(&self) -> Result<&CourseDocument, SessionError> {
        self.document.as_ref().ok_or(SessionError::MissingDocument)
    }

    /// Replaces the outline and discards the structure and document.
    pub fn set_outline(&mut self, outline: Outline) {
        self.outline = Some(outline);
        self.structure = None;
        self.document = None;
        self.touch();
    }

    /// Replaces the structure and discards the document.
    pub fn set_structure(&mut self, structure: CourseStructure) -> Result<(), SessionError> {
        self.require_outline()?;
        self.structure = Some(structure);
        self.document = None;
        self.touch();
        Ok(())
    }

    /// Stores a document generated while the session was at `produced_for`.
    /// A document for an older revision is rejected.
    pub fn set_document(
        &mut self,
        produced_for: u64,
        document: CourseDocument,
    ) -> Result<(), SessionError> {
        if produced_for != self.revision {
            return Err(SessionError::StaleRevision {
                produced_for,
                current: self.revision,
            });
        }
        self.require_structure()?;
        self.document = Some(document);
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.revision += 1;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        document::CourseDocumentBuilder,
        domain::{AudienceLevel, Difficulty, ModuleOutline},
    };

    fn session() -> CourseSession {
        CourseSession::new(CourseRequest {
            name: "Intro to X".to_string(),
            audience_level: AudienceLevel::Beginner,
            difficulty: Difficulty::Easy,
            module_count: 1,
            duration: "1 Week".to_string(),
            credit: "1".to_string(),
        })
    }

    fn structure() -> CourseStructure {
        CourseStructure::new(vec![ModuleOutline::new("M1", vec!["L1".into()])]).unwrap()
    }

    #[test]
    fn stages_advance_in_order() {
        let mut session = session();
        assert_eq!(session.stage(), CourseStage::Requested);

        session.set_outline(Outline::new("outline"));
        assert_eq!(session.stage(), CourseStage::Outlined);

        session.set_structure(structure()).unwrap();
        assert_eq!(session.stage(), CourseStage::Structured);

        let revision = session.revision();
        session
            .set_document(revision, CourseDocumentBuilder::new("Intro to X").build())
            .unwrap();
        assert_eq!(session.stage(), CourseStage::Generated);
    }

    #[test]
    fn structure_requires_an_outline() {
        let mut session = session();
        assert_eq!(
            session.set_structure(structure()).unwrap_err(),
            SessionError::MissingOutline
        );
    }

    #[test]
    fn new_outline_discards_downstream_stages() {
        let mut session = session();
        session.set_outline(Outline::new("first"));
        session.set_structure(structure()).unwrap();

        session.set_outline(Outline::new("second"));

        assert_eq!(session.outline().unwrap().as_str(), "second");
        assert!(session.structure().is_none());
        assert!(session.document().is_none());
        assert_eq!(session.stage(), CourseStage::Outlined);
    }

    #[test]
    fn document_for_a_replaced_structure_is_rejected() {
        let mut session = session();
        session.set_outline(Outline::new("outline"));
        session.set_structure(structure()).unwrap();
        let started_at = session.revision();

        session.set_structure(structure()).unwrap();

        let err = session
            .set_document(started_at, CourseDocumentBuilder::new("Intro to X").build())
            .unwrap_err();
        assert!(matches!(err, SessionError::StaleRevision { .. }));
        assert!(session.document().is_none());
    }
}
