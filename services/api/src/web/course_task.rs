//! services/api/src/web/course_task.rs
//!
//! The course operations shared by the REST handlers and the WebSocket
//! handler. Each one reads a snapshot of the course, calls the model without
//! holding the registry lock, and writes its result back only if the course
//! has not moved on in the meantime.

use crate::{
    error::ApiError,
    web::{protocol::ServerMessage, state::AppState},
};
use course_generator_core::{
    ChatTurn, CourseRequest, CourseSession, CourseStructure, Outline, SessionError,
};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};
use uuid::Uuid;

/// A course with a structure, pinned to the revision it was read at.
#[derive(Debug, Clone)]
pub struct StructuredCourse {
    pub course_name: String,
    pub structure: CourseStructure,
    pub revision: u64,
}

/// Validates the request, generates its outline and registers the new course.
pub async fn create_course(
    app_state: &AppState,
    request: CourseRequest,
) -> Result<CourseSession, ApiError> {
    request.validate()?;
    let outline = app_state.generator.outline.generate_outline(&request).await?;
    record_outline_exchange(app_state, &request, &outline).await;

    let mut session = CourseSession::new(request);
    session.set_outline(outline);
    info!(course_id = %session.id, course = %session.request.name, "Course created");
    app_state.insert_course(session.clone()).await;
    Ok(session)
}

/// Replaces the outline of an existing course, discarding its structure and document.
pub async fn regenerate_outline(
    app_state: &AppState,
    course_id: Uuid,
) -> Result<CourseSession, ApiError> {
    let request = app_state.course_snapshot(course_id).await?.request;
    let outline = app_state.generator.outline.generate_outline(&request).await?;
    record_outline_exchange(app_state, &request, &outline).await;

    app_state
        .update_course(course_id, |session| {
            session.set_outline(outline);
            info!(course_id = %course_id, revision = session.revision(), "Outline regenerated");
            Ok(session.clone())
        })
        .await
}

/// Extracts a fresh structure from the course's current outline.
pub async fn extract_structure(
    app_state: &AppState,
    course_id: Uuid,
) -> Result<StructuredCourse, ApiError> {
    let snapshot = app_state.course_snapshot(course_id).await?;
    let outline = snapshot.require_outline()?.clone();
    let read_at = snapshot.revision();

    let structure = app_state.generator.extractor.extract_structure(&outline).await?;

    app_state
        .update_course(course_id, |session| {
            ensure_revision(session, read_at)?;
            session.set_structure(structure.clone())?;
            info!(
                course_id = %course_id,
                modules = structure.module_count(),
                lessons = structure.lesson_count(),
                "Structure extracted"
            );
            Ok(StructuredCourse {
                course_name: session.request.name.clone(),
                structure,
                revision: session.revision(),
            })
        })
        .await
}

/// The course's structure, extracting it first if there is none yet.
pub async fn ensure_structure(
    app_state: &AppState,
    course_id: Uuid,
) -> Result<StructuredCourse, ApiError> {
    let snapshot = app_state.course_snapshot(course_id).await?;
    match snapshot.structure() {
        Some(structure) => Ok(StructuredCourse {
            course_name: snapshot.request.name.clone(),
            structure: structure.clone(),
            revision: snapshot.revision(),
        }),
        None => extract_structure(app_state, course_id).await,
    }
}

/// Generates every unit of a course, reporting each one on `events`.
///
/// Only one run per course may be in flight; a second one is refused with
/// `GenerationInProgress` before any model call. The finished document is
/// stored only if the course is still at the revision the run started from;
/// otherwise it is dropped and a `StaleRevision` error is returned.
pub async fn generation_process(
    app_state: Arc<AppState>,
    course_id: Uuid,
    events: UnboundedSender<ServerMessage>,
) -> Result<(), ApiError> {
    let _run = app_state.begin_run(course_id)?;
    let course = ensure_structure(&app_state, course_id).await?;

    // A send only fails once the connection is gone; the run still finishes
    // so the document is stored for later retrieval.
    let _ = events.send(ServerMessage::GenerationStarted {
        course_id,
        total_units: course.structure.total_units(),
    });

    let progress_events = events.clone();
    let document = app_state
        .generator
        .pipeline
        .run(&course.structure, &course.course_name, move |update| {
            let _ = progress_events.send(ServerMessage::progress(course_id, update));
        })
        .await?;

    let placeholder_count = document.placeholder_count();
    let markdown = document.to_markdown();

    app_state
        .update_course(course_id, |session| {
            session.set_document(course.revision, document)?;
            Ok(())
        })
        .await
        .inspect_err(|e| {
            if let ApiError::Session(SessionError::StaleRevision { .. }) = e {
                warn!(course_id = %course_id, "Discarding a document generated from replaced inputs");
            }
        })?;

    info!(course_id = %course_id, placeholder_count, "Course generation complete");
    let _ = events.send(ServerMessage::CourseCompleted {
        course_id,
        placeholder_count,
        markdown,
    });
    Ok(())
}

fn ensure_revision(session: &CourseSession, read_at: u64) -> Result<(), SessionError> {
    if session.revision() == read_at {
        Ok(())
    } else {
        Err(SessionError::StaleRevision {
            produced_for: read_at,
            current: session.revision(),
        })
    }
}

/// Appends the request summary and the outline to the persisted chat history.
/// A store failure is logged and does not fail the request.
async fn record_outline_exchange(app_state: &AppState, request: &CourseRequest, outline: &Outline) {
    let turns = [
        ChatTurn::user(request.summary()),
        ChatTurn::assistant(outline.as_str()),
    ];
    if let Err(e) = app_state.history.append_history(&turns).await {
        warn!("Failed to record chat history: {}", e);
    }
}
