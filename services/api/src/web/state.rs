//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the in-memory course registry.

use crate::{config::Config, error::ApiError};
use course_generator_core::{
    ports::{ChatHistoryStore, DocumentExporter},
    CourseGenerator, CourseSession,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError};
use tokio::sync::Mutex;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub config: Arc<Config>,
    pub generator: Arc<CourseGenerator>,
    pub exporter: Arc<dyn DocumentExporter>,
    pub history: Arc<dyn ChatHistoryStore>,
    /// Every course created since startup, keyed by course id.
    courses: Mutex<HashMap<Uuid, CourseSession>>,
    /// Courses with a generation run in flight, across all connections.
    running: std::sync::Mutex<HashSet<Uuid>>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        generator: Arc<CourseGenerator>,
        exporter: Arc<dyn DocumentExporter>,
        history: Arc<dyn ChatHistoryStore>,
    ) -> Self {
        Self {
            config,
            generator,
            exporter,
            history,
            courses: Mutex::new(HashMap::new()),
            running: std::sync::Mutex::new(HashSet::new()),
        }
    }

    pub async fn insert_course(&self, session: CourseSession) {
        self.courses.lock().await.insert(session.id, session);
    }

    /// A copy of the course as it is now. Model calls work from snapshots so
    /// the registry lock is never held across them.
    pub async fn course_snapshot(&self, course_id: Uuid) -> Result<CourseSession, ApiError> {
        self.courses
            .lock()
            .await
            .get(&course_id)
            .cloned()
            .ok_or(ApiError::CourseNotFound(course_id))
    }

    /// Runs `update` against the stored course while holding the registry lock.
    pub async fn update_course<T>(
        &self,
        course_id: Uuid,
        update: impl FnOnce(&mut CourseSession) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let mut courses = self.courses.lock().await;
        let session = courses
            .get_mut(&course_id)
            .ok_or(ApiError::CourseNotFound(course_id))?;
        update(session)
    }

    /// Claims the course for one generation run. The claim is released when
    /// the returned guard is dropped.
    pub fn begin_run(&self, course_id: Uuid) -> Result<RunGuard<'_>, ApiError> {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if !running.insert(course_id) {
            return Err(ApiError::GenerationInProgress(course_id));
        }
        Ok(RunGuard {
            state: self,
            course_id,
        })
    }
}

/// An in-flight generation claim on one course.
pub struct RunGuard<'a> {
    state: &'a AppState,
    course_id: Uuid,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.state
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.course_id);
    }
}
