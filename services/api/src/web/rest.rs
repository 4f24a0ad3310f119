//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::{
    error::{ApiError, ErrorResponse},
    web::{course_task, state::AppState},
};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use course_generator_core::{
    AudienceLevel, ChatRole, ChatTurn, CourseRequest, CourseSession, CourseStructure, Difficulty,
    ExportFormat,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        create_course_handler,
        get_course_handler,
        regenerate_outline_handler,
        extract_structure_handler,
        get_document_handler,
        export_course_handler,
        get_history_handler,
        clear_history_handler,
    ),
    components(
        schemas(
            CourseRequestPayload,
            AudienceLevelPayload,
            DifficultyPayload,
            ExportFormatParam,
            CourseCreatedResponse,
            CourseSummaryResponse,
            ModuleResponse,
            StructureResponse,
            DocumentResponse,
            ChatTurnResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Course Generator API", description = "Outline, structure, generate and export courses.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Request Payloads
//=========================================================================================

#[derive(Deserialize, ToSchema, Debug, Clone, Copy)]
pub enum AudienceLevelPayload {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Deserialize, ToSchema, Debug, Clone, Copy)]
pub enum DifficultyPayload {
    Easy,
    Medium,
    Hard,
}

/// The course form as submitted by the client.
#[derive(Deserialize, ToSchema, Debug, Clone)]
pub struct CourseRequestPayload {
    pub name: String,
    pub audience_level: AudienceLevelPayload,
    pub difficulty: DifficultyPayload,
    /// Between 1 and 10.
    pub module_count: u8,
    pub duration: String,
    pub credit: String,
}

impl From<CourseRequestPayload> for CourseRequest {
    fn from(payload: CourseRequestPayload) -> Self {
        CourseRequest {
            name: payload.name,
            audience_level: match payload.audience_level {
                AudienceLevelPayload::Beginner => AudienceLevel::Beginner,
                AudienceLevelPayload::Intermediate => AudienceLevel::Intermediate,
                AudienceLevelPayload::Advanced => AudienceLevel::Advanced,
            },
            difficulty: match payload.difficulty {
                DifficultyPayload::Easy => Difficulty::Easy,
                DifficultyPayload::Medium => Difficulty::Medium,
                DifficultyPayload::Hard => Difficulty::Hard,
            },
            module_count: payload.module_count,
            duration: payload.duration,
            credit: payload.credit,
        }
    }
}

#[derive(Deserialize, ToSchema, Debug, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormatParam {
    Pdf,
    Pptx,
}

impl From<ExportFormatParam> for ExportFormat {
    fn from(param: ExportFormatParam) -> Self {
        match param {
            ExportFormatParam::Pdf => ExportFormat::Pdf,
            ExportFormatParam::Pptx => ExportFormat::Pptx,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct ExportQuery {
    pub format: ExportFormatParam,
}

//=========================================================================================
// API Response Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct CourseCreatedResponse {
    course_id: Uuid,
    revision: u64,
    outline: String,
}

#[derive(Serialize, ToSchema)]
pub struct ModuleResponse {
    name: String,
    lessons: Vec<String>,
}

/// Where a course stands and what it has produced so far.
#[derive(Serialize, ToSchema)]
pub struct CourseSummaryResponse {
    course_id: Uuid,
    name: String,
    stage: String,
    revision: u64,
    outline: Option<String>,
    modules: Option<Vec<ModuleResponse>>,
    placeholder_count: Option<usize>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct StructureResponse {
    course_id: Uuid,
    revision: u64,
    total_units: usize,
    modules: Vec<ModuleResponse>,
}

#[derive(Serialize, ToSchema)]
pub struct DocumentResponse {
    course_id: Uuid,
    placeholder_count: usize,
    markdown: String,
}

#[derive(Serialize, ToSchema)]
pub struct ChatTurnResponse {
    role: String,
    content: String,
    created_at: DateTime<Utc>,
}

fn modules_response(structure: &CourseStructure) -> Vec<ModuleResponse> {
    structure
        .modules()
        .iter()
        .map(|module| ModuleResponse {
            name: module.name.clone(),
            lessons: module.lessons.clone(),
        })
        .collect()
}

impl From<&CourseSession> for CourseSummaryResponse {
    fn from(session: &CourseSession) -> Self {
        Self {
            course_id: session.id,
            name: session.request.name.clone(),
            stage: session.stage().as_str().to_string(),
            revision: session.revision(),
            outline: session.outline().map(|o| o.as_str().to_string()),
            modules: session.structure().map(modules_response),
            placeholder_count: session.document().map(|d| d.placeholder_count()),
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

impl From<ChatTurn> for ChatTurnResponse {
    fn from(turn: ChatTurn) -> Self {
        let role = match turn.role {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        };
        Self {
            role: role.to_string(),
            content: turn.content,
            created_at: turn.created_at,
        }
    }
}

//=========================================================================================
// Course Handlers
//=========================================================================================

/// Create a course and generate its outline.
#[utoipa::path(
    post,
    path = "/courses",
    request_body = CourseRequestPayload,
    responses(
        (status = 201, description = "Course created with its outline", body = CourseCreatedResponse),
        (status = 400, description = "The course request failed validation", body = ErrorResponse),
        (status = 502, description = "The model call failed", body = ErrorResponse),
        (status = 503, description = "No model credential is configured", body = ErrorResponse)
    )
)]
pub async fn create_course_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CourseRequestPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let session = course_task::create_course(&app_state, payload.into()).await?;
    let outline = session.require_outline()?.as_str().to_string();
    let response = CourseCreatedResponse {
        course_id: session.id,
        revision: session.revision(),
        outline,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Get a course's stage and the results produced so far.
#[utoipa::path(
    get,
    path = "/courses/{id}",
    params(("id" = Uuid, Path, description = "The course ID.")),
    responses(
        (status = 200, description = "Course summary", body = CourseSummaryResponse),
        (status = 404, description = "No such course", body = ErrorResponse)
    )
)]
pub async fn get_course_handler(
    State(app_state): State<Arc<AppState>>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<CourseSummaryResponse>, ApiError> {
    let session = app_state.course_snapshot(course_id).await?;
    Ok(Json(CourseSummaryResponse::from(&session)))
}

/// Regenerate the outline. Discards the structure and any generated content.
#[utoipa::path(
    post,
    path = "/courses/{id}/outline",
    params(("id" = Uuid, Path, description = "The course ID.")),
    responses(
        (status = 200, description = "The course with its new outline", body = CourseSummaryResponse),
        (status = 404, description = "No such course", body = ErrorResponse),
        (status = 502, description = "The model call failed", body = ErrorResponse)
    )
)]
pub async fn regenerate_outline_handler(
    State(app_state): State<Arc<AppState>>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<CourseSummaryResponse>, ApiError> {
    let session = course_task::regenerate_outline(&app_state, course_id).await?;
    Ok(Json(CourseSummaryResponse::from(&session)))
}

/// Extract the module/lesson structure from the current outline.
#[utoipa::path(
    post,
    path = "/courses/{id}/structure",
    params(("id" = Uuid, Path, description = "The course ID.")),
    responses(
        (status = 200, description = "The extracted structure", body = StructureResponse),
        (status = 404, description = "No such course", body = ErrorResponse),
        (status = 409, description = "The course has no outline or changed meanwhile", body = ErrorResponse),
        (status = 502, description = "The model reply could not be parsed", body = ErrorResponse)
    )
)]
pub async fn extract_structure_handler(
    State(app_state): State<Arc<AppState>>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<StructureResponse>, ApiError> {
    let course = course_task::extract_structure(&app_state, course_id).await?;
    Ok(Json(StructureResponse {
        course_id,
        revision: course.revision,
        total_units: course.structure.total_units(),
        modules: modules_response(&course.structure),
    }))
}

/// Get the generated course as markdown.
#[utoipa::path(
    get,
    path = "/courses/{id}/document",
    params(("id" = Uuid, Path, description = "The course ID.")),
    responses(
        (status = 200, description = "The generated course", body = DocumentResponse),
        (status = 404, description = "No such course", body = ErrorResponse),
        (status = 409, description = "The course has not been generated yet", body = ErrorResponse)
    )
)]
pub async fn get_document_handler(
    State(app_state): State<Arc<AppState>>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let session = app_state.course_snapshot(course_id).await?;
    let document = session.require_document()?;
    Ok(Json(DocumentResponse {
        course_id,
        placeholder_count: document.placeholder_count(),
        markdown: document.to_markdown(),
    }))
}

/// Download the generated course as a PDF or a PowerPoint deck.
#[utoipa::path(
    get,
    path = "/courses/{id}/export",
    params(
        ("id" = Uuid, Path, description = "The course ID."),
        ("format" = ExportFormatParam, Query, description = "`pdf` or `pptx`.")
    ),
    responses(
        (status = 200, description = "The rendered file; `Content-Type` follows the format"),
        (status = 404, description = "No such course", body = ErrorResponse),
        (status = 409, description = "The course has not been generated yet", body = ErrorResponse),
        (status = 500, description = "Rendering failed", body = ErrorResponse)
    )
)]
pub async fn export_course_handler(
    State(app_state): State<Arc<AppState>>,
    Path(course_id): Path<Uuid>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let format = ExportFormat::from(query.format);
    let session = app_state.course_snapshot(course_id).await?;
    let document = session.require_document()?.clone();
    let file_name = format.file_name(document.course_name());

    // Rendering is CPU-bound; keep it off the async workers.
    let exporter = app_state.exporter.clone();
    let bytes = tokio::task::spawn_blocking(move || exporter.export(&document, format))
        .await
        .map_err(|e| ApiError::Internal(format!("Export task failed: {}", e)))??;

    let headers = [
        (header::CONTENT_TYPE, format.mime_type().to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        ),
    ];
    Ok((headers, bytes))
}

//=========================================================================================
// Chat History Handlers
//=========================================================================================

/// List the persisted chat history, oldest first.
#[utoipa::path(
    get,
    path = "/history",
    responses(
        (status = 200, description = "The chat history", body = [ChatTurnResponse]),
        (status = 500, description = "The history store failed", body = ErrorResponse)
    )
)]
pub async fn get_history_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<ChatTurnResponse>>, ApiError> {
    let turns = app_state.history.load_history().await?;
    Ok(Json(turns.into_iter().map(ChatTurnResponse::from).collect()))
}

/// Clear the persisted chat history.
#[utoipa::path(
    delete,
    path = "/history",
    responses(
        (status = 204, description = "History cleared"),
        (status = 500, description = "The history store failed", body = ErrorResponse)
    )
)]
pub async fn clear_history_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    app_state.history.clear_history().await?;
    Ok(StatusCode::NO_CONTENT)
}
