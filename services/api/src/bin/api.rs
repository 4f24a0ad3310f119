//! services/api/src/bin/api.rs

use course_api_lib::{
    adapters::{DocumentExportAdapter, JsonFileHistoryStore, OpenAiCompletionAdapter},
    config::Config,
    error::ApiError,
    web::{
        clear_history_handler, create_course_handler, export_course_handler,
        extract_structure_handler, get_course_handler, get_document_handler, get_history_handler,
        regenerate_outline_handler, rest::ApiDoc, state::AppState, ws_handler,
    },
};
use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use course_generator_core::{ChatHistoryStore, CourseGenerator, ModelPolicy};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize Service Adapters ---
    if config.openai_api_key.is_none() {
        warn!("OPENAI_API_KEY is not set; every generation request will fail until it is.");
    }
    let completion_adapter = Arc::new(OpenAiCompletionAdapter::new(
        config.openai_api_key.as_deref(),
        config.fast_model.clone(),
        config.quality_model.clone(),
        config.temperature,
    ));
    let generator = Arc::new(CourseGenerator::new(
        completion_adapter,
        ModelPolicy::default(),
    ));
    let exporter = Arc::new(DocumentExportAdapter::new());
    let history = Arc::new(JsonFileHistoryStore::new(config.history_path.clone()));
    match history.load_history().await {
        Ok(turns) => info!(
            path = %config.history_path.display(),
            turns = turns.len(),
            "Chat history loaded."
        ),
        Err(e) => warn!(
            path = %config.history_path.display(),
            "Chat history could not be read and will be overwritten on the next save: {}",
            e
        ),
    }

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(config.clone(), generator, exporter, history));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    // --- 4. Create the Web Router ---
    let api_router = Router::new()
        .route("/courses", post(create_course_handler))
        .route("/courses/{id}", get(get_course_handler))
        .route("/courses/{id}/outline", post(regenerate_outline_handler))
        .route("/courses/{id}/structure", post(extract_structure_handler))
        .route("/courses/{id}/document", get(get_document_handler))
        .route("/courses/{id}/export", get(export_course_handler))
        .route(
            "/history",
            get(get_history_handler).delete(clear_history_handler),
        )
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
