pub mod course_task;
pub mod protocol;
pub mod rest;
pub mod state;
pub mod ws_handler;

#[cfg(test)]
mod test_support;

// Re-export the main WebSocket handler to make it easily accessible
// to the binary that will build the web server router.
pub use ws_handler::ws_handler;
pub use rest::{
    clear_history_handler, create_course_handler, export_course_handler,
    extract_structure_handler, get_course_handler, get_document_handler, get_history_handler,
    regenerate_outline_handler,
};
