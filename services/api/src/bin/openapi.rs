//! services/api/src/bin/openapi.rs
//!
//! This binary writes the OpenAPI 3.0 document for the REST API to disk.
//! Usage: `openapi [OUTPUT_PATH]` (defaults to `openapi.json`).

use course_api_lib::web::rest::ApiDoc;
use utoipa::OpenApi;

const DEFAULT_OUTPUT: &str = "openapi.json";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_OUTPUT.to_string());

    let spec_json = ApiDoc::openapi().to_pretty_json()?;
    std::fs::write(&path, spec_json)?;
    println!("OpenAPI specification written to {}", path);
    Ok(())
}
