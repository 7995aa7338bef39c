//! services/api/src/bin/openapi.rs
//!
//! Dumps the study planner's REST contract (auth, planner resources, views and
//! sample data) as OpenAPI JSON, so the client can generate its API types
//! without a running server.
//!
//! Usage: `openapi [OUTPUT]`, writing to `openapi.json` when no path is given.

use api_lib::web::rest::ApiDoc;
use utoipa::OpenApi;

const DEFAULT_OUTPUT: &str = "openapi.json";

fn write_document(output: &str) -> Result<usize, Box<dyn std::error::Error>> {
    let document = ApiDoc::openapi();
    let paths = document.paths.paths.len();
    std::fs::write(output, document.to_pretty_json()?)?;
    Ok(paths)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_OUTPUT.to_string());
    let paths = write_document(&output)?;
    println!("Wrote {} study planner API paths to {}", paths, output);
    Ok(())
}
