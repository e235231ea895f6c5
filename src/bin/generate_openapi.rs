//! Writes the OpenAPI document of the building safety API.
//!
//! Usage:
//!   cargo run --bin generate_openapi > openapi.json
//!   cargo run --bin generate_openapi -- --output openapi.json

use std::{
    env, fs,
    io::{self, Write},
    path::PathBuf,
    process,
};

use building_safety_service::api::handlers::ApiDoc;
use utoipa::OpenApi;

fn output_path() -> Option<PathBuf> {
    let args: Vec<String> = env::args().collect();
    args.windows(2)
        .find(|w| w[0] == "--output")
        .map(|w| PathBuf::from(&w[1]))
}

fn main() {
    let json = ApiDoc::openapi()
        .to_pretty_json()
        .expect("OpenAPI document serialises to JSON");

    let Some(path) = output_path() else {
        if let Err(e) = io::stdout().write_all(json.as_bytes()) {
            eprintln!("Error writing to stdout: {e}");
            process::exit(1);
        }
        return;
    };

    if let Err(e) = fs::write(&path, &json) {
        eprintln!("Error writing to {}: {e}", path.display());
        process::exit(1);
    }
    eprintln!("OpenAPI document written to {}", path.display());
}
