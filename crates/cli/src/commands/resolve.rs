//! `inkwell resolve` — Split a settled response into prose and structure.

use inkwell_agent::resolve;
use std::path::Path;

pub async fn run(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(file)
        .map_err(|e| format!("Failed to read {}: {e}", file.display()))?;
    let resolved = resolve(&text);
    println!("{}", serde_json::to_string_pretty(&resolved)?);
    Ok(())
}
