//! `inkwell parse` — Show what the notation parser sees in a file.

use inkwell_notation::{extract_cues, extract_links, extract_lore_notations};
use std::path::Path;

pub async fn run(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(file)
        .map_err(|e| format!("Failed to read {}: {e}", file.display()))?;
    println!("{}", serde_json::to_string_pretty(&report(&text))?);
    Ok(())
}

/// Links, lore notations and cues for `text`, as one JSON document.
pub fn report(text: &str) -> serde_json::Value {
    serde_json::json!({
        "links": extract_links(text),
        "lore": extract_lore_notations(text),
        "cues": extract_cues(text),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_lists_every_notation() {
        let report = report("# Ch1\nMeet [[Kara|Character]] and @Finn at [[The Docks]].");
        assert_eq!(report["links"].as_array().unwrap().len(), 2);
        assert_eq!(report["lore"].as_array().unwrap().len(), 3);
        assert_eq!(report["lore"][2]["title"], "Finn");
        assert_eq!(report["cues"]["title"], "Ch1");
    }
}
