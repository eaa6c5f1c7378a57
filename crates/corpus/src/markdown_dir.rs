//! Load a directory of markdown files as notes.
//!
//! Each `*.md` file becomes one note. The title is the first `# ` heading,
//! or the file stem when there is none.

use inkwell_core::{CorpusError, Note};
use std::path::Path;
use tracing::{debug, warn};

/// Read every `*.md` file directly under `dir`, sorted by file name.
pub fn load_notes_dir(dir: &Path) -> Result<Vec<Note>, CorpusError> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        CorpusError::Storage(format!("Failed to read notes directory {}: {e}", dir.display()))
    })?;

    let mut paths: Vec<_> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "md"))
        .collect();
    paths.sort();

    let mut notes = Vec::with_capacity(paths.len());
    for path in paths {
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable note");
                continue;
            }
        };
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        notes.push(Note::new(note_title(&content, &stem), content));
    }

    debug!(dir = %dir.display(), count = notes.len(), "Loaded notes directory");
    Ok(notes)
}

fn note_title(content: &str, fallback: &str) -> String {
    content
        .lines()
        .find_map(|line| line.trim().strip_prefix("# "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(fallback)
        .to_string()
}
