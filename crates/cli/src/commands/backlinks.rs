//! `inkwell backlinks` — List the notes that link to a note.

use inkwell_core::Corpus;
use std::path::PathBuf;

use super::{load_config, load_corpus};

pub async fn run(title: &str, dir: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let corpus = load_corpus(dir, &config, None).await?;

    let target = corpus
        .note_by_title(title)
        .await
        .ok_or_else(|| format!("No note titled \"{title}\""))?;
    let sources = corpus.backlinks(&target.id).await?;

    if sources.is_empty() {
        println!("No notes link to \"{}\".", target.title);
        return Ok(());
    }
    println!("Notes linking to \"{}\":", target.title);
    for note in sources {
        println!("  - {}", note.title);
    }
    Ok(())
}
