//! Command implementations and the helpers they share.

pub mod backlinks;
pub mod config_cmd;
pub mod draft;
pub mod parse;
pub mod prompt;
pub mod resolve;

use inkwell_agent::{DraftRequest, OperationMode};
use inkwell_config::AppConfig;
use inkwell_core::Project;
use inkwell_corpus::{InMemoryCorpus, LoreSync, load_notes_dir};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Request options shared by `prompt` and `draft`.
#[derive(clap::Args, Debug, Clone)]
pub struct RequestArgs {
    /// Operation mode: draft, continue, brainstorm, outline, critique,
    /// summarize or subtasks
    #[arg(short, long, default_value = "draft")]
    pub mode: OperationMode,

    /// Notes directory (defaults to `notes_dir` from config)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Treat the notes directory as one project with this name
    #[arg(long)]
    pub project: Option<String>,

    /// Genre of the project
    #[arg(long, requires = "project")]
    pub genre: Option<String>,

    /// Note title or id to include as a selected reference (repeatable)
    #[arg(short, long = "reference")]
    pub references: Vec<String>,
}

pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// Load the notes directory into a fresh corpus, creating lore for the
/// notation found in each note when enabled.
pub async fn load_corpus(
    dir: Option<PathBuf>,
    config: &AppConfig,
    project: Option<&Project>,
) -> Result<Arc<InMemoryCorpus>, Box<dyn std::error::Error>> {
    let corpus = Arc::new(InMemoryCorpus::new());
    let Some(dir) = dir.or_else(|| config.notes_dir.clone()) else {
        warn!("No notes directory given, the corpus is empty");
        return Ok(corpus);
    };

    if let Some(project) = project {
        corpus.add_project(project.clone()).await;
    }

    let sync = LoreSync::new(corpus.clone(), config.lore.auto_create);
    let mut lore_created = 0;
    let notes = load_notes_dir(&dir)?;
    let note_count = notes.len();
    for note in notes {
        let note = match project {
            Some(p) => note.with_project(p.id.clone()),
            None => note,
        };
        let (_, created) = sync.save_note(note).await?;
        lore_created += created.len();
    }
    info!(dir = %dir.display(), notes = note_count, lore = lore_created, "Loaded corpus");
    Ok(corpus)
}

impl RequestArgs {
    pub fn project(&self) -> Option<Project> {
        self.project.as_ref().map(|name| {
            let mut project = Project::new(name.clone());
            project.genre = self.genre.clone();
            project
        })
    }

    /// Build the request, resolving reference titles to note ids.
    pub async fn to_request(
        &self,
        instruction: &str,
        corpus: &InMemoryCorpus,
        project: Option<&Project>,
    ) -> DraftRequest {
        let mut references = Vec::with_capacity(self.references.len());
        for reference in &self.references {
            match corpus.note_by_title(reference).await {
                Some(note) => references.push(note.id),
                None => references.push(reference.clone()),
            }
        }

        let request = DraftRequest::new(instruction, self.mode).with_references(references);
        match project {
            Some(p) => request.with_project(p.id.clone()),
            None => request,
        }
    }
}
