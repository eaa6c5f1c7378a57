//! In-memory corpus — useful for testing and for hosts that load notes
//! once per session.

use async_trait::async_trait;
use inkwell_core::{Corpus, CorpusError, LoreEntry, LoreType, Note, Project};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::graph::LinkIndex;
use crate::lore_sync::{LoreIndex, LoreKey};

#[derive(Default)]
struct CorpusState {
    projects: HashMap<String, Project>,
    /// Insertion order is preserved so scans are deterministic.
    notes: Vec<Note>,
    lore: Vec<LoreEntry>,
    links: LinkIndex,
    lore_keys: LoreIndex,
}

/// A corpus that keeps everything in a `Vec` behind an async lock.
///
/// Saving a note re-derives its links and updates the backlink index in the
/// same write, so readers never see the two out of step.
pub struct InMemoryCorpus {
    state: Arc<RwLock<CorpusState>>,
}

impl InMemoryCorpus {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(CorpusState::default())),
        }
    }

    /// Build a corpus from already-loaded notes.
    pub async fn with_notes(notes: Vec<Note>) -> Result<Self, CorpusError> {
        let corpus = Self::new();
        for note in notes {
            corpus.save_note(note).await?;
        }
        Ok(corpus)
    }

    pub async fn add_project(&self, project: Project) {
        self.state
            .write()
            .await
            .projects
            .insert(project.id.clone(), project);
    }

    pub async fn note_count(&self) -> usize {
        self.state.read().await.notes.len()
    }

    /// Find a note by case-insensitive title.
    pub async fn note_by_title(&self, title: &str) -> Option<Note> {
        let wanted = title.trim().to_lowercase();
        self.state
            .read()
            .await
            .notes
            .iter()
            .find(|n| n.title.to_lowercase() == wanted)
            .cloned()
    }
}

impl Default for InMemoryCorpus {
    fn default() -> Self {
        Self::new()
    }
}

fn in_project(project_id: Option<&str>, item_project: Option<&str>) -> bool {
    project_id.is_none() || project_id == item_project
}

#[async_trait]
impl Corpus for InMemoryCorpus {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn project(&self, id: &str) -> Result<Option<Project>, CorpusError> {
        Ok(self.state.read().await.projects.get(id).cloned())
    }

    async fn notes(&self, project_id: Option<&str>) -> Result<Vec<Note>, CorpusError> {
        let state = self.state.read().await;
        Ok(state
            .notes
            .iter()
            .filter(|n| in_project(project_id, n.project_id.as_deref()))
            .cloned()
            .collect())
    }

    async fn lore(&self, project_id: Option<&str>) -> Result<Vec<LoreEntry>, CorpusError> {
        let state = self.state.read().await;
        Ok(state
            .lore
            .iter()
            .filter(|l| in_project(project_id, l.project_id.as_deref()))
            .cloned()
            .collect())
    }

    async fn note(&self, id: &str) -> Result<Option<Note>, CorpusError> {
        Ok(self.state.read().await.notes.iter().find(|n| n.id == id).cloned())
    }

    async fn lore_entry(&self, id: &str) -> Result<Option<LoreEntry>, CorpusError> {
        Ok(self.state.read().await.lore.iter().find(|l| l.id == id).cloned())
    }

    async fn save_note(&self, mut note: Note) -> Result<Note, CorpusError> {
        if note.id.is_empty() {
            note.id = Uuid::new_v4().to_string();
        }
        note.refresh_links();

        let mut state = self.state.write().await;
        state.links.update(&note);
        match state.notes.iter_mut().find(|n| n.id == note.id) {
            Some(existing) => *existing = note.clone(),
            None => state.notes.push(note.clone()),
        }
        debug!(note_id = %note.id, links = note.links().len(), "Saved note");
        Ok(note)
    }

    async fn delete_note(&self, id: &str) -> Result<bool, CorpusError> {
        let mut state = self.state.write().await;
        let len_before = state.notes.len();
        state.notes.retain(|n| n.id != id);
        state.links.remove(id);
        Ok(state.notes.len() < len_before)
    }

    async fn insert_lore(&self, mut entry: LoreEntry) -> Result<String, CorpusError> {
        if entry.id.is_empty() {
            entry.id = Uuid::new_v4().to_string();
        }
        let id = entry.id.clone();
        let mut state = self.state.write().await;
        state.lore_keys.insert(&entry);
        state.lore.push(entry);
        Ok(id)
    }

    async fn find_lore(
        &self,
        title: &str,
        lore_type: LoreType,
        project_id: Option<&str>,
    ) -> Result<Option<LoreEntry>, CorpusError> {
        let state = self.state.read().await;
        let key = LoreKey::new(title, lore_type, project_id);
        Ok(state
            .lore_keys
            .get(&key)
            .and_then(|id| state.lore.iter().find(|l| l.id == id))
            .cloned())
    }

    async fn backlinks(&self, note_id: &str) -> Result<Vec<Note>, CorpusError> {
        let state = self.state.read().await;
        let note = state
            .notes
            .iter()
            .find(|n| n.id == note_id)
            .ok_or_else(|| CorpusError::NoteNotFound(note_id.to_string()))?;
        let ids = state.links.referencing(&note.title, &note.id);
        Ok(state
            .notes
            .iter()
            .filter(|n| ids.contains(&n.id))
            .cloned()
            .collect())
    }
}
