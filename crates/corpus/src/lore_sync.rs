//! Lore auto-creation from notation.
//!
//! When a note is saved, every lore notation in its content that does not
//! match an existing entry (case-insensitive title, same type, same
//! project) becomes a new, empty [`LoreEntry`]. This is the only path that
//! creates entities from notation.

use inkwell_core::{Corpus, CorpusError, LoreEntry, LoreType, Note};
use inkwell_notation::extract_lore_notations;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Dedup key for lore entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoreKey {
    title: String,
    lore_type: LoreType,
    project_id: Option<String>,
}

impl LoreKey {
    pub fn new(title: &str, lore_type: LoreType, project_id: Option<&str>) -> Self {
        Self {
            title: title.trim().to_lowercase(),
            lore_type,
            project_id: project_id.map(str::to_string),
        }
    }

    pub fn of(entry: &LoreEntry) -> Self {
        Self::new(&entry.title, entry.lore_type, entry.project_id.as_deref())
    }
}

/// `LoreKey → entry id`, so existence checks do not scan the lore list.
#[derive(Debug, Default)]
pub struct LoreIndex {
    keys: HashMap<LoreKey, String>,
}

impl LoreIndex {
    pub fn insert(&mut self, entry: &LoreEntry) {
        self.keys.entry(LoreKey::of(entry)).or_insert_with(|| entry.id.clone());
    }

    pub fn get(&self, key: &LoreKey) -> Option<&str> {
        self.keys.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Creates missing lore entries for the notations found in a text.
pub struct LoreSync {
    corpus: Arc<dyn Corpus>,
    enabled: bool,
}

impl LoreSync {
    pub fn new(corpus: Arc<dyn Corpus>, enabled: bool) -> Self {
        Self { corpus, enabled }
    }

    /// Scan `text` and create entries for unmatched notations.
    /// Returns the entries that were created.
    pub async fn sync(
        &self,
        text: &str,
        project_id: Option<&str>,
    ) -> Result<Vec<LoreEntry>, CorpusError> {
        if !self.enabled {
            return Ok(Vec::new());
        }

        let mut created = Vec::new();
        for notation in extract_lore_notations(text) {
            let existing = self
                .corpus
                .find_lore(&notation.title, notation.lore_type, project_id)
                .await?;
            if existing.is_some() {
                continue;
            }

            let entry = LoreEntry::new(&notation.title, notation.lore_type)
                .with_project(project_id.map(str::to_string));
            debug!(title = %entry.title, lore_type = %entry.lore_type, "Auto-creating lore entry");
            self.corpus.insert_lore(entry.clone()).await?;
            created.push(entry);
        }

        if !created.is_empty() {
            info!(count = created.len(), "Created lore entries from notation");
        }
        Ok(created)
    }

    /// Save a note, then create lore for the notations in its content.
    pub async fn save_note(&self, note: Note) -> Result<(Note, Vec<LoreEntry>), CorpusError> {
        let saved = self.corpus.save_note(note).await?;
        let created = self
            .sync(saved.content(), saved.project_id.as_deref())
            .await?;
        Ok((saved, created))
    }
}
