//! Corpus and vocabulary traits — the persistent stores the pipeline reads
//! and appends to.
//!
//! The corpus holds notes, lore entries and projects. It is read when the
//! assembler samples context and written when notes are saved or lore is
//! auto-created. The vocabulary is an append-only word set grown from
//! completed responses.

use async_trait::async_trait;
use inkwell_notation::LoreType;
use serde::{Deserialize, Serialize};

use crate::error::CorpusError;
use crate::note::{LoreEntry, Note, Project};

/// One corpus item eligible for prompt context, note or lore.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CorpusItem {
    Note(Note),
    Lore(LoreEntry),
}

impl CorpusItem {
    pub fn id(&self) -> &str {
        match self {
            Self::Note(n) => &n.id,
            Self::Lore(l) => &l.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Note(n) => &n.title,
            Self::Lore(l) => &l.title,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::Note(n) => n.content(),
            Self::Lore(l) => &l.content,
        }
    }

    /// Short label for rendering, e.g. `Note` or `Lore/Character`.
    pub fn label(&self) -> String {
        match self {
            Self::Note(_) => "Note".into(),
            Self::Lore(l) => format!("Lore/{}", l.lore_type),
        }
    }

    pub fn updated_at(&self) -> chrono::DateTime<chrono::Utc> {
        match self {
            Self::Note(n) => n.updated_at,
            Self::Lore(l) => l.updated_at,
        }
    }
}

/// The note/lore store.
///
/// A `None` project means "the whole corpus".
#[async_trait]
pub trait Corpus: Send + Sync {
    /// The backend name (e.g. "in_memory").
    fn name(&self) -> &str;

    async fn project(&self, id: &str) -> Result<Option<Project>, CorpusError>;

    async fn notes(&self, project_id: Option<&str>) -> Result<Vec<Note>, CorpusError>;

    async fn lore(&self, project_id: Option<&str>) -> Result<Vec<LoreEntry>, CorpusError>;

    async fn note(&self, id: &str) -> Result<Option<Note>, CorpusError>;

    async fn lore_entry(&self, id: &str) -> Result<Option<LoreEntry>, CorpusError>;

    /// Insert or replace a note. Forward links are re-derived from the
    /// content before the note is stored; the stored copy is returned.
    async fn save_note(&self, note: Note) -> Result<Note, CorpusError>;

    /// Delete a note by ID.
    async fn delete_note(&self, id: &str) -> Result<bool, CorpusError>;

    /// Insert a lore entry and return its ID.
    async fn insert_lore(&self, entry: LoreEntry) -> Result<String, CorpusError>;

    /// Find a lore entry by case-insensitive title, type and project.
    async fn find_lore(
        &self,
        title: &str,
        lore_type: LoreType,
        project_id: Option<&str>,
    ) -> Result<Option<LoreEntry>, CorpusError>;

    /// Notes whose forward links target the given note's title.
    async fn backlinks(&self, note_id: &str) -> Result<Vec<Note>, CorpusError>;

    /// Notes and lore together, as sampling candidates.
    async fn items(&self, project_id: Option<&str>) -> Result<Vec<CorpusItem>, CorpusError> {
        let mut items: Vec<CorpusItem> = self
            .notes(project_id)
            .await?
            .into_iter()
            .map(CorpusItem::Note)
            .collect();
        items.extend(self.lore(project_id).await?.into_iter().map(CorpusItem::Lore));
        Ok(items)
    }

    /// Resolve an explicit reference id against notes, then lore.
    async fn item(&self, id: &str) -> Result<Option<CorpusItem>, CorpusError> {
        if let Some(note) = self.note(id).await? {
            return Ok(Some(CorpusItem::Note(note)));
        }
        Ok(self.lore_entry(id).await?.map(CorpusItem::Lore))
    }
}

/// The persistent vocabulary set.
#[async_trait]
pub trait VocabularyStore: Send + Sync {
    /// Merge words into the set. Returns how many were new.
    async fn merge(&self, words: Vec<String>) -> Result<usize, CorpusError>;

    /// All known words, sorted.
    async fn words(&self) -> Result<Vec<String>, CorpusError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corpus_item_accessors() {
        let note = Note::new("Harbour", "salt and rope");
        let item = CorpusItem::Note(note.clone());
        assert_eq!(item.id(), note.id);
        assert_eq!(item.title(), "Harbour");
        assert_eq!(item.content(), "salt and rope");
        assert_eq!(item.label(), "Note");

        let lore = CorpusItem::Lore(LoreEntry::new("Kara", LoreType::Character));
        assert_eq!(lore.label(), "Lore/Character");
        assert_eq!(lore.content(), "");
    }
}
