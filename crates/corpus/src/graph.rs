//! Link graph over notes.
//!
//! Forward links live on each [`Note`] and are materialized when the note
//! is saved. Backlinks are answered two ways:
//!
//! - [`backlinks`]: a linear scan over a corpus snapshot, for callers that
//!   only hold a list of notes;
//! - [`LinkIndex`]: an inverted index `lowercased title → referencing note
//!   ids`, kept current by the corpus on every save and delete.
//!
//! Both compare titles case-insensitively and never resolve a note to
//! itself.

use inkwell_core::Note;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

fn title_key(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Notes other than `note` that link to its title, in corpus order.
pub fn backlinks<'a>(notes: &'a [Note], note: &Note) -> Vec<&'a Note> {
    notes
        .iter()
        .filter(|other| other.id != note.id && other.links_to(&note.title))
        .collect()
}

/// A forward link paired with the note it resolves to, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedLink {
    pub target_title: String,
    /// `None` when no note has this title; shown as a disabled link.
    pub target_id: Option<String>,
}

/// Resolve each forward link of `note` against `notes`. Unresolved targets
/// are reported, never created.
pub fn resolve_links(notes: &[Note], note: &Note) -> Vec<ResolvedLink> {
    note.links()
        .iter()
        .map(|link| ResolvedLink {
            target_title: link.target_title.clone(),
            target_id: notes
                .iter()
                .find(|candidate| link.targets(&candidate.title))
                .map(|candidate| candidate.id.clone()),
        })
        .collect()
}

/// Inverted index from link target to the notes that reference it.
#[derive(Debug, Default)]
pub struct LinkIndex {
    by_target: HashMap<String, BTreeSet<String>>,
    by_source: HashMap<String, BTreeSet<String>>,
}

impl LinkIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the outgoing links recorded for `note`.
    pub fn update(&mut self, note: &Note) {
        self.remove(&note.id);
        let targets: BTreeSet<String> = note
            .links()
            .iter()
            .map(|l| title_key(&l.target_title))
            .collect();
        for target in &targets {
            self.by_target
                .entry(target.clone())
                .or_default()
                .insert(note.id.clone());
        }
        if !targets.is_empty() {
            self.by_source.insert(note.id.clone(), targets);
        }
    }

    /// Forget every link that originates from `note_id`.
    pub fn remove(&mut self, note_id: &str) {
        let Some(targets) = self.by_source.remove(note_id) else {
            return;
        };
        for target in targets {
            if let Some(sources) = self.by_target.get_mut(&target) {
                sources.remove(note_id);
                if sources.is_empty() {
                    self.by_target.remove(&target);
                }
            }
        }
    }

    /// IDs of notes linking to `title`, excluding `exclude_id`.
    pub fn referencing(&self, title: &str, exclude_id: &str) -> BTreeSet<String> {
        self.by_target
            .get(&title_key(title))
            .map(|ids| ids.iter().filter(|id| *id != exclude_id).cloned().collect())
            .unwrap_or_default()
    }

    pub fn target_count(&self) -> usize {
        self.by_target.len()
    }
}
