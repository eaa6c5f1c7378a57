//! Notes, lore entries and projects.
//!
//! A note's forward links are derived from its content whenever the content
//! is set. The `links` field is private so nothing can edit it by hand.

use chrono::{DateTime, Utc};
use inkwell_notation::{LoreType, NoteLink, extract_links};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A free-form note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Forward links, in order of appearance in `content`.
    links: Vec<NoteLink>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

impl Note {
    /// Create a new note. Links are derived from `content`.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        let content = content.into();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            links: extract_links(&content),
            content,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
            project_id: None,
        }
    }

    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn links(&self) -> &[NoteLink] {
        &self.links
    }

    /// Replace the content and re-derive the forward links.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.links = extract_links(&self.content);
        self.updated_at = Utc::now();
    }

    /// Re-derive the forward links from the current content. Used on save,
    /// so notes deserialized from elsewhere cannot carry stale links.
    pub fn refresh_links(&mut self) {
        self.links = extract_links(&self.content);
    }

    /// Whether any forward link of this note targets `title`.
    pub fn links_to(&self, title: &str) -> bool {
        self.links.iter().any(|l| l.targets(title))
    }
}

/// A structured worldbuilding record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoreEntry {
    pub id: String,
    pub title: String,
    pub lore_type: LoreType,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl LoreEntry {
    pub fn new(title: impl Into<String>, lore_type: LoreType) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            lore_type,
            content: String::new(),
            tags: Vec::new(),
            project_id: None,
            updated_at: Utc::now(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_project(mut self, project_id: Option<String>) -> Self {
        self.project_id = project_id;
        self
    }
}

/// A writing project that groups notes and lore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            genre: None,
            description: None,
        }
    }
}
