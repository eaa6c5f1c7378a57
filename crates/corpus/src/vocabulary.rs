//! Vocabulary set grown from completed model responses.
//!
//! Words are extracted with a Unicode-aware pattern (letters, combining
//! marks and digits, so Thai runs survive intact), lowercased, and kept
//! when they are at least three characters long.

use async_trait::async_trait;
use inkwell_core::{CorpusError, VocabularyStore};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};
use tokio::sync::RwLock;
use tracing::{debug, warn};

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{M}\p{N}]+").expect("word pattern is valid"));

const MIN_WORD_CHARS: usize = 3;

/// Distinct words of at least three characters, in first-seen order.
pub fn extract_vocabulary(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    WORD_RE
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|w| w.chars().count() >= MIN_WORD_CHARS)
        .filter(|w| seen.insert(w.clone()))
        .collect()
}

/// A vocabulary kept only for the lifetime of the process.
#[derive(Default)]
pub struct InMemoryVocabulary {
    words: Arc<RwLock<BTreeSet<String>>>,
}

impl InMemoryVocabulary {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VocabularyStore for InMemoryVocabulary {
    async fn merge(&self, words: Vec<String>) -> Result<usize, CorpusError> {
        let mut set = self.words.write().await;
        Ok(words.into_iter().filter(|w| set.insert(w.clone())).count())
    }

    async fn words(&self) -> Result<Vec<String>, CorpusError> {
        Ok(self.words.read().await.iter().cloned().collect())
    }
}

/// A vocabulary persisted as one word per line.
///
/// Words are loaded on creation and the file is rewritten whenever a merge
/// adds something new.
pub struct FileVocabulary {
    path: PathBuf,
    words: Arc<RwLock<BTreeSet<String>>>,
}

impl FileVocabulary {
    pub fn new(path: PathBuf) -> Self {
        let words = Self::load_from_disk(&path);
        debug!(path = %path.display(), count = words.len(), "Vocabulary loaded");
        Self {
            path,
            words: Arc::new(RwLock::new(words)),
        }
    }

    fn load_from_disk(path: &PathBuf) -> BTreeSet<String> {
        match std::fs::read_to_string(path) {
            Ok(content) => content
                .lines()
                .map(str::trim)
                .filter(|w| !w.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(error = %e, "Could not read vocabulary file, starting empty");
                }
                BTreeSet::new()
            }
        }
    }

    fn flush(&self, words: &BTreeSet<String>) -> Result<(), CorpusError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CorpusError::Storage(format!("Failed to create vocabulary directory: {e}"))
            })?;
        }
        let mut content = words.iter().cloned().collect::<Vec<_>>().join("\n");
        content.push('\n');
        std::fs::write(&self.path, content)
            .map_err(|e| CorpusError::Storage(format!("Failed to write vocabulary file: {e}")))
    }
}

#[async_trait]
impl VocabularyStore for FileVocabulary {
    async fn merge(&self, words: Vec<String>) -> Result<usize, CorpusError> {
        let mut set = self.words.write().await;
        let added = words.into_iter().filter(|w| set.insert(w.clone())).count();
        if added > 0 {
            self.flush(&set)?;
        }
        Ok(added)
    }

    async fn words(&self) -> Result<Vec<String>, CorpusError> {
        Ok(self.words.read().await.iter().cloned().collect())
    }
}
