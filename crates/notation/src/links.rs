//! Forward-link extraction from `[[...]]` notation.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Matches a complete `[[...]]` span. Brackets inside the span are not
/// allowed, so unterminated or nested notation never matches.
pub(crate) static BRACKET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\[\]]+?)\]\]").expect("bracket pattern is valid"));

/// A forward link from a note's content to another entity, by title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteLink {
    pub target_title: String,
}

impl NoteLink {
    pub fn new(target_title: impl Into<String>) -> Self {
        Self {
            target_title: target_title.into(),
        }
    }

    /// Case-insensitive title comparison, the rule used for link resolution.
    pub fn targets(&self, title: &str) -> bool {
        self.target_title.to_lowercase() == title.trim().to_lowercase()
    }
}

/// Split the inside of a `[[...]]` span at the first `|`.
pub(crate) fn split_bracket(inner: &str) -> (&str, Option<&str>) {
    match inner.split_once('|') {
        Some((target, rest)) => (target.trim(), Some(rest.trim())),
        None => (inner.trim(), None),
    }
}

/// Extract forward links in order of appearance.
///
/// The target is the text before `|` when present, otherwise the whole
/// bracket content. Duplicates are kept (one entry per occurrence) and
/// empty targets are dropped.
pub fn extract_links(text: &str) -> Vec<NoteLink> {
    BRACKET_RE
        .captures_iter(text)
        .filter_map(|cap| {
            let (target, _) = split_bracket(cap.get(1)?.as_str());
            (!target.is_empty()).then(|| NoteLink::new(target))
        })
        .collect()
}
