//! Lore notations: bracket form `[[Title|Type]]` and mention form `@Name`.

use crate::links::{BRACKET_RE, split_bracket};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// `@` followed by word/hyphen characters. The leading group rejects an `@`
/// glued to a preceding word character, so e-mail addresses are skipped.
static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^\w@])@([\w-]+)").expect("mention pattern is valid"));

/// The fixed set of worldbuilding record kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoreType {
    Character,
    Place,
    Item,
    #[default]
    Concept,
    Event,
}

impl LoreType {
    pub const ALL: [LoreType; 5] = [
        LoreType::Character,
        LoreType::Place,
        LoreType::Item,
        LoreType::Concept,
        LoreType::Event,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Character => "Character",
            Self::Place => "Place",
            Self::Item => "Item",
            Self::Concept => "Concept",
            Self::Event => "Event",
        }
    }

    /// Parse a type token case-insensitively. Unknown tokens fall back to
    /// [`LoreType::Concept`] instead of failing.
    pub fn from_token(token: &str) -> Self {
        let token = token.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(token))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for LoreType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lore reference declared inline in text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoreNotation {
    pub title: String,
    pub lore_type: LoreType,
}

impl LoreNotation {
    pub fn new(title: impl Into<String>, lore_type: LoreType) -> Self {
        Self {
            title: title.into(),
            lore_type,
        }
    }
}

/// Names mentioned with `@`, in order, one per occurrence.
pub fn extract_mentions(text: &str) -> Vec<String> {
    MENTION_RE
        .captures_iter(text)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Extract lore notations.
///
/// Two independent passes are accumulated into one list: all bracket
/// notations first (in order), then all mentions (in order). A bracket
/// without a type, or with a type outside [`LoreType`], is a `Concept`.
/// Mentions are always `Character`.
pub fn extract_lore_notations(text: &str) -> Vec<LoreNotation> {
    let mut out: Vec<LoreNotation> = BRACKET_RE
        .captures_iter(text)
        .filter_map(|cap| {
            let (title, kind) = split_bracket(cap.get(1)?.as_str());
            if title.is_empty() {
                return None;
            }
            let lore_type = kind.map(LoreType::from_token).unwrap_or_default();
            Some(LoreNotation::new(title, lore_type))
        })
        .collect();

    out.extend(
        extract_mentions(text)
            .into_iter()
            .map(|name| LoreNotation::new(name, LoreType::Character)),
    );
    out
}
