//! Relevance sampling over the corpus.
//!
//! Notes and lore compete in one ranking. Each instruction keyword found in
//! an item's title scores 3, and each found in its content scores 1. Ties
//! go to the most recently updated item, then to the title.

use inkwell_core::CorpusItem;
use inkwell_corpus::extract_vocabulary;

const TITLE_WEIGHT: usize = 3;
const CONTENT_WEIGHT: usize = 1;

/// Keywords used for relevance: distinct lowercased words of three or more
/// characters.
pub fn keywords(instruction: &str) -> Vec<String> {
    extract_vocabulary(instruction)
}

/// Relevance of one item to a keyword set.
pub fn score(item: &CorpusItem, keywords: &[String]) -> usize {
    let title = item.title().to_lowercase();
    let content = item.content().to_lowercase();
    keywords
        .iter()
        .map(|k| {
            let mut s = 0;
            if title.contains(k.as_str()) {
                s += TITLE_WEIGHT;
            }
            if content.contains(k.as_str()) {
                s += CONTENT_WEIGHT;
            }
            s
        })
        .sum()
}

/// The `limit` most relevant items for `instruction`, best first.
pub fn sample<'a>(items: &'a [CorpusItem], instruction: &str, limit: usize) -> Vec<&'a CorpusItem> {
    if limit == 0 {
        return Vec::new();
    }
    let keywords = keywords(instruction);
    let mut ranked: Vec<(usize, &CorpusItem)> =
        items.iter().map(|item| (score(item, &keywords), item)).collect();
    ranked.sort_by(|(sa, a), (sb, b)| {
        sb.cmp(sa)
            .then_with(|| b.updated_at().cmp(&a.updated_at()))
            .then_with(|| a.title().cmp(b.title()))
    });
    ranked.into_iter().take(limit).map(|(_, item)| item).collect()
}

/// Cut `text` to at most `cap` characters. A cut is marked with an
/// ellipsis, which counts toward the cap.
pub fn truncate_chars(text: &str, cap: usize) -> String {
    let text = text.trim();
    if text.chars().nth(cap).is_none() {
        return text.to_string();
    }
    if cap == 0 {
        return String::new();
    }
    let cut = text
        .char_indices()
        .nth(cap - 1)
        .map_or(text.len(), |(byte_idx, _)| byte_idx);
    format!("{}…", text[..cut].trim_end())
}
