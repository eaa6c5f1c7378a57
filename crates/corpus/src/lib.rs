//! Corpus implementations for Inkwell: the note/lore store, the link graph
//! over notes, lore auto-creation, and the vocabulary set.

pub mod graph;
pub mod in_memory;
pub mod lore_sync;
pub mod markdown_dir;
pub mod vocabulary;

pub use graph::{LinkIndex, ResolvedLink, backlinks, resolve_links};
pub use in_memory::InMemoryCorpus;
pub use lore_sync::{LoreIndex, LoreKey, LoreSync};
pub use markdown_dir::load_notes_dir;
pub use vocabulary::{FileVocabulary, InMemoryVocabulary, extract_vocabulary};
