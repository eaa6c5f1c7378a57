//! # Inkwell Notation
//!
//! Extracts the inline notations Inkwell understands from free-form text:
//!
//! - **Links**: `[[Title]]` and `[[Title|Display]]`
//! - **Lore notations**: `[[Title|Type]]` and `@Name` mentions
//! - **Structured cues**: `# ` titles, `## ` sections and `- Label: value`
//!   lines with bilingual (English/Thai) labels
//!
//! This is the leaf of the dependency graph. Every function here is pure and
//! deterministic: parsing the same text twice yields identical output.

pub mod cues;
pub mod links;
pub mod lore;

pub use cues::{StructuredCues, extract_cues};
pub use links::{NoteLink, extract_links};
pub use lore::{LoreNotation, LoreType, extract_lore_notations, extract_mentions};
