//! # Inkwell Core
//!
//! Domain types, traits, and error definitions for the Inkwell drafting
//! workbench. This crate defines the domain model that every other crate
//! implements against.
//!
//! ## Design Philosophy
//!
//! Every collaborator the pipeline talks to is a trait here: the model
//! transport ([`Provider`]), the note/lore store ([`Corpus`]), the
//! vocabulary set ([`VocabularyStore`]) and the markdown renderer
//! ([`MarkdownRenderer`]). Implementations live in their own crates or in
//! the host application.

pub mod corpus;
pub mod error;
pub mod message;
pub mod note;
pub mod provider;
pub mod render;

// Re-export key types at crate root for ergonomics
pub use corpus::{Corpus, CorpusItem, VocabularyStore};
pub use error::{CorpusError, DraftError, ProviderError, RouteError};
pub use message::{ChatTurn, TurnRole};
pub use note::{LoreEntry, Note, Project};
pub use provider::{ChunkReceiver, Provider, ProviderRequest, StreamItem};
pub use render::MarkdownRenderer;

pub use inkwell_notation::{LoreNotation, LoreType, NoteLink};
