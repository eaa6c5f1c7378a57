//! Credential routing and stream sources for Inkwell.
//!
//! The transport to the model is not part of this workspace: hosts supply
//! their own `inkwell_core::Provider`. This crate holds what sits around it:
//! the key router, the decoder for sources that signal errors in-band, and
//! a scripted provider for replays and tests.

pub mod marker;
pub mod router;
pub mod scripted;

pub use marker::{MarkerDecoder, STREAM_ERROR_MARKER, decode_legacy};
pub use router::{
    ChannelPrompter, CredentialPrompter, CredentialReply, CredentialRequest, KeyRouter,
    KeyRoutingDecision, KeyStore, MemoryKeyStore, build_from_config,
};
pub use scripted::{ScriptStep, ScriptedProvider};
