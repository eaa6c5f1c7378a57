//! Error types for the Inkwell domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own enum; the session layer aggregates them.

use thiserror::Error;

/// Failures raised by the model transport. The stream consumer surfaces all
/// of these as a generic transport failure.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Credential routing failures. Both abort the request before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("No usable credential: {0}")]
    NoUsableCredential(String),

    #[error("Credential entry was cancelled")]
    CredentialAcquisitionCancelled,
}

/// Pre-request validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("Instruction is too long: {len} characters (max {max})")]
    InputTooLarge { len: usize, max: usize },

    #[error("Instruction is empty")]
    EmptyInput,
}

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),
}
