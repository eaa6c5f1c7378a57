//! Draft events — what a session reports to the host while it runs.
//!
//! `DraftEvent` is the surface a UI subscribes to:
//! - `started`  — the request passed its checks and is being sent
//! - `render`   — the full response text so far, re-rendered per chunk
//! - `error`    — the request failed; shown inline, styled as an error
//! - `notice`   — a credential problem; no request was sent
//! - `done`     — the response settled and was resolved

use serde::{Deserialize, Serialize};

use crate::mode::OperationMode;

/// How a request failed, for styling and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The input broke a pre-request rule.
    Input,
    /// The backend reported an error inside the stream.
    InStream,
    /// The connection to the backend failed.
    Transport,
    /// The request was cancelled between chunks.
    Cancelled,
}

/// Events emitted by a draft session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DraftEvent {
    Started {
        request_id: String,
        mode: OperationMode,
    },

    /// The whole accumulated text, not a delta.
    Render { content: String },

    Error { message: String, kind: FailureKind },

    Notice { message: String },

    Done {
        request_id: String,
        prose: String,
        structured: Option<String>,
        placeholder: bool,
    },
}

impl DraftEvent {
    /// Event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::Render { .. } => "render",
            Self::Error { .. } => "error",
            Self::Notice { .. } => "notice",
            Self::Done { .. } => "done",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Error { .. } | Self::Notice { .. } | Self::Done { .. })
    }
}
