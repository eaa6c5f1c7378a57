//! Provider trait — the abstraction over the generative-model transport.
//!
//! A Provider takes an assembled request and hands back an ordered stream
//! of tagged chunks. How it reaches the model is its own business; the rest
//! of Inkwell only sees the channel.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::ProviderError;
use crate::message::ChatTurn;

/// The receiving end of a chunk stream. Closing the channel without an
/// error item means the stream completed normally.
pub type ChunkReceiver = mpsc::Receiver<Result<StreamItem, ProviderError>>;

/// A request ready to go to the model.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// Model identifier, passed through routing unchanged
    pub model: String,

    /// Client credential; `None` means the server default is used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// System instruction for the selected operation mode
    pub system: String,

    /// History window followed by the new user turn
    pub turns: Vec<ChatTurn>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_temperature() -> f32 {
    0.7
}

impl std::fmt::Debug for ProviderRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRequest")
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("system", &self.system)
            .field("turns", &self.turns.len())
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// One item of a model stream.
///
/// Errors travel in-band as their own variant rather than as a string
/// prefix on a content chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "text", rename_all = "snake_case")]
pub enum StreamItem {
    /// Content to append to the response.
    Text(String),
    /// Backend-signaled failure; the payload is already displayable.
    Error(String),
}

/// The core Provider trait.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider.
    fn name(&self) -> &str;

    /// Send a request and get a stream of tagged chunks.
    async fn stream(&self, request: ProviderRequest) -> Result<ChunkReceiver, ProviderError>;
}
