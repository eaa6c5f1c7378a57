//! Key/model router — decides which credential a request carries.
//!
//! Three modes, from [`KeyMode`]:
//!
//! - **server default**: no client credential is sent;
//! - **stored**: the saved credential is used directly, and its absence
//!   fails the request before anything is sent;
//! - **prompt**: the request is suspended until the user submits or cancels
//!   a credential.
//!
//! Prompting is the pipeline's only interactive suspension point. Each
//! prompt owns its own one-shot channel, so concurrent requests waiting for
//! credentials never answer each other's prompts.

use async_trait::async_trait;
use inkwell_config::{AppConfig, KeyMode};
use inkwell_core::RouteError;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc, oneshot};
use tracing::{debug, info, warn};

/// The outcome of routing: which mode applied, the credential (if any), and
/// the model, which routing never changes.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyRoutingDecision {
    pub mode: KeyMode,
    pub resolved_key: Option<String>,
    pub model: String,
}

impl std::fmt::Debug for KeyRoutingDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyRoutingDecision")
            .field("mode", &self.mode)
            .field(
                "resolved_key",
                &self.resolved_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("model", &self.model)
            .finish()
    }
}

/// Where a saved credential lives.
#[async_trait]
pub trait KeyStore: Send + Sync {
    async fn load(&self) -> Option<String>;
    async fn save(&self, key: String);
}

/// A key store held in memory, seeded from configuration.
#[derive(Default)]
pub struct MemoryKeyStore {
    key: RwLock<Option<String>>,
}

impl MemoryKeyStore {
    pub fn new(key: Option<String>) -> Self {
        Self {
            key: RwLock::new(key),
        }
    }
}

#[async_trait]
impl KeyStore for MemoryKeyStore {
    async fn load(&self) -> Option<String> {
        self.key
            .read()
            .await
            .clone()
            .filter(|k| !k.trim().is_empty())
    }

    async fn save(&self, key: String) {
        *self.key.write().await = Some(key);
    }
}

/// The user's answer to a credential prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialReply {
    Submit { key: String, remember: bool },
    Cancel,
}

/// A pending credential prompt. Dropping it without answering counts as a
/// cancellation.
#[derive(Debug)]
pub struct CredentialRequest {
    pub model: String,
    responder: oneshot::Sender<CredentialReply>,
}

impl CredentialRequest {
    pub fn submit(self, key: impl Into<String>, remember: bool) {
        let _ = self.responder.send(CredentialReply::Submit {
            key: key.into(),
            remember,
        });
    }

    pub fn cancel(self) {
        let _ = self.responder.send(CredentialReply::Cancel);
    }
}

/// Shows the credential-entry affordance for a request.
pub trait CredentialPrompter: Send + Sync {
    fn request(&self, request: CredentialRequest);
}

/// Forwards credential prompts to a UI loop over a channel.
pub struct ChannelPrompter {
    tx: mpsc::UnboundedSender<CredentialRequest>,
}

impl ChannelPrompter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<CredentialRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl CredentialPrompter for ChannelPrompter {
    fn request(&self, request: CredentialRequest) {
        if self.tx.send(request).is_err() {
            // The returned request is dropped here, which cancels it.
            warn!("Credential prompt receiver is gone");
        }
    }
}

/// Routes requests to a credential according to the configured mode.
pub struct KeyRouter {
    mode: KeyMode,
    store: Arc<dyn KeyStore>,
    prompter: Option<Arc<dyn CredentialPrompter>>,
}

impl KeyRouter {
    pub fn new(mode: KeyMode, store: Arc<dyn KeyStore>) -> Self {
        Self {
            mode,
            store,
            prompter: None,
        }
    }

    /// Attach the prompter used in prompt mode.
    pub fn with_prompter(mut self, prompter: Arc<dyn CredentialPrompter>) -> Self {
        self.prompter = Some(prompter);
        self
    }

    pub fn mode(&self) -> KeyMode {
        self.mode
    }

    /// Decide the credential for a request to `model`.
    pub async fn route(&self, model: &str) -> Result<KeyRoutingDecision, RouteError> {
        let resolved_key = match self.mode {
            KeyMode::ServerDefault => None,
            KeyMode::Stored => {
                let key = self.store.load().await.ok_or_else(|| {
                    RouteError::NoUsableCredential("no stored API key".into())
                })?;
                Some(key)
            }
            KeyMode::Prompt => Some(self.acquire(model).await?),
        };

        debug!(mode = ?self.mode, model, has_key = resolved_key.is_some(), "Routed request");
        Ok(KeyRoutingDecision {
            mode: self.mode,
            resolved_key,
            model: model.to_string(),
        })
    }

    async fn acquire(&self, model: &str) -> Result<String, RouteError> {
        let prompter = self.prompter.as_ref().ok_or_else(|| {
            RouteError::NoUsableCredential("no credential prompt available".into())
        })?;

        let (responder, reply) = oneshot::channel();
        prompter.request(CredentialRequest {
            model: model.to_string(),
            responder,
        });

        match reply.await {
            Ok(CredentialReply::Submit { key, remember }) if !key.trim().is_empty() => {
                let key = key.trim().to_string();
                if remember {
                    self.store.save(key.clone()).await;
                    info!("Saved submitted API key");
                }
                Ok(key)
            }
            Ok(_) | Err(_) => Err(RouteError::CredentialAcquisitionCancelled),
        }
    }
}

/// Build a router from configuration, seeding the key store with the
/// configured key.
pub fn build_from_config(
    config: &AppConfig,
    prompter: Option<Arc<dyn CredentialPrompter>>,
) -> KeyRouter {
    let store = Arc::new(MemoryKeyStore::new(config.api_key.clone()));
    let router = KeyRouter::new(config.key_mode, store);
    match prompter {
        Some(p) => router.with_prompter(p),
        None => router,
    }
}
