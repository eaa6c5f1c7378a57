//! Draft session — runs one request end to end.
//!
//! A run goes through, in order:
//!
//! 1. the input rules (ceiling, then non-empty), failing before any request
//! 2. credential routing, which may suspend on a prompt
//! 3. prompt assembly from a snapshot of the corpus
//! 4. streaming, with live `Render` events
//! 5. on completion: resolution, one history append, vocabulary merge
//!
//! Persisted state (history and vocabulary) changes only when a stream
//! completes without error.

use inkwell_config::AppConfig;
use inkwell_core::{
    ChatTurn, Corpus, CorpusError, CorpusItem, DraftError, Provider, ProviderRequest, RouteError,
    VocabularyStore,
};
use inkwell_corpus::extract_vocabulary;
use inkwell_providers::KeyRouter;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::context::{AssembledPrompt, AssemblyInput, AssemblyMetadata, ChatHistory, ContextAssembler};
use crate::mode::OperationMode;
use crate::resolver::{ResolvedResponse, resolve};
use crate::stream::{StreamConsumer, StreamFailure, StreamOutcome};
use crate::stream_event::{DraftEvent, FailureKind};

/// Where a session sends its events.
pub type EventSink = mpsc::UnboundedSender<DraftEvent>;

/// One request from the writer.
#[derive(Debug, Clone)]
pub struct DraftRequest {
    pub instruction: String,
    pub mode: OperationMode,
    pub project_id: Option<String>,
    /// Explicitly selected note or lore ids.
    pub references: Vec<String>,
}

impl DraftRequest {
    pub fn new(instruction: impl Into<String>, mode: OperationMode) -> Self {
        Self {
            instruction: instruction.into(),
            mode,
            project_id: None,
            references: Vec::new(),
        }
    }

    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_references(mut self, ids: Vec<String>) -> Self {
        self.references = ids;
        self
    }
}

/// A completed run.
#[derive(Debug, Clone)]
pub struct DraftOutcome {
    pub request_id: String,
    pub response: ResolvedResponse,
    /// The settled response text before resolution.
    pub raw: String,
    /// Whether the exchange was appended to chat history.
    pub recorded: bool,
    /// Words the vocabulary did not know before.
    pub new_words: usize,
    pub metadata: AssemblyMetadata,
}

/// Why a run ended without a response.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Corpus(#[from] CorpusError),

    #[error("{0}")]
    Stream(#[from] StreamFailure),
}

/// Orchestrates draft requests against one chat history.
pub struct DraftSession {
    provider: Arc<dyn Provider>,
    router: Arc<KeyRouter>,
    corpus: Arc<dyn Corpus>,
    vocabulary: Arc<dyn VocabularyStore>,
    assembler: ContextAssembler,
    history: Arc<Mutex<ChatHistory>>,
    model: String,
    temperature: f32,
}

impl DraftSession {
    /// Create a session with limits, model and temperature from `config`.
    pub fn new(
        provider: Arc<dyn Provider>,
        router: Arc<KeyRouter>,
        corpus: Arc<dyn Corpus>,
        vocabulary: Arc<dyn VocabularyStore>,
        config: &AppConfig,
    ) -> Self {
        Self {
            provider,
            router,
            corpus,
            vocabulary,
            assembler: ContextAssembler::new(config.limits.clone()),
            history: Arc::new(Mutex::new(ChatHistory::new(config.limits.max_exchanges))),
            model: config.default_model.clone(),
            temperature: config.default_temperature,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// A copy of the stored chat turns.
    pub async fn history(&self) -> Vec<ChatTurn> {
        self.history.lock().await.turns().to_vec()
    }

    pub async fn clear_history(&self) {
        self.history.lock().await.clear();
        debug!("Chat history cleared");
    }

    /// Run a request to completion.
    pub async fn run(
        &self,
        request: DraftRequest,
        events: &EventSink,
    ) -> Result<DraftOutcome, SessionError> {
        self.run_with_cancel(request, events, CancellationToken::new())
            .await
    }

    /// Run a request that `cancel` can stop between chunks.
    pub async fn run_with_cancel(
        &self,
        request: DraftRequest,
        events: &EventSink,
        cancel: CancellationToken,
    ) -> Result<DraftOutcome, SessionError> {
        let request_id = Uuid::new_v4().to_string();
        info!(
            request_id = %request_id,
            mode = %request.mode,
            chars = request.instruction.chars().count(),
            "Processing draft request"
        );

        if let Err(e) = self.assembler.check_input(&request.instruction, request.mode) {
            warn!(request_id = %request_id, error = %e, "Rejected draft input");
            let _ = events.send(DraftEvent::Error {
                message: e.to_string(),
                kind: FailureKind::Input,
            });
            return Err(e.into());
        }

        let decision = match self.router.route(&self.model).await {
            Ok(d) => d,
            Err(e) => {
                warn!(request_id = %request_id, error = %e, "No credential for request");
                let _ = events.send(DraftEvent::Notice {
                    message: e.to_string(),
                });
                return Err(e.into());
            }
        };

        let assembled = self.assemble(&request).await?;

        let window = {
            let mut history = self.history.lock().await;
            if history.switch_mode(request.mode) {
                info!(mode = %request.mode, "Mode changed, chat history cleared");
            }
            history.window_with(ChatTurn::user(assembled.prompt.clone()))
        };

        let provider_request = ProviderRequest {
            model: decision.model.clone(),
            api_key: decision.resolved_key.clone(),
            system: assembled.system.clone(),
            turns: window,
            temperature: self.temperature,
        };
        debug!(
            request_id = %request_id,
            provider = self.provider.name(),
            turns = provider_request.turns.len(),
            "Sending request"
        );
        let _ = events.send(DraftEvent::Started {
            request_id: request_id.clone(),
            mode: request.mode,
        });

        let source = match self.provider.stream(provider_request).await {
            Ok(rx) => rx,
            Err(e) => {
                warn!(request_id = %request_id, error = %e, "Provider refused the stream");
                return Err(self.report_failure(StreamFailure::Transport(e), events));
            }
        };

        let mut consumer = StreamConsumer::with_cancel(cancel);
        let outcome = consumer.consume(source, Some(events)).await;
        consumer.reset();

        let text = match outcome {
            StreamOutcome::Completed { text } => text,
            StreamOutcome::Errored { failure, partial } => {
                debug!(request_id = %request_id, partial_chars = partial.len(), "Discarding partial response");
                return Err(self.report_failure(failure, events));
            }
        };

        let response = resolve(&text);
        let recorded = !response.is_placeholder;
        if recorded {
            self.history.lock().await.push_exchange(
                ChatTurn::user(assembled.prompt.clone()),
                ChatTurn::model(text.clone()),
            );
        }
        let new_words = self.merge_vocabulary(&text).await;

        info!(
            request_id = %request_id,
            chars = text.len(),
            structured = response.structured.is_some(),
            placeholder = response.is_placeholder,
            new_words,
            "Draft completed"
        );
        let _ = events.send(DraftEvent::Done {
            request_id: request_id.clone(),
            prose: response.prose.clone(),
            structured: response.structured.clone(),
            placeholder: response.is_placeholder,
        });

        Ok(DraftOutcome {
            request_id,
            response,
            raw: text,
            recorded,
            new_words,
            metadata: assembled.metadata,
        })
    }

    /// Assemble the prompt for a request from a corpus snapshot.
    pub async fn assemble(&self, request: &DraftRequest) -> Result<AssembledPrompt, SessionError> {
        let project_id = request.project_id.as_deref();
        let project = match project_id {
            Some(id) => self.corpus.project(id).await?,
            None => None,
        };
        let candidates = if request.mode.is_context_grounded() {
            self.corpus.items(project_id).await?
        } else {
            Vec::new()
        };
        let references = self.resolve_references(&request.references).await?;

        Ok(self.assembler.assemble(&AssemblyInput {
            instruction: &request.instruction,
            mode: request.mode,
            project: project.as_ref(),
            corpus: &candidates,
            references: &references,
        })?)
    }

    async fn resolve_references(&self, ids: &[String]) -> Result<Vec<CorpusItem>, CorpusError> {
        let mut items = Vec::with_capacity(ids.len());
        for id in ids {
            match self.corpus.item(id).await? {
                Some(item) => items.push(item),
                None => warn!(reference_id = %id, "Skipping unknown reference"),
            }
        }
        Ok(items)
    }

    async fn merge_vocabulary(&self, text: &str) -> usize {
        let words = extract_vocabulary(text);
        if words.is_empty() {
            return 0;
        }
        match self.vocabulary.merge(words).await {
            Ok(n) => n,
            Err(e) => {
                warn!("Vocabulary merge failed: {e}");
                0
            }
        }
    }

    fn report_failure(&self, failure: StreamFailure, events: &EventSink) -> SessionError {
        let _ = events.send(DraftEvent::Error {
            message: failure.display_message(),
            kind: failure.kind(),
        });
        failure.into()
    }
}
