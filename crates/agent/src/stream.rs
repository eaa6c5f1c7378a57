//! Stream consumer — turns a chunk source into live text and an outcome.
//!
//! ```text
//! Idle ──consume──▶ Streaming ──▶ Completed
//!                       │
//!                       └──────▶ Errored
//! Completed | Errored ──reset──▶ Idle
//! ```
//!
//! Chunks are pulled one at a time. Text is appended and the whole
//! accumulator is re-rendered after each chunk. An error item ends the
//! stream with its payload, and anything after it is discarded. A transport
//! failure ends it with a generic message. Cancellation is honoured while
//! waiting for a chunk, never in the middle of one.

use inkwell_core::{ChunkReceiver, ProviderError, StreamItem};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::stream_event::{DraftEvent, FailureKind};

/// Where the consumer is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Streaming,
    Completed,
    Errored,
}

/// Why a stream ended without completing.
#[derive(Debug, Clone, Error)]
pub enum StreamFailure {
    /// The backend's own error content, shown as is.
    #[error("{0}")]
    InStream(String),

    #[error("Transport failure: {0}")]
    Transport(ProviderError),

    #[error("Cancelled")]
    Cancelled,
}

impl StreamFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InStream(_) => FailureKind::InStream,
            Self::Transport(_) => FailureKind::Transport,
            Self::Cancelled => FailureKind::Cancelled,
        }
    }

    /// The message shown to the writer.
    pub fn display_message(&self) -> String {
        match self {
            Self::InStream(payload) => payload.clone(),
            Self::Transport(_) => {
                "The connection to the model failed. Please try again.".to_string()
            }
            Self::Cancelled => "Generation was cancelled.".to_string(),
        }
    }
}

/// How a consumed stream ended.
#[derive(Debug, Clone)]
pub enum StreamOutcome {
    Completed { text: String },
    Errored { failure: StreamFailure, partial: String },
}

/// Consumes one stream at a time.
#[derive(Debug)]
pub struct StreamConsumer {
    state: StreamState,
    text: String,
    chunks: usize,
    cancel: CancellationToken,
}

impl Default for StreamConsumer {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamConsumer {
    pub fn new() -> Self {
        Self {
            state: StreamState::Idle,
            text: String::new(),
            chunks: 0,
            cancel: CancellationToken::new(),
        }
    }

    /// A consumer that stops when `cancel` fires. Clones of one token may
    /// be shared by any number of consumers.
    pub fn with_cancel(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            ..Self::new()
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// The text accumulated so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// A handle that cancels this consumer's current or next stream.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Return to `Idle`. Handles taken before the reset stop having any
    /// effect.
    pub fn reset(&mut self) {
        self.state = StreamState::Idle;
        self.text.clear();
        self.chunks = 0;
        self.cancel = CancellationToken::new();
    }

    /// Pull the stream to its end, emitting a `Render` event after every
    /// text chunk when a sink is given.
    pub async fn consume(
        &mut self,
        mut source: ChunkReceiver,
        events: Option<&mpsc::UnboundedSender<DraftEvent>>,
    ) -> StreamOutcome {
        if self.state != StreamState::Idle {
            warn!(state = ?self.state, "Consumer reused without reset");
            self.reset();
        }
        self.state = StreamState::Streaming;

        loop {
            if self.cancel.is_cancelled() {
                return self.fail(StreamFailure::Cancelled);
            }

            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    return self.fail(StreamFailure::Cancelled);
                }
                next = source.recv() => next,
            };

            match next {
                Some(Ok(StreamItem::Text(chunk))) => {
                    self.chunks += 1;
                    self.text.push_str(&chunk);
                    if let Some(tx) = events {
                        let _ = tx.send(DraftEvent::Render {
                            content: self.text.clone(),
                        });
                    }
                }
                Some(Ok(StreamItem::Error(payload))) => {
                    return self.fail(StreamFailure::InStream(payload));
                }
                Some(Err(e)) => {
                    warn!(error = %e, "Stream transport failed");
                    return self.fail(StreamFailure::Transport(e));
                }
                None => {
                    self.state = StreamState::Completed;
                    debug!(chunks = self.chunks, chars = self.text.len(), "Stream completed");
                    return StreamOutcome::Completed {
                        text: self.text.clone(),
                    };
                }
            }
        }
    }

    fn fail(&mut self, failure: StreamFailure) -> StreamOutcome {
        self.state = StreamState::Errored;
        debug!(chunks = self.chunks, kind = ?failure.kind(), "Stream errored");
        StreamOutcome::Errored {
            failure,
            partial: self.text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn source(items: Vec<Result<StreamItem, ProviderError>>) -> ChunkReceiver {
        let (tx, rx) = mpsc::channel(items.len().max(1));
        for item in items {
            tx.try_send(item).unwrap();
        }
        rx
    }

    fn text(t: &str) -> Result<StreamItem, ProviderError> {
        Ok(StreamItem::Text(t.into()))
    }

    #[tokio::test]
    async fn completes_when_the_source_ends() {
        let (tx, mut events) = mpsc::unbounded_channel();
        let mut consumer = StreamConsumer::new();
        let outcome = consumer
            .consume(source(vec![text("Once "), text("upon")]), Some(&tx))
            .await;

        assert!(matches!(outcome, StreamOutcome::Completed { ref text } if text == "Once upon"));
        assert_eq!(consumer.state(), StreamState::Completed);

        let renders: Vec<_> = std::iter::from_fn(|| events.try_recv().ok()).collect();
        assert_eq!(
            renders,
            vec![
                DraftEvent::Render {
                    content: "Once ".into()
                },
                DraftEvent::Render {
                    content: "Once upon".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn error_item_stops_the_stream_with_its_payload() {
        let mut consumer = StreamConsumer::new();
        let outcome = consumer
            .consume(
                source(vec![
                    text("a"),
                    text("b"),
                    Ok(StreamItem::Error("**Rate limited**".into())),
                    text("never shown"),
                ]),
                None,
            )
            .await;

        match outcome {
            StreamOutcome::Errored { failure, partial } => {
                assert_eq!(failure.display_message(), "**Rate limited**");
                assert_eq!(partial, "ab");
            }
            other => panic!("expected error, got {other:?}"),
        }
        assert_eq!(consumer.state(), StreamState::Errored);
        assert_eq!(consumer.text(), "ab");
    }

    #[tokio::test]
    async fn transport_failure_is_generic() {
        let mut consumer = StreamConsumer::new();
        let outcome = consumer
            .consume(
                source(vec![text("a"), Err(ProviderError::Network("reset".into()))]),
                None,
            )
            .await;
        let StreamOutcome::Errored { failure, .. } = outcome else {
            panic!("expected error");
        };
        assert_eq!(failure.kind(), FailureKind::Transport);
        assert!(!failure.display_message().contains("reset"));
    }

    #[tokio::test]
    async fn cancel_wakes_a_stalled_stream() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(text("partial")).await.unwrap();

        let mut consumer = StreamConsumer::new();
        let handle = consumer.cancel_handle();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.cancel();
        });

        let outcome = consumer.consume(rx, None).await;
        let StreamOutcome::Errored { failure, partial } = outcome else {
            panic!("expected cancellation");
        };
        assert!(matches!(failure, StreamFailure::Cancelled));
        assert_eq!(partial, "partial");
        drop(tx);
    }

    #[tokio::test]
    async fn one_token_cancels_every_consumer_sharing_it() {
        let token = CancellationToken::new();
        let (tx_a, rx_a) = mpsc::channel(1);
        let (tx_b, rx_b) = mpsc::channel(1);

        let mut a = StreamConsumer::with_cancel(token.clone());
        let mut b = StreamConsumer::with_cancel(token.clone());
        let a = tokio::spawn(async move { a.consume(rx_a, None).await });
        let b = tokio::spawn(async move { b.consume(rx_b, None).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();

        for task in [a, b] {
            let outcome = tokio::time::timeout(Duration::from_millis(500), task)
                .await
                .expect("consumer stayed in Streaming after cancel")
                .unwrap();
            assert!(matches!(
                outcome,
                StreamOutcome::Errored {
                    failure: StreamFailure::Cancelled,
                    ..
                }
            ));
        }
        drop((tx_a, tx_b));
    }

    #[tokio::test]
    async fn reset_returns_to_idle_with_a_fresh_handle() {
        let mut consumer = StreamConsumer::new();
        consumer.cancel_handle().cancel();
        let outcome = consumer.consume(source(vec![text("x")]), None).await;
        assert!(matches!(outcome, StreamOutcome::Errored { .. }));

        consumer.reset();
        assert_eq!(consumer.state(), StreamState::Idle);
        assert_eq!(consumer.text(), "");

        let outcome = consumer.consume(source(vec![text("x")]), None).await;
        assert!(matches!(outcome, StreamOutcome::Completed { .. }));
    }
}
