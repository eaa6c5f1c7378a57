//! Scripted provider — replays prepared chunk sequences.
//!
//! Each call to `stream` consumes the next script. Used by tests and by the
//! CLI's replay mode, where a recorded response stands in for a live model.

use async_trait::async_trait;
use inkwell_core::{ChunkReceiver, Provider, ProviderError, ProviderRequest, StreamItem};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

use crate::marker::MarkerDecoder;

/// One step of a script.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Emit a tagged chunk.
    Item(StreamItem),
    /// Fail the transport.
    Fail(ProviderError),
    /// Wait before the next step.
    Delay(Duration),
    /// Stop emitting but keep the stream open, like a stalled backend.
    Stall,
}

/// A provider whose responses are prepared in advance.
pub struct ScriptedProvider {
    scripts: Mutex<VecDeque<Vec<ScriptStep>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(scripts: Vec<Vec<ScriptStep>>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A single response made of plain text chunks.
    pub fn text_chunks(chunks: &[&str]) -> Self {
        Self::new(vec![
            chunks
                .iter()
                .map(|c| ScriptStep::Item(StreamItem::Text((*c).to_string())))
                .collect(),
        ])
    }

    /// A single response made of raw chunks that may carry the legacy
    /// error marker.
    pub fn legacy_chunks<S: AsRef<str>>(chunks: &[S]) -> Self {
        let mut decoder = MarkerDecoder::new();
        let steps = chunks
            .iter()
            .filter_map(|c| decoder.decode(c.as_ref()))
            .map(ScriptStep::Item)
            .collect();
        Self::new(vec![steps])
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn remaining(&self) -> usize {
        self.scripts.lock().map(|s| s.len()).unwrap_or_default()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn stream(&self, request: ProviderRequest) -> Result<ChunkReceiver, ProviderError> {
        let script = {
            let mut scripts = self
                .scripts
                .lock()
                .map_err(|_| ProviderError::NotConfigured("script lock poisoned".into()))?;
            scripts
                .pop_front()
                .ok_or_else(|| ProviderError::NotConfigured("no scripted response left".into()))?
        };
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        debug!(steps = script.len(), "Replaying scripted stream");
        let (tx, rx) = mpsc::channel(4);
        tokio::spawn(async move {
            for step in script {
                match step {
                    ScriptStep::Item(item) => {
                        if tx.send(Ok(item)).await.is_err() {
                            return;
                        }
                    }
                    ScriptStep::Fail(e) => {
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                    ScriptStep::Delay(d) => tokio::time::sleep(d).await,
                    ScriptStep::Stall => {
                        tx.closed().await;
                        return;
                    }
                }
            }
        });
        Ok(rx)
    }
}
