//! Decoding for sources that signal errors in-band.
//!
//! Some backends have no error channel of their own: they send a chunk that
//! begins with [`STREAM_ERROR_MARKER`] and put an already-formatted message
//! after it. [`MarkerDecoder`] turns such raw chunks into tagged
//! [`StreamItem`]s at the transport boundary so nothing downstream ever
//! inspects string prefixes.

use inkwell_core::{ChunkReceiver, ProviderError, StreamItem};
use tokio::sync::mpsc;
use tracing::debug;

/// Reserved prefix marking a chunk as error payload.
pub const STREAM_ERROR_MARKER: &str = "__STREAM_ERROR__";

/// Stateful decoder for raw text chunks.
///
/// Once an error chunk is seen, everything after it (later chunks included)
/// is part of the failure and is discarded.
#[derive(Debug, Default)]
pub struct MarkerDecoder {
    errored: bool,
}

impl MarkerDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify one raw chunk. Returns `None` for chunks that arrive after
    /// an error.
    pub fn decode(&mut self, raw: &str) -> Option<StreamItem> {
        if self.errored {
            return None;
        }
        match raw.strip_prefix(STREAM_ERROR_MARKER) {
            Some(payload) => {
                self.errored = true;
                Some(StreamItem::Error(payload.to_string()))
            }
            None => Some(StreamItem::Text(raw.to_string())),
        }
    }

    pub fn is_errored(&self) -> bool {
        self.errored
    }
}

/// Wrap a raw-text chunk channel into a tagged one. The forwarding task
/// stops at the first error item or transport failure.
pub fn decode_legacy(mut raw: mpsc::Receiver<Result<String, ProviderError>>) -> ChunkReceiver {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut decoder = MarkerDecoder::new();
        while let Some(chunk) = raw.recv().await {
            let item = match chunk {
                Ok(text) => match decoder.decode(&text) {
                    Some(item) => Ok(item),
                    None => break,
                },
                Err(e) => Err(e),
            };
            let stop = !matches!(item, Ok(StreamItem::Text(_)));
            if tx.send(item).await.is_err() || stop {
                break;
            }
        }
        debug!(errored = decoder.is_errored(), "Legacy stream decoder finished");
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_chunks_are_text() {
        let mut decoder = MarkerDecoder::new();
        assert_eq!(
            decoder.decode("Once upon"),
            Some(StreamItem::Text("Once upon".into()))
        );
        assert!(!decoder.is_errored());
    }

    #[test]
    fn marker_turns_remainder_into_error_and_silences_the_rest() {
        let mut decoder = MarkerDecoder::new();
        let item = decoder.decode("__STREAM_ERROR__**Quota exceeded** try later");
        assert_eq!(
            item,
            Some(StreamItem::Error("**Quota exceeded** try later".into()))
        );
        assert_eq!(decoder.decode("more text"), None);
        assert!(decoder.is_errored());
    }

    #[test]
    fn payload_whitespace_is_kept() {
        let mut decoder = MarkerDecoder::new();
        assert_eq!(
            decoder.decode("__STREAM_ERROR__    code block\n"),
            Some(StreamItem::Error("    code block\n".into()))
        );
    }

    #[test]
    fn marker_only_counts_at_chunk_start() {
        let mut decoder = MarkerDecoder::new();
        let raw = "quoted __STREAM_ERROR__ inside";
        assert_eq!(decoder.decode(raw), Some(StreamItem::Text(raw.into())));
    }

    #[tokio::test]
    async fn legacy_channel_stops_after_error() {
        let (tx, raw) = mpsc::channel(8);
        for chunk in ["Hello ", "world", "__STREAM_ERROR__boom", "ignored"] {
            tx.send(Ok(chunk.to_string())).await.unwrap();
        }
        drop(tx);

        let mut rx = decode_legacy(raw);
        let mut items = Vec::new();
        while let Some(item) = rx.recv().await {
            items.push(item.unwrap());
        }
        assert_eq!(
            items,
            vec![
                StreamItem::Text("Hello ".into()),
                StreamItem::Text("world".into()),
                StreamItem::Error("boom".into()),
            ]
        );
    }
}
