//! `inkwell draft` — Run the full pipeline against a replayed response.
//!
//! The replay file stands in for the model: each line is one chunk, with
//! `\n` for a newline and `\\` for a backslash. A line starting with the
//! legacy error marker ends the stream with an error, as a live backend
//! would.

use inkwell_agent::{DraftEvent, DraftSession};
use inkwell_config::{AppConfig, KeyMode};
use inkwell_corpus::FileVocabulary;
use inkwell_providers::{ChannelPrompter, CredentialPrompter, ScriptedProvider, build_from_config};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use super::{RequestArgs, load_config, load_corpus};

pub async fn run(
    instruction: &str,
    args: RequestArgs,
    replay: &Path,
    vocabulary: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let project = args.project();
    let corpus = load_corpus(args.dir.clone(), &config, project.as_ref()).await?;
    let request = args.to_request(instruction, &corpus, project.as_ref()).await;

    let script = std::fs::read_to_string(replay)
        .map_err(|e| format!("Failed to read replay {}: {e}", replay.display()))?;
    let provider = Arc::new(ScriptedProvider::legacy_chunks(&parse_script(&script)));

    let vocabulary_path =
        vocabulary.unwrap_or_else(|| AppConfig::config_dir().join("vocabulary.txt"));
    let vocabulary = Arc::new(FileVocabulary::new(vocabulary_path));

    let router = build_from_config(&config, stdin_prompter(&config));
    let session = DraftSession::new(provider, Arc::new(router), corpus, vocabulary, &config);

    let (tx, rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(print_events(rx));
    let result = session.run(request, &tx).await;
    drop(tx);
    let _ = printer.await;

    let outcome = result?;
    eprintln!();
    eprintln!(
        "  {} chars, {} new words, {}",
        outcome.raw.chars().count(),
        outcome.new_words,
        if outcome.recorded {
            "recorded in history"
        } else {
            "not recorded"
        }
    );
    Ok(())
}

/// Split a replay script into chunks.
pub fn parse_script(script: &str) -> Vec<String> {
    script
        .lines()
        .filter(|line| !line.is_empty())
        .map(unescape)
        .collect()
}

fn unescape(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// In prompt mode, ask for the key on stdin. An empty line cancels.
fn stdin_prompter(config: &AppConfig) -> Option<Arc<dyn CredentialPrompter>> {
    if config.key_mode != KeyMode::Prompt {
        return None;
    }
    let (prompter, mut requests) = ChannelPrompter::new();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(request) = requests.recv().await {
            eprint!("  API key for {} (empty to cancel): ", request.model);
            let _ = std::io::stderr().flush();
            match lines.next_line().await {
                Ok(Some(key)) if !key.trim().is_empty() => request.submit(key, false),
                _ => request.cancel(),
            }
        }
    });
    let prompter: Arc<dyn CredentialPrompter> = Arc::new(prompter);
    Some(prompter)
}

async fn print_events(mut rx: mpsc::UnboundedReceiver<DraftEvent>) {
    let mut shown = 0;
    while let Some(event) = rx.recv().await {
        let _ = write_event(&event, &mut shown, &mut std::io::stdout(), &mut std::io::stderr());
    }
}

/// Write one event: streamed text and prose to `out`, status to `status`.
/// `shown` tracks how much of the rendered text is already on `out`.
fn write_event(
    event: &DraftEvent,
    shown: &mut usize,
    out: &mut impl Write,
    status: &mut impl Write,
) -> std::io::Result<()> {
    match event {
        DraftEvent::Started { mode, .. } => writeln!(status, "  [{mode}]")?,
        DraftEvent::Render { content } => {
            write!(out, "{}", content.get(*shown..).unwrap_or_default())?;
            out.flush()?;
            *shown = content.len();
        }
        DraftEvent::Error { message, .. } => {
            writeln!(out)?;
            writeln!(status, "  [Error] {message}")?;
        }
        DraftEvent::Notice { message } => writeln!(status, "  [Notice] {message}")?,
        // The streamed text already holds any structured block
        DraftEvent::Done {
            prose,
            structured,
            placeholder,
            ..
        } => {
            writeln!(out)?;
            if *placeholder {
                writeln!(out, "{prose}")?;
            }
            if let Some(block) = structured {
                writeln!(status, "  [structured block, {} chars]", block.chars().count())?;
            }
        }
    }
    Ok(())
}
