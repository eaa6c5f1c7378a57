//! End-to-end integration tests for the Inkwell drafting pipeline.
//!
//! These tests exercise the full path from note text and instructions to
//! resolved responses: notation parsing, the link graph, lore creation,
//! context assembly, credential routing, stream consumption and resolution.

use std::sync::Arc;

use inkwell_agent::{
    DraftEvent, DraftRequest, DraftSession, FailureKind, OperationMode, SessionError,
    StreamFailure,
};
use inkwell_config::{AppConfig, KeyMode};
use inkwell_core::{Corpus, LoreType, Note, Project, StreamItem, VocabularyStore};
use inkwell_corpus::{
    FileVocabulary, InMemoryCorpus, InMemoryVocabulary, LoreSync, backlinks, load_notes_dir,
};
use inkwell_providers::{
    ChannelPrompter, KeyRouter, MemoryKeyStore, ScriptStep, ScriptedProvider, build_from_config,
};
use tokio::sync::mpsc;

// ── Helpers ──────────────────────────────────────────────────────────────

fn config(max_exchanges: usize) -> AppConfig {
    let mut config = AppConfig::default();
    config.limits.max_exchanges = max_exchanges;
    config
}

fn text_script(chunks: &[&str]) -> Vec<ScriptStep> {
    chunks
        .iter()
        .map(|c| ScriptStep::Item(StreamItem::Text((*c).to_string())))
        .collect()
}

fn server_router() -> Arc<KeyRouter> {
    Arc::new(build_from_config(&AppConfig::default(), None))
}

fn session_with(
    provider: Arc<ScriptedProvider>,
    corpus: Arc<InMemoryCorpus>,
    vocabulary: Arc<dyn VocabularyStore>,
    config: &AppConfig,
) -> DraftSession {
    DraftSession::new(provider, server_router(), corpus, vocabulary, config)
}

fn drain(rx: &mut mpsc::UnboundedReceiver<DraftEvent>) -> Vec<DraftEvent> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

// ── Notation and graph ───────────────────────────────────────────────────

#[tokio::test]
async fn e2e_saving_a_note_creates_typed_lore() {
    let corpus = Arc::new(InMemoryCorpus::new());
    let sync = LoreSync::new(corpus.clone(), true);

    let note = Note::new(
        "Chapter 1",
        "Meet [[Kara|Character]] at [[The Docks]]. @Finn waves.",
    )
    .with_project("saltwind");
    let (saved, created) = sync.save_note(note).await.unwrap();

    let titles: Vec<_> = saved.links().iter().map(|l| l.target_title.as_str()).collect();
    assert_eq!(titles, vec!["Kara", "The Docks"]);

    let typed: Vec<_> = created
        .iter()
        .map(|e| (e.title.as_str(), e.lore_type))
        .collect();
    assert_eq!(
        typed,
        vec![
            ("Kara", LoreType::Character),
            ("The Docks", LoreType::Concept),
            ("Finn", LoreType::Character),
        ]
    );

    // Saving again finds the existing entries
    let (_, again) = sync.save_note(saved).await.unwrap();
    assert!(again.is_empty());
    assert_eq!(corpus.lore(Some("saltwind")).await.unwrap().len(), 3);
}

#[tokio::test]
async fn e2e_backlinks_follow_edits() {
    let corpus = InMemoryCorpus::new();
    let target = corpus.save_note(Note::new("Harbour", "salt")).await.unwrap();
    let mut a = corpus
        .save_note(Note::new("Scene A", "Down to the [[Harbour]]."))
        .await
        .unwrap();
    corpus
        .save_note(Note::new("Scene B", "The [[harbour|Place]] at night."))
        .await
        .unwrap();
    corpus
        .save_note(Note::new("Scene C", "Nowhere near it."))
        .await
        .unwrap();

    let titles = |notes: Vec<Note>| {
        let mut t: Vec<_> = notes.into_iter().map(|n| n.title).collect();
        t.sort();
        t
    };
    assert_eq!(
        titles(corpus.backlinks(&target.id).await.unwrap()),
        vec!["Scene A", "Scene B"]
    );

    a.set_content("No links any more.");
    corpus.save_note(a).await.unwrap();
    assert_eq!(
        titles(corpus.backlinks(&target.id).await.unwrap()),
        vec!["Scene B"]
    );

    // The index agrees with a plain scan
    let notes = corpus.notes(None).await.unwrap();
    let scanned: Vec<_> = backlinks(&notes, &target).into_iter().cloned().collect();
    assert_eq!(titles(scanned), vec!["Scene B"]);
}

// ── Full pipeline ────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_error_marker_ends_the_request_without_side_effects() {
    let provider = Arc::new(ScriptedProvider::legacy_chunks(&[
        "Hello ",
        "world",
        "__STREAM_ERROR__ **Quota exceeded.** Try again later.",
        "ignored",
    ]));
    let corpus = Arc::new(InMemoryCorpus::new());
    let vocabulary = Arc::new(InMemoryVocabulary::new());
    let session = session_with(provider, corpus, vocabulary.clone(), &config(10));
    let (tx, mut rx) = mpsc::unbounded_channel();

    let err = session
        .run(DraftRequest::new("Open the chapter", OperationMode::Draft), &tx)
        .await
        .unwrap_err();
    match err {
        SessionError::Stream(StreamFailure::InStream(payload)) => {
            assert_eq!(payload, " **Quota exceeded.** Try again later.");
        }
        other => panic!("unexpected error: {other}"),
    }

    let events = drain(&mut rx);
    let renders: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            DraftEvent::Render { content } => Some(content.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(renders, vec!["Hello ", "Hello world"]);
    assert!(events.iter().any(|e| matches!(
        e,
        DraftEvent::Error {
            kind: FailureKind::InStream,
            message,
        } if message == " **Quota exceeded.** Try again later."
    )));
    assert!(!events.iter().any(|e| matches!(e, DraftEvent::Done { .. })));

    assert!(session.history().await.is_empty());
    assert!(vocabulary.words().await.unwrap().is_empty());
}

#[tokio::test]
async fn e2e_history_keeps_the_last_exchanges() {
    let scripts = (1..=5)
        .map(|i| text_script(&[format!("reply {i}").as_str()]))
        .collect();
    let provider = Arc::new(ScriptedProvider::new(scripts));
    let session = session_with(
        provider.clone(),
        Arc::new(InMemoryCorpus::new()),
        Arc::new(InMemoryVocabulary::new()),
        &config(2),
    );
    let (tx, _rx) = mpsc::unbounded_channel();

    for i in 1..=5 {
        session
            .run(
                DraftRequest::new(format!("ask {i}"), OperationMode::Brainstorm),
                &tx,
            )
            .await
            .unwrap();
    }

    let history = session.history().await;
    let texts: Vec<_> = history.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, vec!["ask 4", "reply 4", "ask 5", "reply 5"]);

    // Every request window stayed within the bound
    for request in provider.requests() {
        assert!(request.turns.len() <= 2 * 2);
    }
}

#[tokio::test]
async fn e2e_subtasks_resolve_to_structured_json() {
    let provider = Arc::new(ScriptedProvider::text_chunks(&[
        "Three passes will finish the revision.\n\n",
        "```json\n[{\"title\": \"Reread\", \"estimate_minutes\": 30},",
        " {\"title\": \"Cut\", \"estimate_minutes\": 45}]\n```\n",
    ]));
    let session = session_with(
        provider.clone(),
        Arc::new(InMemoryCorpus::new()),
        Arc::new(InMemoryVocabulary::new()),
        &config(10),
    );
    let (tx, mut rx) = mpsc::unbounded_channel();

    let outcome = session
        .run(
            DraftRequest::new("Revise chapter two", OperationMode::Subtasks),
            &tx,
        )
        .await
        .unwrap();

    assert_eq!(
        outcome.response.prose,
        "Three passes will finish the revision."
    );
    let tasks = outcome.response.structured_json().unwrap();
    assert_eq!(tasks.as_array().unwrap().len(), 2);
    assert_eq!(tasks[1]["title"], "Cut");

    let sent = &provider.requests()[0];
    assert!(sent.turns[0].text.contains("```json"));
    assert_eq!(sent.system, OperationMode::Subtasks.system_instruction());

    match drain(&mut rx).last() {
        Some(DraftEvent::Done { structured, .. }) => assert!(structured.is_some()),
        other => panic!("expected done, got {other:?}"),
    }
}

#[tokio::test]
async fn e2e_notes_directory_feeds_the_prompt() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("01-harbour.md"),
        "# The Harbour\nFog rolls in while [[Kara|Character]] waits.",
    )
    .unwrap();
    std::fs::write(dir.path().join("02-market.md"), "Spice stalls and gulls.").unwrap();

    let project = Project::new("Saltwind");
    let corpus = Arc::new(InMemoryCorpus::new());
    corpus.add_project(project.clone()).await;
    let sync = LoreSync::new(corpus.clone(), true);
    for note in load_notes_dir(dir.path()).unwrap() {
        sync.save_note(note.with_project(project.id.clone()))
            .await
            .unwrap();
    }
    assert!(corpus.note_by_title("02-market").await.is_some());

    let provider = Arc::new(ScriptedProvider::text_chunks(&["The fog lifts."]));
    let session = session_with(
        provider.clone(),
        corpus.clone(),
        Arc::new(InMemoryVocabulary::new()),
        &config(10),
    );
    let harbour = corpus.note_by_title("the harbour").await.unwrap();
    let (tx, _rx) = mpsc::unbounded_channel();

    session
        .run(
            DraftRequest::new("Kara at the harbour\n- Tone: quiet", OperationMode::Draft)
                .with_project(project.id.clone())
                .with_references(vec![harbour.id.clone()]),
            &tx,
        )
        .await
        .unwrap();

    let prompt = &provider.requests()[0].turns[0].text;
    assert!(prompt.starts_with("Kara at the harbour"));
    assert!(prompt.contains("[Structured Cues]"));
    assert!(prompt.contains("[Project Context]\nProject: Saltwind"));
    assert!(prompt.contains("[Lore/Character] Kara"));
    assert!(prompt.contains("[Selected References]\n- [Note] The Harbour:"));
}

#[tokio::test]
async fn e2e_prompt_mode_sends_the_submitted_key() {
    let (prompter, mut prompts) = ChannelPrompter::new();
    let router = Arc::new(
        KeyRouter::new(KeyMode::Prompt, Arc::new(MemoryKeyStore::new(None)))
            .with_prompter(Arc::new(prompter)),
    );
    let provider = Arc::new(ScriptedProvider::text_chunks(&["ok"]));
    let session = DraftSession::new(
        provider.clone(),
        router,
        Arc::new(InMemoryCorpus::new()),
        Arc::new(InMemoryVocabulary::new()),
        &config(10),
    );

    tokio::spawn(async move {
        let request = prompts.recv().await.unwrap();
        request.submit("sk-from-prompt", false);
        // A second prompt is cancelled
        prompts.recv().await.unwrap().cancel();
    });

    let (tx, mut rx) = mpsc::unbounded_channel();
    session
        .run(DraftRequest::new("Go", OperationMode::Draft), &tx)
        .await
        .unwrap();
    assert_eq!(
        provider.requests()[0].api_key.as_deref(),
        Some("sk-from-prompt")
    );

    let err = session
        .run(DraftRequest::new("Again", OperationMode::Draft), &tx)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Route(_)));
    assert_eq!(provider.requests().len(), 1);
    assert!(
        drain(&mut rx)
            .iter()
            .any(|e| matches!(e, DraftEvent::Notice { .. }))
    );
}

#[tokio::test]
async fn e2e_independent_sessions_share_the_vocabulary() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vocabulary.txt");
    let vocabulary: Arc<dyn VocabularyStore> = Arc::new(FileVocabulary::new(path.clone()));
    let corpus = Arc::new(InMemoryCorpus::new());

    let drafting = session_with(
        Arc::new(ScriptedProvider::text_chunks(&["Kara sails north."])),
        corpus.clone(),
        vocabulary.clone(),
        &config(10),
    );
    let planning = session_with(
        Arc::new(ScriptedProvider::text_chunks(&["ตลาดน้ำ first, then sails."])),
        corpus,
        vocabulary.clone(),
        &config(10),
    );

    let (tx, _rx) = mpsc::unbounded_channel();
    let (a, b) = tokio::join!(
        drafting.run(DraftRequest::new("Set sail", OperationMode::Draft), &tx),
        planning.run(DraftRequest::new("Plan the trip", OperationMode::Subtasks), &tx),
    );
    a.unwrap();
    b.unwrap();

    let words = vocabulary.words().await.unwrap();
    for w in ["kara", "sails", "north", "ตลาดน้ำ", "first", "then"] {
        assert!(words.contains(&w.to_string()), "missing {w}");
    }
    assert_eq!(words.iter().filter(|w| *w == "sails").count(), 1);

    let reloaded = FileVocabulary::new(path);
    assert_eq!(reloaded.words().await.unwrap().len(), words.len());
}

#[tokio::test]
async fn e2e_oversize_input_never_reaches_the_provider() {
    let provider = Arc::new(ScriptedProvider::text_chunks(&["unused"]));
    let mut cfg = config(10);
    cfg.limits.max_input_chars = 10;
    let session = session_with(
        provider.clone(),
        Arc::new(InMemoryCorpus::new()),
        Arc::new(InMemoryVocabulary::new()),
        &cfg,
    );
    let (tx, mut rx) = mpsc::unbounded_channel();

    let err = session
        .run(
            DraftRequest::new("far too long an instruction", OperationMode::Draft),
            &tx,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Draft(_)));
    assert!(provider.requests().is_empty());
    assert!(matches!(
        drain(&mut rx).as_slice(),
        [DraftEvent::Error {
            kind: FailureKind::Input,
            ..
        }]
    ));
}
