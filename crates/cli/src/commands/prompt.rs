//! `inkwell prompt` — Print the prompt a request would send, without
//! sending it.

use inkwell_agent::{AssemblyMetadata, DraftSession};
use inkwell_config::AppConfig;
use inkwell_corpus::InMemoryVocabulary;
use inkwell_providers::{ScriptedProvider, build_from_config};
use std::sync::Arc;

use super::{RequestArgs, load_config, load_corpus};

pub async fn run(instruction: &str, args: RequestArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let project = args.project();
    let corpus = load_corpus(args.dir.clone(), &config, project.as_ref()).await?;
    let request = args.to_request(instruction, &corpus, project.as_ref()).await;

    // Assembly only reads the corpus; the provider is never called.
    let session = DraftSession::new(
        Arc::new(ScriptedProvider::new(Vec::new())),
        Arc::new(build_from_config(&config, None)),
        corpus,
        Arc::new(InMemoryVocabulary::new()),
        &config,
    );

    let assembled = session.assemble(&request).await?;

    println!("── system ──");
    println!("{}", assembled.system);
    println!();
    println!("── prompt ──");
    println!("{}", assembled.prompt);
    println!();
    print_metadata(&config, &assembled.metadata);
    Ok(())
}

fn print_metadata(config: &AppConfig, meta: &AssemblyMetadata) {
    eprintln!(
        "  {} chars total (instruction {}, cues {}, project {}, references {})",
        meta.total_chars(),
        meta.instruction_chars,
        meta.cues_chars,
        meta.project_chars,
        meta.references_chars
    );
    eprintln!(
        "  sampled {}/{} items, {} references",
        meta.sampled_ids.len(),
        config.limits.sample_count,
        meta.reference_ids.len()
    );
}
