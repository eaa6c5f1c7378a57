//! Inkwell CLI — the operator surface over the drafting pipeline.
//!
//! Commands:
//! - `parse`     — Show the links, lore notations and cues in a file
//! - `backlinks` — List notes that link to a note
//! - `prompt`    — Print the prompt a request would send
//! - `resolve`   — Split a saved response into prose and structured parts
//! - `draft`     — Run a full request against a replayed response
//! - `config`    — Show, validate or initialise configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "inkwell",
    about = "Inkwell — notes, lore and AI-assisted drafting",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the links, lore notations and structured cues in a file
    Parse {
        /// Markdown file to parse
        file: PathBuf,
    },

    /// List the notes that link to a note
    Backlinks {
        /// Title of the target note
        title: String,

        /// Notes directory (defaults to `notes_dir` from config)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Print the assembled prompt for an instruction
    Prompt {
        /// The instruction, as typed
        instruction: String,

        #[command(flatten)]
        request: commands::RequestArgs,
    },

    /// Split a response into prose and a structured block
    Resolve {
        /// File holding the settled response text
        file: PathBuf,
    },

    /// Run the full drafting pipeline against a replayed response
    Draft {
        /// The instruction, as typed
        #[arg(default_value = "")]
        instruction: String,

        #[command(flatten)]
        request: commands::RequestArgs,

        /// Chunk script to replay: one chunk per line, `\n` for newlines
        #[arg(long)]
        replay: PathBuf,

        /// Vocabulary file (defaults to ~/.inkwell/vocabulary.txt)
        #[arg(long)]
        vocabulary: Option<PathBuf>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Validate the configuration file
    Validate,
    /// Print the config file path
    Path,
    /// Write a default config file if none exists
    Init,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so command output stays clean
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Parse { file } => commands::parse::run(&file).await?,
        Commands::Backlinks { title, dir } => commands::backlinks::run(&title, dir).await?,
        Commands::Prompt {
            instruction,
            request,
        } => commands::prompt::run(&instruction, request).await?,
        Commands::Resolve { file } => commands::resolve::run(&file).await?,
        Commands::Draft {
            instruction,
            request,
            replay,
            vocabulary,
        } => commands::draft::run(&instruction, request, &replay, vocabulary).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Validate => commands::config_cmd::validate().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
            ConfigAction::Init => commands::config_cmd::init().await?,
        },
    }

    Ok(())
}
