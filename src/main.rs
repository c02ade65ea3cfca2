//! `bylaw` command line: ingest policy documents into a vector index, then
//! answer questions grounded in what was indexed.

mod init;

use std::path::PathBuf;
use std::sync::Arc;

use bylaw_core::Settings;
use bylaw_ingest::IngestPipeline;
use bylaw_rag::{RagService, Retriever};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bylaw", about, version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to the settings file.
    #[arg(long, default_value = "bylaw.toml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Load, chunk, cluster, label, and upload policy documents.
    Ingest {
        /// Upload chunks from an existing backup instead of recomputing.
        #[arg(long)]
        reuse_backup: bool,
    },
    /// Answer a question from the indexed policies.
    Ask {
        /// The question to answer.
        question: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber();

    let cli = Cli::parse();
    let settings = Settings::load(&cli.config)?;

    match cli.command {
        Command::Ingest { reuse_backup } => run_ingest(&settings, reuse_backup).await,
        Command::Ask { question } => run_ask(&settings, &question).await,
    }
}

async fn run_ingest(settings: &Settings, reuse_backup: bool) -> anyhow::Result<()> {
    let provider = init::build_provider(settings);
    let index = init::build_index(settings, Arc::clone(&provider))?;
    let pipeline = IngestPipeline::new(provider, index, init::pipeline_config(settings));

    let report = pipeline.run(reuse_backup).await?;

    println!("Ingest finished in {} ms", report.elapsed_ms);
    println!("  documents loaded: {}", report.documents_loaded);
    println!("  chunks created:   {}", report.chunks_created);
    println!("  clusters labeled: {}", report.clusters_labeled);
    if report.backup_reused {
        println!("  chunks came from the existing backup");
    }
    for error in &report.file_errors {
        eprintln!("  skipped: {error}");
    }
    Ok(())
}

async fn run_ask(settings: &Settings, question: &str) -> anyhow::Result<()> {
    let provider = init::build_provider(settings);
    let index = init::build_index(settings, Arc::clone(&provider))?;
    let retriever = Retriever::new(index, init::retriever_config(settings));
    let service = RagService::new(provider, retriever);

    let answer = service.answer(question).await?;

    println!("{}", answer.text);
    if !answer.sources.is_empty() {
        println!("\nSources: {}", answer.sources.join(", "));
    }
    Ok(())
}

fn init_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
