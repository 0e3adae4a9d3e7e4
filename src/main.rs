//! nextword-rs CLI application
//!
//! Command-line interface for the nextword-rs library.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use nextword_rs::{
    BatchRegistry, Config, IngestionPipeline, NextwordError, PositionalStore, QueryEngine, utils,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "nextword-rs")]
#[command(about = "Index annotated conversation corpora and find the words that follow a keyword")]
#[command(version)]
struct Cli {
    /// Database file (overrides storage.database_path from the config)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest document folders, one batch per folder
    Ingest {
        /// Folder(s) of JSON dialogue records
        #[arg(required = true)]
        dirs: Vec<PathBuf>,
    },

    /// Show the words that most often follow a keyword
    Query {
        /// Keyword, matched exactly
        keyword: String,

        /// Number of successors to return
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List ingested batches
    Batches {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Delete a batch and all of its tokens
    Delete {
        /// Batch id (the source folder name)
        batch_id: String,
    },

    /// Show store statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    utils::ensure_parent_directory(&config.storage.database_path)?;
    let store = Arc::new(
        PositionalStore::open_with_config(&config.storage).with_context(|| {
            format!(
                "Failed to open store {}",
                config.storage.database_path.display()
            )
        })?,
    );

    let outcome = match cli.command {
        Commands::Ingest { dirs } => ingest_command(Arc::clone(&store), &config, dirs).await,
        Commands::Query {
            keyword,
            top_k,
            json,
        } => query_command(&store, &config, &keyword, top_k, json),
        Commands::Batches { json } => batches_command(&store, json),
        Commands::Delete { batch_id } => delete_command(&store, &batch_id),
        Commands::Stats => stats_command(&store),
    };

    if let Ok(store) = Arc::try_unwrap(store) {
        store.close()?;
    }

    outcome
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(db) = &cli.db {
        config.storage.database_path = db.clone();
    }
    config.validate()?;
    Ok(config)
}

async fn ingest_command(
    store: Arc<PositionalStore>,
    config: &Config,
    dirs: Vec<PathBuf>,
) -> anyhow::Result<()> {
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    )?
    .progress_chars("#>-");

    let mut failed_runs = 0;

    for dir in dirs {
        println!("📂 Ingesting: {}", dir.display());

        let bar = ProgressBar::new(0);
        bar.set_style(style.clone());

        let worker_store = Arc::clone(&store);
        let worker_config = config.clone();
        let worker_bar = bar.clone();
        let worker_dir = dir.clone();

        let outcome = tokio::task::spawn_blocking(move || {
            IngestionPipeline::new(&worker_store, &worker_config).run_with_progress(
                &worker_dir,
                |progress| {
                    worker_bar.set_length(progress.files_total as u64);
                    worker_bar.set_position(progress.files_processed as u64);
                    let name = progress
                        .path
                        .file_name()
                        .map(|name| name.to_string_lossy().to_string())
                        .unwrap_or_default();
                    worker_bar.set_message(format!("{:>3.0}% {}", progress.percent(), name));
                },
            )
        })
        .await
        .context("Ingestion worker panicked")?;

        bar.finish_and_clear();

        match outcome {
            Ok(summary) => {
                if summary.is_complete() {
                    println!("✅ Batch '{}' ingested", summary.batch_id);
                } else {
                    println!("⚠️  Batch '{}' stopped early", summary.batch_id);
                    failed_runs += 1;
                }
                println!("   📄 Documents: {}", summary.documents_ingested);
                println!("   🔤 Tokens: {}", summary.tokens_inserted);
                println!("   ❌ Failed: {}", summary.documents_failed);
                println!("   ⏱️  Time: {:.2}s", summary.elapsed_secs);

                for error in &summary.errors {
                    eprintln!("   - {}", error);
                }
                if let Some(e) = &summary.aborted {
                    eprintln!("   Storage failure: {}", e);
                }
            }
            Err(NextwordError::DuplicateBatch(batch_id)) => {
                eprintln!(
                    "❌ Batch '{}' already exists. Delete it first: nextword-rs delete \"{}\"",
                    batch_id, batch_id
                );
                failed_runs += 1;
            }
            Err(e) => {
                eprintln!("❌ Failed to ingest {}: {}", dir.display(), e);
                failed_runs += 1;
            }
        }
    }

    if failed_runs > 0 {
        bail!("{} ingestion run(s) did not complete", failed_runs);
    }
    Ok(())
}

fn query_command(
    store: &PositionalStore,
    config: &Config,
    keyword: &str,
    top_k: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    let engine = QueryEngine::new(store, config);
    let report = engine.report(keyword, top_k)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("🔍 '{}' occurs {} times", report.keyword, report.occurrences);
    if report.successors.is_empty() {
        println!("❌ No following words found");
        return Ok(());
    }

    for (i, entry) in report.successors.iter().enumerate() {
        println!("{}. {} ({})", i + 1, entry.word, entry.count);
    }
    Ok(())
}

fn batches_command(store: &PositionalStore, json: bool) -> anyhow::Result<()> {
    let batches = BatchRegistry::new(store).details()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&batches)?);
        return Ok(());
    }

    if batches.is_empty() {
        println!("No batches ingested yet");
        return Ok(());
    }

    for batch in &batches {
        let created = batch
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  [{}]  {} documents, {} tokens, created {}",
            batch.batch_id, batch.status, batch.document_count, batch.token_count, created
        );
    }
    Ok(())
}

fn delete_command(store: &PositionalStore, batch_id: &str) -> anyhow::Result<()> {
    if BatchRegistry::new(store).delete(batch_id)? {
        println!("🗑️  Deleted batch '{}'", batch_id);
    } else {
        println!("Batch '{}' does not exist", batch_id);
    }
    Ok(())
}

fn stats_command(store: &PositionalStore) -> anyhow::Result<()> {
    let stats = store.stats()?;
    println!("📊 Batches: {}", stats.batch_count);
    println!("   📄 Documents: {}", stats.document_count);
    println!("   🔤 Tokens: {}", stats.token_count);
    println!("   📚 Distinct words: {}", stats.distinct_words);
    let location = store
        .path()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| ":memory:".to_string());
    println!(
        "   💾 Database: {} ({})",
        location,
        utils::format_file_size(stats.file_size_bytes as u64)
    );
    Ok(())
}
