use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docdex_core::filter::SearchFilters;
use docdex_core::store::{DocumentStore, SledStore};
use docdex_service::{Engine, PlainTextExtractor};
use std::path::PathBuf;
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "docdex-indexer")]
#[command(about = "Ingest office documents and answer ranked queries", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk a directory tree and ingest every supported document
    Build {
        /// Root directory of the document corpus
        #[arg(long)]
        docs: PathBuf,
        /// Document store directory
        #[arg(long, default_value = "./docdex-store")]
        store: PathBuf,
    },
    /// Run a ranked lexical query against an existing store
    Query {
        /// Document store directory
        #[arg(long, default_value = "./docdex-store")]
        store: PathBuf,
        /// Search text
        #[arg(long)]
        q: String,
        /// Maximum results
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Filter: file extension without the dot (e.g. pdf)
        #[arg(long)]
        extension: Option<String>,
        /// Filter: taxonomy category
        #[arg(long)]
        category: Option<String>,
        /// Filter: project tag
        #[arg(long)]
        project: Option<String>,
        /// Filter: team tag
        #[arg(long)]
        team: Option<String>,
        /// Filter: modified on or after (RFC 3339)
        #[arg(long)]
        date_from: Option<String>,
        /// Filter: modified on or before (RFC 3339)
        #[arg(long)]
        date_to: Option<String>,
    },
    /// Print corpus statistics
    Stats {
        /// Document store directory
        #[arg(long, default_value = "./docdex-store")]
        store: PathBuf,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { docs, store } => build(docs, store),
        Commands::Query {
            store,
            q,
            limit,
            extension,
            category,
            project,
            team,
            date_from,
            date_to,
        } => {
            let filters = SearchFilters {
                extension,
                category,
                project,
                team,
                date_from: parse_ts(date_from.as_deref())?,
                date_to: parse_ts(date_to.as_deref())?,
            };
            query(store, &q, limit, &filters)
        }
        Commands::Stats { store } => stats(store),
    }
}

fn open_engine(docs: PathBuf, store: PathBuf) -> Result<Engine> {
    let store = SledStore::open(&store)?;
    Ok(Engine::new(docs, Arc::new(store), Arc::new(PlainTextExtractor)))
}

fn build(docs: PathBuf, store_dir: PathBuf) -> Result<()> {
    let store = Arc::new(SledStore::open(&store_dir)?);
    let engine = Engine::new(
        docs.clone(),
        Arc::clone(&store) as Arc<dyn DocumentStore>,
        Arc::new(PlainTextExtractor),
    );
    let report = engine.ingest_dir()?;
    for failure in &report.failures {
        tracing::warn!(path = %failure.path.display(), error = %failure.error, "skipped");
    }
    store.flush()?;
    let stats = engine.get_stats()?;
    tracing::info!(
        indexed = report.indexed,
        failed = report.failures.len(),
        total_documents = stats.total_documents,
        "build complete"
    );
    println!(
        "indexed {} documents ({} failures) from {}",
        report.indexed,
        report.failures.len(),
        docs.display()
    );
    Ok(())
}

fn query(store: PathBuf, q: &str, limit: usize, filters: &SearchFilters) -> Result<()> {
    // The corpus root is irrelevant for querying an existing store.
    let engine = open_engine(PathBuf::from("."), store)?;
    engine.rebuild_index()?;
    let results = engine.search(q, filters)?;

    for result in results.iter().take(limit) {
        let line = serde_json::json!({
            "score": result.score,
            "filename": result.record.filename,
            "path": result.record.rel_path,
            "categories": result.record.categories,
            "project": result.record.project,
            "team": result.record.team,
            "modified": format_ts(result.record.modified),
            "preview": result.record.preview,
        });
        println!("{line}");
    }
    tracing::info!(total_hits = results.len(), "query complete");
    Ok(())
}

fn stats(store: PathBuf) -> Result<()> {
    let engine = open_engine(PathBuf::from("."), store)?;
    let stats = engine.get_stats()?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

fn parse_ts(value: Option<&str>) -> Result<Option<i64>> {
    match value {
        None => Ok(None),
        Some(s) => {
            let dt = OffsetDateTime::parse(s, &Rfc3339)
                .with_context(|| format!("invalid RFC 3339 timestamp: {s}"))?;
            Ok(Some(dt.unix_timestamp()))
        }
    }
}

fn format_ts(secs: i64) -> String {
    OffsetDateTime::from_unix_timestamp(secs)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
        .unwrap_or_default()
}
