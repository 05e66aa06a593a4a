use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use search_core::builder::DEFAULT_CHECKPOINT_EVERY;
use search_core::capture::{dedup_capture_log, read_capture_log, FirstSeen};
use search_core::persist::IndexPaths;
use search_core::{IndexBuilder, IndexService, PinTable, RawDocument};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query the TF-IDF inverted index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drop repeated URLs from a raw capture log, first occurrence wins
    Dedup {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Build (or resume) the index from a capture log file or a directory of them
    Build {
        /// Input path (.jsonl file or directory)
        #[arg(long)]
        input: PathBuf,
        /// Output index directory
        #[arg(long, default_value = "./index")]
        output: PathBuf,
        /// Write a checkpoint after this many newly indexed documents
        #[arg(long, default_value_t = DEFAULT_CHECKPOINT_EVERY)]
        checkpoint_every: usize,
        /// Ignore any existing snapshot in the output directory
        #[arg(long, default_value_t = false)]
        fresh: bool,
    },
    /// Run one query against a built index
    Search {
        #[arg(long, default_value = "./index")]
        index: PathBuf,
        #[arg(long, default_value_t = 10)]
        top_n: usize,
        /// JSON file of pinned results
        #[arg(long)]
        pins: Option<PathBuf>,
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
}

fn main() -> Result<ExitCode> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Dedup { input, output } => {
            let stats = dedup_capture_log(&input, &output)
                .with_context(|| format!("deduplicating {}", input.display()))?;
            println!("Original: {} lines", stats.total);
            println!("Deduplicated: {} lines", stats.unique);
            println!("Removed {} duplicates", stats.removed);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Build { input, output, checkpoint_every, fresh } => {
            build_index(&input, &output, checkpoint_every, fresh)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Search { index, top_n, pins, query } => search(&index, top_n, pins.as_deref(), &query.join(" ")),
    }
}

fn capture_files(input: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && p.extension().and_then(|s| s.to_str()) == Some("jsonl") {
                files.push(p.to_path_buf());
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    }
    files
}

fn build_index(input: &Path, output: &Path, checkpoint_every: usize, fresh: bool) -> Result<()> {
    let files = capture_files(input);
    if files.is_empty() {
        anyhow::bail!("no capture logs found at {}", input.display());
    }
    let mut builder = IndexBuilder::open(IndexPaths::new(output), checkpoint_every, fresh)
        .with_context(|| format!("opening index at {}", output.display()))?;

    let mut upstream_dupes = 0;
    for file in files {
        tracing::info!(file = %file.display(), "ingesting capture log");
        let mut records = FirstSeen::new(read_capture_log(&file)?);
        for rec in records.by_ref() {
            let rec = rec?;
            builder.ingest(RawDocument {
                doc_id_hint: None,
                url: rec.url,
                title: rec.title,
                body: rec.text.unwrap_or_default(),
            })?;
        }
        upstream_dupes += records.removed();
    }

    let summary = builder.finish()?;
    tracing::info!(
        indexed = summary.indexed,
        skipped_seen = summary.duplicates,
        skipped_capture_dupes = upstream_dupes,
        docs = summary.documents,
        terms = summary.terms,
        output = %output.display(),
        "index build complete"
    );
    println!("Finished! Indexed {} documents ({} total)", summary.indexed, summary.documents);
    println!("Vocabulary size: {} unique words", summary.terms);
    Ok(())
}

fn search(index: &Path, top_n: usize, pins: Option<&Path>, query: &str) -> Result<ExitCode> {
    let pins = match pins {
        Some(p) => PinTable::from_path(p).with_context(|| format!("loading pins from {}", p.display()))?,
        None => PinTable::disabled(),
    };
    let service = IndexService::open(IndexPaths::new(index), pins)
        .with_context(|| format!("loading index from {}", index.display()))?;
    println!("Total documents: {}", service.stats().documents);

    let results = service.query(query, top_n);
    if results.is_empty() {
        println!("No results found.");
        return Ok(ExitCode::FAILURE);
    }
    println!("\nFound {} results:\n", results.len());
    for (i, r) in results.iter().enumerate() {
        println!("{}. {}", i + 1, r.title.as_deref().unwrap_or(&r.url));
        println!("   {}", r.url);
        println!("   Score: {:.2}\n", r.score);
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use search_core::persist::load_snapshot;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn build_walks_directory_and_dedups_capture() {
        let dir = tempdir().unwrap();
        let logs = dir.path().join("logs");
        fs::create_dir_all(logs.join("nested")).unwrap();
        fs::write(
            logs.join("a.jsonl"),
            "{\"url\": \"https://a.com\", \"title\": \"Cats are great\", \"text\": \"Cats love naps\"}\n\
             {\"url\": \"https://a.com\", \"title\": \"Cats again\", \"text\": \"ignored\"}\n",
        )
        .unwrap();
        fs::write(logs.join("nested/b.jsonl"), "{\"url\": \"https://b.com\", \"title\": null, \"text\": \"Dogs love walks\"}\n").unwrap();
        fs::write(logs.join("notes.txt"), "not a capture log").unwrap();

        let out = dir.path().join("index");
        build_index(&logs, &out, 100, false).unwrap();
        let (index, docs) = load_snapshot(&IndexPaths::new(&out)).unwrap();
        assert_eq!(docs.len(), 2);
        assert!(index.postings("ignored").is_none());
        assert_eq!(docs.get(0).unwrap().url, "https://a.com");

        // Second run over the same logs adds nothing.
        build_index(&logs, &out, 100, false).unwrap();
        assert_eq!(load_snapshot(&IndexPaths::new(&out)).unwrap().1.len(), 2);
    }

    #[test]
    fn build_requires_capture_logs() {
        let dir = tempdir().unwrap();
        assert!(build_index(&dir.path().join("missing"), &dir.path().join("index"), 100, false).is_err());
    }

    #[test]
    fn cli_requires_a_query() {
        assert!(Cli::try_parse_from(["indexer", "search"]).is_err());
        assert!(Cli::try_parse_from(["indexer", "search", "feel", "good"]).is_ok());
    }
}
