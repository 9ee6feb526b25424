//! `arxiv-corpus`: inspect an arXiv bulk source mirror from the command line.

use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use arxiv_corpus::config::CorpusConfig;
use arxiv_corpus::corpus::RandomAccessCorpus;
use arxiv_corpus::extract::ArchiveTextExtractor;
use arxiv_corpus::logging::{init_logging, verbosity_filter};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "arxiv-corpus")]
#[command(about = "Index and extract papers from an arXiv bulk source mirror")]
#[command(version)]
struct Cli {
    /// Corpus root (defaults to $ARXIV_DATASET_PATH)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the total number of papers listed in the manifest
    Len,

    /// Print the entry name of the paper at a global index
    Get {
        /// Global index; negative values count from the end
        #[arg(allow_negative_numbers = true)]
        index: i64,
    },

    /// Print the archive and offset owning a global index
    Locate {
        /// Global index; negative values count from the end
        #[arg(allow_negative_numbers = true)]
        index: i64,
    },

    /// List manifest descriptors in chronological order as JSON lines
    Archives,

    /// Extract every main.tex as JSON lines
    Extract {
        /// Walk archives newest first
        #[arg(long)]
        reverse: bool,

        /// Stop after this many records
        #[arg(long)]
        limit: Option<u64>,

        /// Directory holding the top-level archives (defaults to the root)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match cli.root {
        Some(root) => CorpusConfig::with_root(root),
        None => CorpusConfig::from_env().context("no corpus root given")?,
    };
    if cli.verbose > 0 {
        config.log_level = verbosity_filter(cli.verbose).to_owned();
    }
    init_logging(&config.log_level);

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match cli.command {
        Commands::Len => {
            let corpus = open_corpus(&config)?;
            writeln!(out, "{}", corpus.len())?;
        }

        Commands::Get { index } => {
            let corpus = open_corpus(&config)?;
            let name = corpus
                .get(index)
                .with_context(|| format!("failed to resolve index {index}"))?;
            writeln!(out, "{name}")?;
        }

        Commands::Locate { index } => {
            let corpus = open_corpus(&config)?;
            let global = arxiv_manifest::index::normalize_index(index, corpus.len())?;
            let location = corpus.index().locate(global)?;
            let line = serde_json::json!({
                "index": global,
                "archive": location.descriptor.filename,
                "position": location.position,
                "offset": location.offset,
            });
            writeln!(out, "{line}")?;
        }

        Commands::Archives => {
            let corpus = open_corpus(&config)?;
            for descriptor in corpus.index().descriptors() {
                writeln!(out, "{}", serde_json::to_string(descriptor)?)?;
            }
        }

        Commands::Extract {
            reverse,
            limit,
            dir,
        } => {
            let dir = dir.unwrap_or_else(|| config.root.clone());
            let mut records = ArchiveTextExtractor::new(&config)
                .extract(&dir, reverse)
                .with_context(|| format!("failed to list archives in {}", dir.display()))?;

            while limit.map_or(true, |limit| records.stats().records < limit) {
                let Some((key, record)) = records.next() else {
                    break;
                };
                let line = serde_json::json!({
                    "key": key,
                    "id": record.id,
                    "source": record.source,
                    "content": record.content,
                });
                writeln!(out, "{line}")?;
            }

            let stats = records.stats();
            tracing::info!(
                records = stats.records,
                archives = stats.archives_opened,
                skipped_entries = stats.entries_skipped,
                skipped_archives = stats.archives_skipped,
                "extraction finished"
            );
        }
    }

    out.flush()?;
    Ok(())
}

fn open_corpus(config: &CorpusConfig) -> Result<RandomAccessCorpus> {
    RandomAccessCorpus::open(config)
        .with_context(|| format!("failed to open corpus at {}", config.root.display()))
}
