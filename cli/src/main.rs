use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use mdsearch_core::config::{clamp_limit, LoaderConfig, DEFAULT_EXTENSIONS, DEFAULT_LIMIT, DEFAULT_PREVIEW_CHARS, FILENAME_FIELD, CONTENT_FIELD};
use mdsearch_core::loader::{load_directory, load_jsonl, LoadReport};
use mdsearch_core::preview::preview;
use mdsearch_core::{markdown_schema, DocumentStore, Index, Query, Schema};
use tracing_subscriber::{fmt, EnvFilter};

use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mdsearch")]
#[command(about = "Search a Markdown documentation tree with TF-IDF ranking", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CorpusArgs {
    /// Corpus root directory
    #[arg(long, default_value = ".")]
    root: PathBuf,
    /// File extensions to index (repeatable)
    #[arg(long = "ext")]
    extensions: Vec<String>,
    /// Read documents from a JSON Lines file instead of a directory.
    /// Without --text-field/--keyword-field the rows need `content` and a
    /// `filename`, like Markdown files
    #[arg(long, conflicts_with = "root")]
    jsonl: Option<PathBuf>,
    /// Scored text field (repeatable); replaces the content/filename schema
    #[arg(long = "text-field")]
    text_fields: Vec<String>,
    /// Exact-match keyword field (repeatable); replaces the content/filename schema
    #[arg(long = "keyword-field")]
    keyword_fields: Vec<String>,
}

impl CorpusArgs {
    /// Markdown schema unless fields were declared on the command line.
    fn schema(&self) -> Schema {
        if self.text_fields.is_empty() && self.keyword_fields.is_empty() {
            return markdown_schema();
        }
        let schema = self.text_fields.iter().fold(Schema::new(), |s, f| s.text_field(f.as_str()));
        self.keyword_fields.iter().fold(schema, |s, f| s.keyword_field(f.as_str()))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index and run a query against it
    Search {
        /// Free-text query; may be empty when filters are given
        query: String,
        /// Number of results (clamped to 1..=20)
        #[arg(short = 'n', long = "num-results", default_value_t = DEFAULT_LIMIT)]
        num_results: usize,
        /// Keyword filter as field=value (repeatable)
        #[arg(long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, String)>,
        /// Characters of content shown per result
        #[arg(long, default_value_t = DEFAULT_PREVIEW_CHARS)]
        preview_chars: usize,
        #[command(flatten)]
        corpus: CorpusArgs,
    },
    /// Build the index and print corpus statistics
    Stats {
        #[command(flatten)]
        corpus: CorpusArgs,
    },
    /// Print one stored document as JSON
    Doc {
        id: u32,
        #[command(flatten)]
        corpus: CorpusArgs,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Search { query, num_results, filters, preview_chars, corpus } => {
            let (index, _) = build_index(&corpus)?;
            let mut q = Query::new(query).limit(clamp_limit(num_results));
            for (field, value) in filters {
                q = q.filter(field, value);
            }
            print_results(&index, &q, preview_chars)
        }
        Commands::Stats { corpus } => {
            let (index, skipped) = build_index(&corpus)?;
            println!("documents indexed: {}", index.num_docs());
            println!("documents skipped: {skipped}");
            println!("vocabulary size:   {}", index.vocabulary_size());
            Ok(())
        }
        Commands::Doc { id, corpus } => {
            let (index, _) = build_index(&corpus)?;
            let doc = index.get(id)?;
            println!("{}", serde_json::to_string_pretty(doc)?);
            Ok(())
        }
    }
}

/// Load the corpus and index it; returns the index and the total skip count.
fn build_index(corpus: &CorpusArgs) -> Result<(Index, usize)> {
    let report: LoadReport = match &corpus.jsonl {
        Some(path) => load_jsonl(path).with_context(|| format!("reading {}", path.display()))?,
        None => {
            let exts: Vec<&str> = if corpus.extensions.is_empty() {
                DEFAULT_EXTENSIONS.to_vec()
            } else {
                corpus.extensions.iter().map(String::as_str).collect()
            };
            let config = LoaderConfig::new(&corpus.root).with_extensions(exts);
            load_directory(&config)?
        }
    };
    let mut store = DocumentStore::new(corpus.schema());
    let ingest = store.ingest(report.documents);
    let index = Index::build(store).context("no documents found to index")?;
    let skipped = report.skipped.len() + ingest.skipped.len();
    tracing::info!(documents = index.num_docs(), skipped, "corpus indexed");
    Ok((index, skipped))
}

fn print_results(index: &Index, query: &Query, preview_chars: usize) -> Result<()> {
    let results = index.search(query)?;
    if results.is_empty() {
        println!("No results found.");
        return Ok(());
    }
    let schema = index.schema();
    let label_field = if schema.kind(FILENAME_FIELD).is_some() { Some(FILENAME_FIELD) } else { schema.keyword_fields().next() };
    let preview_field = if schema.kind(CONTENT_FIELD).is_some() { Some(CONTENT_FIELD) } else { schema.text_fields().next() };
    for (i, r) in results.iter().enumerate() {
        match label_field {
            Some(f) => println!("{}. {}", i + 1, r.document.field(f)),
            None => println!("{}. #{}", i + 1, r.doc_id),
        }
        if let Some(f) = preview_field {
            println!("   Preview: {}", preview(r.document.field(f), preview_chars));
        }
        println!("   Score: {:.4}", r.score);
        println!();
    }
    Ok(())
}

fn parse_filter(s: &str) -> Result<(String, String), String> {
    let (field, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected field=value, got '{s}'"))?;
    if field.is_empty() {
        return Err("filter field name is empty".into());
    }
    Ok((field.to_string(), value.to_string()))
}
