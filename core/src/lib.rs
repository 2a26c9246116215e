//! In-memory TF-IDF search over a corpus of documents with text and keyword
//! fields.
//!
//! Flow: [`loader`] → [`DocumentStore`] → [`Index::build`] → [`Index::search`].

pub mod config;
pub mod document;
pub mod error;
pub mod index;
pub mod loader;
pub mod preview;
pub mod query;
pub mod shared;
pub mod tokenizer;

pub use document::{DocId, Document, DocumentStore, FieldKind, IngestReport, RawDocument, Schema, SkippedDocument};
pub use error::{Error, Result};
pub use index::{Index, InvertedIndex, KeywordIndex, Posting};
pub use query::{search, Query, ScoredResult};
pub use shared::SharedIndex;

/// Schema used for Markdown corpora: `content` is scored, `filename` filters.
pub fn markdown_schema() -> Schema {
    Schema::new()
        .text_field(config::CONTENT_FIELD)
        .keyword_field(config::FILENAME_FIELD)
        .require(config::FILENAME_FIELD)
}

/// Load, ingest and index the Markdown tree described by `config`.
///
/// Returns the index with the number of loader and ingestion skips combined.
pub fn build_from_directory(config: &config::LoaderConfig) -> Result<(Index, usize)> {
    let report = loader::load_directory(config)?;
    let mut store = DocumentStore::new(markdown_schema());
    let ingest = store.ingest(report.documents);
    let index = Index::build(store)?;
    Ok((index, report.skipped.len() + ingest.skipped.len()))
}
