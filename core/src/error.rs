use crate::DocId;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Document failed schema validation during ingestion.
    #[error("invalid document at position {position}: {reason}")]
    InvalidDocument { position: usize, reason: String },

    /// No input documents were supplied at all.
    #[error("cannot build an index from zero input documents")]
    EmptyCorpus,

    /// Query referenced a field the schema does not declare for that use.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// Boost weight is negative, infinite or NaN.
    #[error("invalid boost {weight} for field '{field}'")]
    InvalidBoost { field: String, weight: f64 },

    /// No stored document has this identifier.
    #[error("document not found: {0}")]
    NotFound(DocId),

    /// Corpus root is missing or not a directory.
    #[error("corpus root not found: {}", .0.display())]
    CorpusRoot(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
