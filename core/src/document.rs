//! Documents, field declarations, and the ordered store they are ingested into.
//!
//! A [`Schema`] is declared once and travels with the [`DocumentStore`]; the
//! index builder and the query engine both read field kinds from it.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub type DocId = u32;

/// Field name to value, as handed over by a loader.
pub type RawDocument = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Tokenized and scored.
    Text,
    /// Exact-match filter only.
    Keyword,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    fields: BTreeMap<String, FieldKind>,
    required: BTreeSet<String>,
    fold_keyword_case: bool,
}

impl Schema {
    pub fn new() -> Self { Self::default() }

    pub fn text_field(mut self, name: impl Into<String>) -> Self {
        self.fields.insert(name.into(), FieldKind::Text);
        self
    }

    pub fn keyword_field(mut self, name: impl Into<String>) -> Self {
        self.fields.insert(name.into(), FieldKind::Keyword);
        self
    }

    /// Documents missing this field are rejected at ingestion.
    pub fn require(mut self, name: impl Into<String>) -> Self {
        self.required.insert(name.into());
        self
    }

    /// Compare keyword values case-insensitively.
    pub fn fold_keyword_case(mut self, fold: bool) -> Self {
        self.fold_keyword_case = fold;
        self
    }

    pub fn kind(&self, name: &str) -> Option<FieldKind> {
        self.fields.get(name).copied()
    }

    pub fn text_fields(&self) -> impl Iterator<Item = &str> {
        self.fields_of(FieldKind::Text)
    }

    pub fn keyword_fields(&self) -> impl Iterator<Item = &str> {
        self.fields_of(FieldKind::Keyword)
    }

    fn fields_of(&self, kind: FieldKind) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(move |(_, k)| **k == kind)
            .map(|(name, _)| name.as_str())
    }

    /// The form a keyword value is stored and compared in.
    pub fn normalize_keyword(&self, value: &str) -> String {
        if self.fold_keyword_case { value.to_lowercase() } else { value.to_string() }
    }

    fn validate(&self, position: usize, raw: &RawDocument) -> Result<()> {
        if let Some(missing) = self.required.iter().find(|f| !raw.contains_key(f.as_str())) {
            return Err(Error::InvalidDocument {
                position,
                reason: format!("missing required field '{missing}'"),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub fields: BTreeMap<String, String>,
}

impl Document {
    /// Value of `name`, empty when the document lacks the field.
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug)]
pub struct SkippedDocument {
    /// Position among all raw documents the store has received.
    pub position: usize,
    pub error: Error,
}

#[derive(Debug, Default)]
pub struct IngestReport {
    pub accepted: usize,
    pub skipped: Vec<SkippedDocument>,
}

/// Ordered, append-only collection of validated documents.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    schema: Schema,
    docs: Vec<Document>,
    received: usize,
}

impl DocumentStore {
    pub fn new(schema: Schema) -> Self {
        Self { schema, docs: Vec::new(), received: 0 }
    }

    /// Ingest a batch. Invalid documents are skipped and reported; accepted
    /// documents get the next sequential identifier.
    pub fn ingest<I>(&mut self, documents: I) -> IngestReport
    where
        I: IntoIterator<Item = RawDocument>,
    {
        let mut report = IngestReport::default();
        for raw in documents {
            let position = self.received;
            self.received += 1;
            if let Err(error) = self.schema.validate(position, &raw) {
                tracing::warn!(position, %error, "skipping document");
                report.skipped.push(SkippedDocument { position, error });
                continue;
            }
            let id = self.docs.len() as DocId;
            self.docs.push(Document { id, fields: raw });
            report.accepted += 1;
        }
        report
    }

    pub fn get(&self, id: DocId) -> Result<&Document> {
        self.docs.get(id as usize).ok_or(Error::NotFound(id))
    }

    pub fn schema(&self) -> &Schema { &self.schema }

    pub fn len(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    /// Raw documents seen by `ingest`, accepted or not.
    pub fn received(&self) -> usize { self.received }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.docs.iter()
    }
}
