use crate::document::{DocId, Document, DocumentStore, Schema};
use crate::error::{Error, Result};
use crate::tokenizer::tokenize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub tf: u32, // occurrences in this (document, field), always >= 1
}

/// Inverted index over one text field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvertedIndex {
    pub postings: BTreeMap<String, Vec<Posting>>, // postings sorted by doc_id
    pub doc_lengths: Vec<u32>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Documents must be added in ascending id order.
    fn add_document(&mut self, doc_id: DocId, text: &str) {
        let tokens = tokenize(text);
        let idx = doc_id as usize;
        if self.doc_lengths.len() <= idx {
            self.doc_lengths.resize(idx + 1, 0);
        }
        self.doc_lengths[idx] = tokens.len() as u32;

        let mut tf_counts: BTreeMap<String, u32> = BTreeMap::new();
        for term in tokens {
            *tf_counts.entry(term).or_insert(0) += 1;
        }
        for (term, tf) in tf_counts {
            self.postings.entry(term).or_default().push(Posting { doc_id, tf });
        }
    }

    pub fn postings(&self, term: &str) -> &[Posting] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of documents containing `term` at least once.
    pub fn doc_freq(&self, term: &str) -> u32 {
        self.postings(term).len() as u32
    }

    pub fn term_freq(&self, term: &str, doc_id: DocId) -> u32 {
        let plist = self.postings(term);
        plist
            .binary_search_by_key(&doc_id, |p| p.doc_id)
            .map(|i| plist[i].tf)
            .unwrap_or(0)
    }

    /// Token count of the field in `doc_id`.
    pub fn doc_length(&self, doc_id: DocId) -> u32 {
        self.doc_lengths.get(doc_id as usize).copied().unwrap_or(0)
    }

    pub fn num_terms(&self) -> usize { self.postings.len() }
}

/// Verbatim values of one keyword field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordIndex {
    pub by_value: BTreeMap<String, Vec<DocId>>,
}

impl KeywordIndex {
    /// Documents whose stored value equals `value`, ascending.
    pub fn matching(&self, value: &str) -> &[DocId] {
        self.by_value.get(value).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Immutable search index. Owns the documents it was built from.
#[derive(Debug, Clone)]
pub struct Index {
    store: DocumentStore,
    text: BTreeMap<String, InvertedIndex>,
    keywords: BTreeMap<String, KeywordIndex>,
}

impl Index {
    /// Build the index in one pass over the store.
    ///
    /// Fails with [`Error::EmptyCorpus`] only when the store never received a
    /// single raw document. A store whose documents were all rejected yields an
    /// empty but queryable index.
    pub fn build(store: DocumentStore) -> Result<Self> {
        if store.received() == 0 {
            return Err(Error::EmptyCorpus);
        }
        let schema = store.schema();

        let mut text: BTreeMap<String, InvertedIndex> = schema
            .text_fields()
            .map(|f| (f.to_string(), InvertedIndex::new()))
            .collect();
        let mut keywords: BTreeMap<String, KeywordIndex> = schema
            .keyword_fields()
            .map(|f| (f.to_string(), KeywordIndex::default()))
            .collect();

        for doc in store.iter() {
            for (field, inv) in text.iter_mut() {
                inv.add_document(doc.id, doc.field(field));
            }
            for (field, kw) in keywords.iter_mut() {
                let value = schema.normalize_keyword(doc.field(field));
                kw.by_value.entry(value).or_default().push(doc.id);
            }
        }

        // trailing documents with an empty field still get a length slot
        for inv in text.values_mut() {
            inv.doc_lengths.resize(store.len(), 0);
        }

        tracing::info!(
            num_docs = store.len(),
            skipped = store.received() - store.len(),
            text_fields = text.len(),
            keyword_fields = keywords.len(),
            num_terms = text.values().map(InvertedIndex::num_terms).sum::<usize>(),
            "index built"
        );
        Ok(Self { store, text, keywords })
    }

    pub fn schema(&self) -> &Schema { self.store.schema() }

    pub fn store(&self) -> &DocumentStore { &self.store }

    pub fn get(&self, id: DocId) -> Result<&Document> { self.store.get(id) }

    /// Corpus size N.
    pub fn num_docs(&self) -> u32 { self.store.len() as u32 }

    pub fn text_field(&self, name: &str) -> Option<&InvertedIndex> { self.text.get(name) }

    pub fn keyword_field(&self, name: &str) -> Option<&KeywordIndex> { self.keywords.get(name) }

    pub(crate) fn text_fields(&self) -> impl Iterator<Item = (&str, &InvertedIndex)> {
        self.text.iter().map(|(f, inv)| (f.as_str(), inv))
    }

    /// `ln(N / df)`, or `None` when the term never occurs in the field.
    pub fn idf(&self, field: &str, term: &str) -> Option<f64> {
        let df = self.text.get(field)?.doc_freq(term);
        if df == 0 {
            return None;
        }
        Some((self.num_docs() as f64 / df as f64).ln())
    }

    /// Distinct terms summed over all text fields.
    pub fn vocabulary_size(&self) -> usize {
        self.text.values().map(InvertedIndex::num_terms).sum()
    }
}
