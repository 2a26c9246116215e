//! Query engine: keyword filtering plus TF-IDF ranking over text fields.
//!
//! Score of a document is the sum, over text fields and distinct query terms,
//! of `boost(field) * tf * ln(N / df)`. A query with no terms runs in pure
//! filter mode and returns matching documents in id order with score 0.

use crate::document::{DocId, Document, FieldKind};
use crate::error::{Error, Result};
use crate::index::Index;
use crate::tokenizer::unique_terms;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Result limit used when none is given.
pub const DEFAULT_K: usize = crate::config::DEFAULT_LIMIT;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
    #[serde(default)]
    pub boosts: BTreeMap<String, f64>,
    #[serde(default = "default_k")]
    pub k: usize,
}

fn default_k() -> usize { DEFAULT_K }

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), filters: BTreeMap::new(), boosts: BTreeMap::new(), k: DEFAULT_K }
    }

    /// Require keyword field `field` to equal `value`.
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    /// Multiply contributions from text field `field` by `weight`.
    pub fn boost(mut self, field: impl Into<String>, weight: f64) -> Self {
        self.boosts.insert(field.into(), weight);
        self
    }

    pub fn limit(mut self, k: usize) -> Self {
        self.k = k;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredResult {
    pub doc_id: DocId,
    pub score: f64,
    pub document: Document,
}

/// Run `query` against `index`.
pub fn search(index: &Index, query: &Query) -> Result<Vec<ScoredResult>> {
    index.search(query)
}

impl Index {
    /// Top `query.k` documents, best first. `k == 0` is treated as 1.
    pub fn search(&self, query: &Query) -> Result<Vec<ScoredResult>> {
        self.search_with_total(query).map(|(results, _)| results)
    }

    /// Like [`Index::search`], also returning how many documents matched
    /// before truncation to `k`.
    pub fn search_with_total(&self, query: &Query) -> Result<(Vec<ScoredResult>, usize)> {
        let schema = self.schema();
        for field in query.filters.keys() {
            if schema.kind(field) != Some(FieldKind::Keyword) {
                return Err(Error::UnknownField(field.clone()));
            }
        }
        for field in query.boosts.keys() {
            if schema.kind(field) != Some(FieldKind::Text) {
                return Err(Error::UnknownField(field.clone()));
            }
        }
        if let Some((field, &weight)) = query.boosts.iter().find(|(_, w)| !w.is_finite() || **w < 0.0) {
            return Err(Error::InvalidBoost { field: field.clone(), weight });
        }
        let k = query.k.max(1);
        let allowed = self.filter_matches(query);
        let terms = unique_terms(&query.text);

        if terms.is_empty() {
            let ids: Vec<DocId> = match &allowed {
                Some(ids) => ids.clone(),
                None => (0..self.num_docs()).collect(),
            };
            let total = ids.len();
            let results = ids.into_iter().take(k).map(|id| self.hydrate(id, 0.0)).collect::<Result<_>>()?;
            return Ok((results, total));
        }

        let admits = |doc_id: DocId| match &allowed {
            Some(ids) => ids.binary_search(&doc_id).is_ok(),
            None => true,
        };

        let mut scores: HashMap<DocId, f64> = HashMap::new();
        for (field, inv) in self.text_fields() {
            let boost = query.boosts.get(field).copied().unwrap_or(1.0);
            for term in &terms {
                let Some(idf) = self.idf(field, term) else { continue };
                for p in inv.postings(term) {
                    if !admits(p.doc_id) {
                        continue;
                    }
                    *scores.entry(p.doc_id).or_insert(0.0) += boost * p.tf as f64 * idf;
                }
            }
        }

        let mut scored: Vec<(DocId, f64)> = scores.into_iter().collect();
        scored.sort_by(|a, b| match b.1.total_cmp(&a.1) {
            Ordering::Equal => a.0.cmp(&b.0),
            other => other,
        });
        let total = scored.len();
        tracing::debug!(terms = terms.len(), candidates = total, k, "search");
        let results = scored.into_iter().take(k).map(|(id, score)| self.hydrate(id, score)).collect::<Result<_>>()?;
        Ok((results, total))
    }

    /// Ascending ids passing every keyword filter, or `None` when unfiltered.
    fn filter_matches(&self, query: &Query) -> Option<Vec<DocId>> {
        let schema = self.schema();
        let mut allowed: Option<Vec<DocId>> = None;
        for (field, value) in &query.filters {
            let value = schema.normalize_keyword(value);
            let ids = self
                .keyword_field(field)
                .map(|kw| kw.matching(&value))
                .unwrap_or(&[]);
            allowed = Some(match allowed {
                None => ids.to_vec(),
                Some(prev) => prev.into_iter().filter(|id| ids.binary_search(id).is_ok()).collect(),
            });
        }
        allowed
    }

    fn hydrate(&self, doc_id: DocId, score: f64) -> Result<ScoredResult> {
        let document = self.get(doc_id)?.clone();
        Ok(ScoredResult { doc_id, score, document })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentStore, RawDocument, Schema};

    fn raw(pairs: &[(&str, &str)]) -> RawDocument {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn two_field_index() -> Index {
        let schema = Schema::new().text_field("title").text_field("body").keyword_field("lang");
        let mut store = DocumentStore::new(schema);
        store.ingest(vec![
            raw(&[("title", "rust"), ("body", "systems"), ("lang", "en")]),
            raw(&[("title", "systems"), ("body", "rust rust"), ("lang", "en")]),
            raw(&[("title", "python"), ("body", "scripting"), ("lang", "de")]),
        ]);
        Index::build(store).unwrap()
    }

    #[test]
    fn sums_across_fields() {
        let idx = two_field_index();
        let hits = idx.search(&Query::new("rust")).unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.doc_id).collect();
        assert_eq!(ids, vec![1, 0]);
        let idf = (3f64 / 1f64).ln();
        assert!((hits[0].score - 2.0 * idf).abs() < 1e-9);
        assert!((hits[1].score - idf).abs() < 1e-9);
    }

    #[test]
    fn boost_reorders() {
        let idx = two_field_index();
        let hits = idx.search(&Query::new("rust").boost("title", 3.0)).unwrap();
        assert_eq!(hits[0].doc_id, 0);
    }

    #[test]
    fn boost_on_keyword_field_rejected() {
        let idx = two_field_index();
        let err = idx.search(&Query::new("rust").boost("lang", 2.0)).unwrap_err();
        assert!(matches!(err, Error::UnknownField(f) if f == "lang"));
    }

    #[test]
    fn bad_boost_weights_rejected() {
        let idx = two_field_index();
        for weight in [-1.0, f64::NAN, f64::INFINITY] {
            let err = idx.search(&Query::new("rust").boost("body", weight)).unwrap_err();
            assert!(matches!(err, Error::InvalidBoost { ref field, .. } if field == "body"));
        }
        assert_eq!(idx.search(&Query::new("rust").boost("body", 0.0)).unwrap().len(), 2);
    }

    #[test]
    fn total_counts_matches_before_truncation() {
        let idx = two_field_index();
        let (hits, total) = idx.search_with_total(&Query::new("rust systems").limit(1)).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(total, 2);
        let (hits, total) = idx.search_with_total(&Query::new("").filter("lang", "en").limit(1)).unwrap();
        assert_eq!((hits.len(), total), (1, 2));
    }

    #[test]
    fn filter_on_text_field_rejected() {
        let idx = two_field_index();
        assert!(matches!(
            idx.search(&Query::new("rust").filter("title", "rust")),
            Err(Error::UnknownField(_))
        ));
    }

    #[test]
    fn repeated_query_terms_count_once() {
        let idx = two_field_index();
        let once = idx.search(&Query::new("rust")).unwrap();
        let twice = idx.search(&Query::new("rust RUST")).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn zero_k_returns_one() {
        let idx = two_field_index();
        assert_eq!(idx.search(&Query::new("rust").limit(0)).unwrap().len(), 1);
    }

    #[test]
    fn punctuation_only_query_is_filter_mode() {
        let idx = two_field_index();
        let hits = idx.search(&Query::new("?!").filter("lang", "en")).unwrap();
        assert_eq!(hits.iter().map(|h| h.doc_id).collect::<Vec<_>>(), vec![0, 1]);
        assert!(hits.iter().all(|h| h.score == 0.0));
    }

    #[test]
    fn case_folded_keywords() {
        let schema = Schema::new().text_field("content").keyword_field("filename").fold_keyword_case(true);
        let mut store = DocumentStore::new(schema);
        store.ingest(vec![raw(&[("content", "x"), ("filename", "README.md")])]);
        let idx = Index::build(store).unwrap();
        let hits = idx.search(&Query::new("").filter("filename", "readme.MD")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document.field("filename"), "README.md");
    }

    #[test]
    fn no_text_fields_still_filters() {
        let mut store = DocumentStore::new(Schema::new().keyword_field("tag"));
        store.ingest(vec![raw(&[("tag", "a")]), raw(&[("tag", "b")])]);
        let idx = Index::build(store).unwrap();
        assert!(idx.search(&Query::new("anything")).unwrap().is_empty());
        let hits = idx.search(&Query::new("").filter("tag", "b")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc_id, 1);
    }
}
