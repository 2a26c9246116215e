use mdsearch_core::{markdown_schema, DocumentStore, Error, Index, Query, RawDocument};

fn doc(content: &str, filename: &str) -> RawDocument {
    let mut d = RawDocument::new();
    d.insert("content".into(), content.into());
    d.insert("filename".into(), filename.into());
    d
}

fn corpus() -> Vec<RawDocument> {
    vec![
        doc("alpha beta beta", "a.md"),
        doc("beta gamma", "b.md"),
        doc("alpha alpha gamma", "c.md"),
    ]
}

fn build(docs: Vec<RawDocument>) -> Index {
    let mut store = DocumentStore::new(markdown_schema());
    store.ingest(docs);
    Index::build(store).unwrap()
}

fn filenames(index: &Index, query: &Query) -> Vec<String> {
    index
        .search(query)
        .unwrap()
        .into_iter()
        .map(|r| r.document.field("filename").to_string())
        .collect()
}

#[test]
fn higher_term_frequency_ranks_first() {
    let index = build(corpus());
    assert_eq!(filenames(&index, &Query::new("beta").limit(5)), vec!["a.md", "b.md"]);
}

#[test]
fn empty_query_with_filter_returns_exact_match() {
    let index = build(corpus());
    assert_eq!(filenames(&index, &Query::new("").filter("filename", "b.md")), vec!["b.md"]);
}

#[test]
fn empty_query_without_filter_lists_in_id_order() {
    let index = build(corpus());
    let hits = index.search(&Query::new("").limit(10)).unwrap();
    assert_eq!(hits.iter().map(|h| h.doc_id).collect::<Vec<_>>(), vec![0, 1, 2]);
}

#[test]
fn undeclared_filter_field_is_unknown() {
    let index = build(corpus());
    let err = index.search(&Query::new("beta").filter("author", "x")).unwrap_err();
    assert!(matches!(err, Error::UnknownField(ref f) if f == "author"));
}

#[test]
fn filter_excludes_non_matching_documents() {
    let index = build(corpus());
    let query = Query::new("alpha gamma").filter("filename", "c.md");
    let hits = index.search(&query).unwrap();
    assert!(!hits.is_empty());
    assert!(hits.iter().all(|h| h.document.field("filename") == "c.md"));

    let none = index.search(&Query::new("beta").filter("filename", "c.md")).unwrap();
    assert!(none.is_empty());
}

#[test]
fn k_larger_than_candidates_is_not_padded() {
    let index = build(corpus());
    assert_eq!(index.search(&Query::new("beta").limit(50)).unwrap().len(), 2);
}

#[test]
fn ties_break_by_ascending_id() {
    let index = build(vec![doc("same words", "z.md"), doc("same words", "a.md"), doc("other", "m.md")]);
    assert_eq!(filenames(&index, &Query::new("same")), vec!["z.md", "a.md"]);
}

#[test]
fn rebuilding_is_idempotent() {
    let first = build(corpus());
    let second = build(corpus());
    assert_eq!(first.text_field("content"), second.text_field("content"));
    assert_eq!(first.keyword_field("filename"), second.keyword_field("filename"));
    let q = Query::new("alpha beta gamma");
    assert_eq!(first.search(&q).unwrap(), second.search(&q).unwrap());
    assert_eq!(first.search(&q).unwrap(), first.search(&q).unwrap());
}

#[test]
fn duplicate_of_top_document_keeps_its_lead() {
    let mut docs = corpus();
    docs.push(doc("unrelated delta epsilon", "d.md"));
    let before = build(docs.clone());
    let rank = |index: &Index, name: &str| {
        filenames(index, &Query::new("beta").limit(20)).iter().position(|f| f == name)
    };
    assert_eq!(rank(&before, "a.md"), Some(0));

    docs.push(doc("alpha beta beta", "a-copy.md"));
    let after = build(docs);
    assert_eq!(rank(&after, "a.md"), Some(0));
    assert_eq!(rank(&after, "d.md"), None);
}

#[test]
fn no_input_documents_is_empty_corpus() {
    let store = DocumentStore::new(markdown_schema());
    assert!(matches!(Index::build(store), Err(Error::EmptyCorpus)));
}

#[test]
fn documents_without_filename_are_skipped() {
    let mut store = DocumentStore::new(markdown_schema());
    let mut nameless = RawDocument::new();
    nameless.insert("content".into(), "beta".into());
    let report = store.ingest(vec![nameless, doc("beta", "ok.md")]);
    assert_eq!(report.skipped.len(), 1);
    let index = Index::build(store).unwrap();
    assert_eq!(filenames(&index, &Query::new("beta")), vec!["ok.md"]);
}
