use criterion::{criterion_group, criterion_main, Criterion};
use mdsearch_core::{markdown_schema, DocumentStore, Index, Query, RawDocument};

const WORDS: &[&str] = &[
    "server", "client", "tool", "resource", "prompt", "auth", "oauth", "token", "deploy", "install",
    "python", "config", "transport", "stdio", "http", "context", "schema", "test", "cli", "example",
];

fn corpus(n: usize) -> Vec<RawDocument> {
    (0..n)
        .map(|i| {
            let content: Vec<&str> = (0..120).map(|j| WORDS[(i * 7 + j * 13) % WORDS.len()]).collect();
            let mut d = RawDocument::new();
            d.insert("content".into(), content.join(" "));
            d.insert("filename".into(), format!("docs/{i}.md"));
            d
        })
        .collect()
}

fn bench_search(c: &mut Criterion) {
    let mut store = DocumentStore::new(markdown_schema());
    store.ingest(corpus(2_000));
    let index = Index::build(store).expect("non-empty corpus");
    let query = Query::new("oauth token server configuration").limit(5);
    c.bench_function("search_2k_docs", |b| b.iter(|| index.search(&query)));

    c.bench_function("build_2k_docs", |b| {
        b.iter(|| {
            let mut store = DocumentStore::new(markdown_schema());
            store.ingest(corpus(2_000));
            Index::build(store)
        })
    });
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
