//! Corpus loading. All filesystem access lives here; the index and query
//! path only ever see materialized documents.

use crate::config::{LoaderConfig, CONTENT_FIELD, FILENAME_FIELD};
use crate::document::RawDocument;
use crate::error::{Error, Result};
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// A source that could not be turned into a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSource {
    pub path: PathBuf,
    /// 1-based line for JSON Lines input.
    pub line: Option<usize>,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub documents: Vec<RawDocument>,
    pub skipped: Vec<SkippedSource>,
}

/// Recursively load every file under `config.root` whose extension is listed
/// in `config.extensions`, as a `content` / `filename` document.
///
/// Files are visited in file-name order so repeated loads of the same tree
/// yield the same document order. Unreadable files are skipped and reported.
pub fn load_directory(config: &LoaderConfig) -> Result<LoadReport> {
    let root = &config.root;
    if !root.is_dir() {
        return Err(Error::CorpusRoot(root.clone()));
    }
    let mut report = LoadReport::default();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
                tracing::warn!(path = %path.display(), %err, "skipping unreadable entry");
                report.skipped.push(SkippedSource { path, line: None, reason: err.to_string() });
                continue;
            }
        };
        let p = entry.path();
        if !p.is_file() || !has_extension(p, &config.extensions) {
            continue;
        }
        match fs::read_to_string(p) {
            Ok(content) => {
                let mut doc = RawDocument::new();
                doc.insert(CONTENT_FIELD.to_string(), content);
                doc.insert(FILENAME_FIELD.to_string(), relative_name(root, p));
                report.documents.push(doc);
            }
            Err(err) => {
                tracing::warn!(path = %p.display(), %err, "skipping unreadable file");
                report.skipped.push(SkippedSource { path: p.to_path_buf(), line: None, reason: err.to_string() });
            }
        }
    }
    tracing::info!(
        root = %root.display(),
        loaded = report.documents.len(),
        skipped = report.skipped.len(),
        "loaded corpus"
    );
    Ok(report)
}

/// Load a JSON Lines file where each line is an object of fields.
///
/// String values are taken as-is, numbers and booleans are rendered as text,
/// nulls are dropped. Lines that are not UTF-8 or not flat objects are
/// skipped and reported.
pub fn load_jsonl(path: &Path) -> Result<LoadReport> {
    let reader = BufReader::new(File::open(path)?);
    let mut report = LoadReport::default();
    for (i, bytes) in reader.split(b'\n').enumerate() {
        let bytes = bytes?;
        let parsed = match String::from_utf8(bytes) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => serde_json::from_str::<Value>(&line)
                .map_err(|e| e.to_string())
                .and_then(flatten_object),
            Err(e) => Err(format!("line is not valid UTF-8: {e}")),
        };
        match parsed {
            Ok(doc) => report.documents.push(doc),
            Err(reason) => {
                tracing::warn!(path = %path.display(), line = i + 1, %reason, "skipping line");
                report.skipped.push(SkippedSource { path: path.to_path_buf(), line: Some(i + 1), reason });
            }
        }
    }
    tracing::info!(
        path = %path.display(),
        loaded = report.documents.len(),
        skipped = report.skipped.len(),
        "loaded json lines"
    );
    Ok(report)
}

fn flatten_object(value: Value) -> std::result::Result<RawDocument, String> {
    let Value::Object(map) = value else {
        return Err("expected a JSON object".into());
    };
    let mut doc = RawDocument::new();
    for (field, v) in map {
        let text = match v {
            Value::Null => continue,
            Value::String(s) => s,
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::Array(_) | Value::Object(_) => return Err(format!("field '{field}' is not a scalar")),
        };
        doc.insert(field, text);
    }
    Ok(doc)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Path of `path` relative to `root`, joined with `/`.
fn relative_name(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
