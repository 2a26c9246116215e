//! Defaults shared by the CLI and the HTTP server.
//!
//! Runtime configuration is handled by command-line flags and environment
//! variables in the binaries; these are the values they fall back to.

use std::path::PathBuf;

/// Results returned when the caller does not ask for a count.
pub const DEFAULT_LIMIT: usize = 5;

/// Largest result count a front end will request.
pub const MAX_LIMIT: usize = 20;

/// File extensions picked up by the corpus loader.
pub const DEFAULT_EXTENSIONS: &[&str] = &["md", "mdx"];

/// Preview length in characters.
pub const DEFAULT_PREVIEW_CHARS: usize = 100;

/// Text field holding a file's contents.
pub const CONTENT_FIELD: &str = "content";

/// Keyword field holding a file's root-relative path.
pub const FILENAME_FIELD: &str = "filename";

/// Clamp a caller-supplied result count into `1..=MAX_LIMIT`.
pub fn clamp_limit(k: usize) -> usize {
    k.clamp(1, MAX_LIMIT)
}

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub root: PathBuf,
    /// Extensions without the leading dot, compared case-insensitively.
    pub extensions: Vec<String>,
}

impl LoaderConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
            .collect();
        self
    }
}
