use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// File extensions the pipeline will ingest (lower-case, no dot).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "docx", "doc", "txt", "md", "html", "pptx"];

/// Filesystem change notification from the external watcher. Events are
/// handled idempotently: each one means "reconcile with the current state
/// of this path", so out-of-order bursts across paths are safe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    Added(PathBuf),
    Modified(PathBuf),
    Removed(PathBuf),
}

impl ChangeEvent {
    pub fn path(&self) -> &Path {
        match self {
            ChangeEvent::Added(p) | ChangeEvent::Modified(p) | ChangeEvent::Removed(p) => p,
        }
    }
}

/// Turns a file into plain text. Implementations must degrade to an empty
/// string on unreadable or unsupported input, never fail the caller.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path, extension: &str) -> String;
}

/// Turns text into a fixed-length vector, or `None` when the model is
/// unavailable or errors. Always best-effort.
pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, text: &str) -> Option<Vec<f32>>;
}

/// Vector store answering nearest-neighbour queries. All operations are
/// best-effort; a failing implementation returns an empty result list.
pub trait SemanticIndex: Send + Sync {
    fn upsert(&self, id: &str, vector: Vec<f32>);
    fn remove(&self, id: &str);
    fn similarity_search(&self, vector: &[f32], limit: usize) -> Vec<(String, f32)>;
}

lazy_static! {
    static ref TAG_RE: Regex = Regex::new(r"<[^>]*>").expect("valid tag regex");
}

/// Extractor for text-native formats: txt/md pass through, html is
/// tag-stripped. Binary formats (pdf, docx, pptx) need an external
/// conversion capability and degrade to empty content here.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, path: &Path, extension: &str) -> String {
        match extension {
            "txt" | "md" => fs::read_to_string(path).unwrap_or_else(|err| {
                tracing::warn!(path = %path.display(), %err, "text extraction failed");
                String::new()
            }),
            "html" => match fs::read_to_string(path) {
                Ok(html) => {
                    let stripped = TAG_RE.replace_all(&html, " ");
                    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "html extraction failed");
                    String::new()
                }
            },
            _ => String::new(),
        }
    }
}
