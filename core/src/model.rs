use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

/// Derive the stable document id for a path. Content-independent, so
/// re-ingesting the same path always upserts the same record.
pub fn doc_id_for_path(full_path: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(full_path.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// One ingested document, replaced wholesale on every re-ingestion of its
/// path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub filename: String,
    pub rel_path: String,
    pub full_path: String,
    pub content: String,
    /// Lower-cased extension without the leading dot.
    pub extension: String,
    pub size: u64,
    /// Unix seconds.
    pub created: i64,
    /// Unix seconds.
    pub modified: i64,
    /// Ordered, primary category first; every entry is a taxonomy name or
    /// the reserved fallback.
    pub categories: Vec<String>,
    pub confidence: f64,
    /// Most specific extracted project tag.
    pub project: Option<String>,
    /// All extracted project tags, longest first.
    pub projects: Vec<String>,
    pub team: Option<String>,
    /// Most important first.
    pub keywords: Vec<String>,
    pub preview: String,
}

/// One ranked search answer with its full record re-attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub record: DocumentRecord,
    /// Ranking score: lexical relevance for plain search, fused score for
    /// hybrid search.
    pub score: f32,
    pub lexical_score: Option<f32>,
    pub semantic_score: Option<f32>,
    /// 0-based position in the lexical source list.
    pub lexical_rank: Option<u32>,
    /// 0-based position in the semantic source list.
    pub semantic_rank: Option<u32>,
}

/// Distinct values across the corpus, for populating filter controls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub categories: Vec<String>,
    pub projects: Vec<String>,
    pub teams: Vec<String>,
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentDocument {
    pub filename: String,
    pub modified: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileTypeStat {
    pub extension: String,
    pub count: u64,
    pub total_size: u64,
}

/// Corpus-wide aggregates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorpusStats {
    pub total_documents: u64,
    pub total_categories: u64,
    pub total_projects: u64,
    pub total_teams: u64,
    pub total_size: u64,
    pub recent_documents: Vec<RecentDocument>,
    pub top_categories: Vec<CategoryCount>,
    pub file_types: Vec<FileTypeStat>,
}
