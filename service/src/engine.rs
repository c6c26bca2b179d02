use crate::bounded::{call_bounded, PROVIDER_TIMEOUT};
use crate::providers::{
    ChangeEvent, EmbeddingProvider, SemanticIndex, TextExtractor, SUPPORTED_EXTENSIONS,
};
use anyhow::{bail, Context, Result};
use docdex_core::categorizer::Categorizer;
use docdex_core::filter::{apply_filters, SearchFilters};
use docdex_core::fuse::reciprocal_rank_fusion;
use docdex_core::index::InvertedIndex;
use docdex_core::model::{doc_id_for_path, CorpusStats, DocumentRecord, FilterOptions, SearchResult};
use docdex_core::preview::build_preview;
use docdex_core::store::DocumentStore;
use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use walkdir::WalkDir;

/// Character budget for the text sent to the embedding provider.
pub const EMBED_TEXT_MAX_LEN: usize = 5000;
/// Semantic candidates fetched per requested result during hybrid search.
pub const SEMANTIC_FETCH_FACTOR: usize = 2;

/// One failed file in a bulk ingestion run.
#[derive(Debug, Clone)]
pub struct IngestFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of a bulk ingestion run. Per-file failures never abort the
/// batch; they are collected here.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub indexed: usize,
    pub failures: Vec<IngestFailure>,
}

/// Orchestrates ingestion and search over the pluggable collaborators.
///
/// Mutations serialize on a global ingest lock; queries read an
/// atomically-swapped index snapshot, so an in-flight query sees either
/// the fully-old or fully-new index, never a partial one.
pub struct Engine {
    root: PathBuf,
    store: Arc<dyn DocumentStore>,
    extractor: Arc<dyn TextExtractor>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    semantic: Option<Arc<dyn SemanticIndex>>,
    categorizer: Mutex<Categorizer>,
    index: RwLock<Arc<InvertedIndex>>,
    ingest_lock: Mutex<()>,
    provider_timeout: Duration,
}

impl Engine {
    pub fn new(
        root: impl Into<PathBuf>,
        store: Arc<dyn DocumentStore>,
        extractor: Arc<dyn TextExtractor>,
    ) -> Self {
        Self {
            root: root.into(),
            store,
            extractor,
            embedder: None,
            semantic: None,
            categorizer: Mutex::new(Categorizer::new()),
            index: RwLock::new(Arc::new(InvertedIndex::new())),
            ingest_lock: Mutex::new(()),
            provider_timeout: PROVIDER_TIMEOUT,
        }
    }

    /// Attach the optional semantic pair: embedding provider plus vector
    /// index. Without both, search degrades to lexical-only.
    pub fn with_semantic(
        mut self,
        embedder: Arc<dyn EmbeddingProvider>,
        semantic: Arc<dyn SemanticIndex>,
    ) -> Self {
        self.embedder = Some(embedder);
        self.semantic = Some(semantic);
        self
    }

    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    pub fn is_supported(path: &Path) -> bool {
        let ext = extension_of(path);
        SUPPORTED_EXTENSIONS.contains(&ext.as_str())
    }

    pub fn index_doc_count(&self) -> usize {
        self.index.read().doc_count()
    }

    /// Rebuild the index from the full record set and swap it in.
    pub fn rebuild_index(&self) -> Result<()> {
        let _guard = self.ingest_lock.lock();
        let records = self.store.list_all()?;
        let next = InvertedIndex::build(&records);
        *self.index.write() = Arc::new(next);
        tracing::debug!(docs = records.len(), "index rebuilt");
        Ok(())
    }

    /// Ingest one file: extract, categorize, persist, index, embed.
    /// A store failure aborts this document; extractor and embedding
    /// failures degrade. Re-ingesting a path replaces its record wholesale.
    pub fn ingest(&self, path: &Path) -> Result<DocumentRecord> {
        let _guard = self.ingest_lock.lock();
        self.ingest_locked(path)
    }

    fn ingest_locked(&self, path: &Path) -> Result<DocumentRecord> {
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("read metadata for {}", path.display()))?;
        let extension = extension_of(path);
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let full_path = path.to_string_lossy().into_owned();
        let rel_path = path
            .strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned();

        let content = {
            let extractor = Arc::clone(&self.extractor);
            let target = path.to_path_buf();
            let ext = extension.clone();
            call_bounded("extract", self.provider_timeout, move || {
                extractor.extract(&target, &ext)
            })
            .unwrap_or_default()
        };
        if content.is_empty() {
            tracing::debug!(path = %full_path, "no extractable text, indexing metadata only");
        }

        let modified = metadata
            .modified()
            .map(unix_secs)
            .unwrap_or_default();
        let created = metadata.created().map(unix_secs).unwrap_or(modified);

        let categorization = {
            let mut categorizer = self.categorizer.lock();
            categorizer.categorize(&content, &filename, &rel_path)
        };

        let record = DocumentRecord {
            id: doc_id_for_path(&full_path),
            filename,
            rel_path,
            full_path: full_path.clone(),
            preview: build_preview(&content),
            content,
            extension,
            size: metadata.len(),
            created,
            modified,
            categories: categorization.categories,
            confidence: categorization.confidence,
            project: categorization.projects.first().cloned(),
            projects: categorization.projects,
            team: categorization.team,
            keywords: categorization.keywords,
        };

        // The store write is the one fatal step: an unstored record would
        // be unsearchable later, worse than skipping the file.
        self.store.upsert(&record)?;

        let mut next = (**self.index.read()).clone();
        next.add_record(&record);
        *self.index.write() = Arc::new(next);

        self.embed_record(&record);
        tracing::info!(path = %record.rel_path, category = %record.categories[0], "ingested");
        Ok(record)
    }

    fn embed_record(&self, record: &DocumentRecord) {
        let (Some(embedder), Some(semantic)) = (&self.embedder, &self.semantic) else {
            return;
        };
        let text: String = format!("{} {}", record.filename, record.content)
            .chars()
            .take(EMBED_TEXT_MAX_LEN)
            .collect();
        let embedder = Arc::clone(embedder);
        let vector = call_bounded("embed", self.provider_timeout, move || embedder.embed(&text))
            .flatten();
        let Some(vector) = vector else {
            tracing::warn!(path = %record.rel_path, "embedding unavailable, lexical-only");
            return;
        };
        let semantic = Arc::clone(semantic);
        let id = record.id.clone();
        call_bounded("semantic_upsert", self.provider_timeout, move || {
            semantic.upsert(&id, vector)
        });
    }

    /// Remove a path's record and postings. Idempotent.
    pub fn remove(&self, path: &Path) -> Result<bool> {
        let _guard = self.ingest_lock.lock();
        let full_path = path.to_string_lossy().into_owned();
        let existed = self.store.delete(&full_path)?;
        let doc_id = doc_id_for_path(&full_path);

        let mut next = (**self.index.read()).clone();
        if next.remove_doc(&doc_id) {
            *self.index.write() = Arc::new(next);
        }

        if let Some(semantic) = &self.semantic {
            let semantic = Arc::clone(semantic);
            let id = doc_id.clone();
            call_bounded("semantic_remove", self.provider_timeout, move || {
                semantic.remove(&id)
            });
        }
        if existed {
            tracing::info!(path = %full_path, "removed");
        }
        Ok(existed)
    }

    /// Reconcile one watcher event with the current state of its path.
    pub fn apply_event(&self, event: &ChangeEvent) -> Result<()> {
        match event {
            ChangeEvent::Added(path) | ChangeEvent::Modified(path) => {
                if !Self::is_supported(path) {
                    return Ok(());
                }
                if path.is_file() {
                    self.ingest(path)?;
                } else {
                    // The file vanished before we got here; reconcile as a
                    // removal so stale records never linger.
                    self.remove(path)?;
                }
            }
            ChangeEvent::Removed(path) => {
                self.remove(path)?;
            }
        }
        Ok(())
    }

    /// Walk the engine root and ingest every supported file, continuing
    /// past per-file failures.
    pub fn ingest_dir(&self) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        for entry in WalkDir::new(&self.root).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if !path.is_file() || !Self::is_supported(path) {
                continue;
            }
            match self.ingest(path) {
                Ok(_) => report.indexed += 1,
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "ingestion failed, continuing");
                    report.failures.push(IngestFailure {
                        path: path.to_path_buf(),
                        error: err.to_string(),
                    });
                }
            }
        }
        tracing::info!(indexed = report.indexed, failed = report.failures.len(), "bulk ingestion done");
        Ok(report)
    }

    /// Ranked lexical search with structured post-filters.
    pub fn search(&self, query: &str, filters: &SearchFilters) -> Result<Vec<SearchResult>> {
        if query.trim().is_empty() {
            bail!("search query must not be empty");
        }
        let index = Arc::clone(&self.index.read());
        let hits = index.query(query);

        let mut results = Vec::with_capacity(hits.len());
        for (rank, hit) in hits.iter().enumerate() {
            let Some(record) = self.store.get_by_id(&hit.doc_id)? else {
                tracing::debug!(doc_id = %hit.doc_id, "indexed document missing from store");
                continue;
            };
            results.push(SearchResult {
                record,
                score: hit.score,
                lexical_score: Some(hit.score),
                semantic_score: None,
                lexical_rank: Some(rank as u32),
                semantic_rank: None,
            });
        }
        Ok(apply_filters(results, filters))
    }

    /// Hybrid search: lexical and semantic lists merged with reciprocal
    /// rank fusion. Without a usable semantic provider the lexical ranking
    /// passes through unchanged.
    pub fn hybrid_search(
        &self,
        query: &str,
        filters: &SearchFilters,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        if query.trim().is_empty() {
            bail!("search query must not be empty");
        }
        let index = Arc::clone(&self.index.read());
        let hits = index.query(query);
        let semantic_hits = self.semantic_candidates(query, limit);

        let fused = reciprocal_rank_fusion(&hits, &semantic_hits, limit);
        let mut results = Vec::with_capacity(fused.len());
        for hit in fused {
            let Some(record) = self.store.get_by_id(&hit.doc_id)? else {
                tracing::debug!(doc_id = %hit.doc_id, "fused document missing from store");
                continue;
            };
            results.push(SearchResult {
                record,
                score: hit.fused_score,
                lexical_score: hit.lexical_score,
                semantic_score: hit.semantic_score,
                lexical_rank: hit.lexical_rank.map(|r| r as u32),
                semantic_rank: hit.semantic_rank.map(|r| r as u32),
            });
        }
        Ok(apply_filters(results, filters))
    }

    fn semantic_candidates(&self, query: &str, limit: usize) -> Vec<(String, f32)> {
        let (Some(embedder), Some(semantic)) = (&self.embedder, &self.semantic) else {
            return Vec::new();
        };
        let embedder = Arc::clone(embedder);
        let text = query.to_string();
        let Some(vector) =
            call_bounded("embed_query", self.provider_timeout, move || embedder.embed(&text))
                .flatten()
        else {
            tracing::warn!("query embedding unavailable, degrading to lexical search");
            return Vec::new();
        };
        let semantic = Arc::clone(semantic);
        let fetch = limit.max(1) * SEMANTIC_FETCH_FACTOR;
        call_bounded("similarity_search", self.provider_timeout, move || {
            semantic.similarity_search(&vector, fetch)
        })
        .unwrap_or_default()
    }

    /// Distinct filterable values across the corpus.
    pub fn get_filters(&self) -> Result<FilterOptions> {
        self.store.get_filters()
    }

    /// Corpus-wide aggregates.
    pub fn get_stats(&self) -> Result<CorpusStats> {
        self.store.stats()
    }

    /// Drop all learned categorization state (classifier weights and
    /// keyword idf counts). Records and the index are untouched.
    pub fn reset_learning(&self) {
        self.categorizer.lock().reset();
    }

    /// JSON snapshot of the classifier weights, for reproducing a
    /// categorization run.
    pub fn classifier_snapshot(&self) -> Result<String> {
        self.categorizer.lock().classifier().snapshot()
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

fn unix_secs(t: SystemTime) -> i64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    }
}
