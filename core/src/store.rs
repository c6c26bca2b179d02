use crate::model::{
    doc_id_for_path, CategoryCount, CorpusStats, DocumentRecord, FileTypeStat, FilterOptions,
    RecentDocument,
};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;

/// Number of entries in the recent-documents and top-categories breakdowns.
const STATS_TOP_N: usize = 5;

/// Persistence seam for document records, keyed by the path-derived id.
///
/// The search subsystem treats the store as an external collaborator: a
/// write failure aborts that one document's ingestion, while everything
/// else degrades. `get_filters` and `stats` have default implementations
/// derived from `list_all`, so a minimal backend only implements CRUD.
pub trait DocumentStore: Send + Sync {
    fn upsert(&self, record: &DocumentRecord) -> Result<String>;
    fn get_by_id(&self, id: &str) -> Result<Option<DocumentRecord>>;
    fn get_by_path(&self, full_path: &str) -> Result<Option<DocumentRecord>> {
        self.get_by_id(&doc_id_for_path(full_path))
    }
    /// Returns true when a record existed and was removed.
    fn delete(&self, full_path: &str) -> Result<bool>;
    /// All records, ordered by path for deterministic downstream builds.
    fn list_all(&self) -> Result<Vec<DocumentRecord>>;

    /// Distinct filterable values across the corpus, sorted.
    fn get_filters(&self) -> Result<FilterOptions> {
        let records = self.list_all()?;
        let mut categories = BTreeSet::new();
        let mut projects = BTreeSet::new();
        let mut teams = BTreeSet::new();
        let mut extensions = BTreeSet::new();
        for record in &records {
            for c in &record.categories {
                categories.insert(c.clone());
            }
            if let Some(p) = &record.project {
                projects.insert(p.clone());
            }
            if let Some(t) = &record.team {
                teams.insert(t.clone());
            }
            if !record.extension.is_empty() {
                extensions.insert(record.extension.clone());
            }
        }
        Ok(FilterOptions {
            categories: categories.into_iter().collect(),
            projects: projects.into_iter().collect(),
            teams: teams.into_iter().collect(),
            extensions: extensions.into_iter().collect(),
        })
    }

    /// Corpus-wide aggregates.
    fn stats(&self) -> Result<CorpusStats> {
        let records = self.list_all()?;
        let options = self.get_filters()?;

        let mut category_counts: BTreeMap<String, u64> = BTreeMap::new();
        let mut file_types: BTreeMap<String, (u64, u64)> = BTreeMap::new();
        let mut total_size = 0u64;
        for record in &records {
            total_size += record.size;
            for c in &record.categories {
                *category_counts.entry(c.clone()).or_insert(0) += 1;
            }
            let entry = file_types.entry(record.extension.clone()).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += record.size;
        }

        let mut recent: Vec<&DocumentRecord> = records.iter().collect();
        recent.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.id.cmp(&b.id)));
        let recent_documents = recent
            .into_iter()
            .take(STATS_TOP_N)
            .map(|r| RecentDocument { filename: r.filename.clone(), modified: r.modified })
            .collect();

        let mut top_categories: Vec<CategoryCount> = category_counts
            .into_iter()
            .map(|(name, count)| CategoryCount { name, count })
            .collect();
        top_categories.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        top_categories.truncate(STATS_TOP_N);

        let mut file_types: Vec<FileTypeStat> = file_types
            .into_iter()
            .map(|(extension, (count, total_size))| FileTypeStat { extension, count, total_size })
            .collect();
        file_types.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.extension.cmp(&b.extension)));

        Ok(CorpusStats {
            total_documents: records.len() as u64,
            total_categories: options.categories.len() as u64,
            total_projects: options.projects.len() as u64,
            total_teams: options.teams.len() as u64,
            total_size,
            recent_documents,
            top_categories,
            file_types,
        })
    }
}

/// Sled-backed store: bincode-encoded records keyed by document id.
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path.as_ref())
            .with_context(|| format!("open document store at {}", path.as_ref().display()))?;
        Ok(Self { db })
    }

    /// Block until all pending writes reach disk.
    pub fn flush(&self) -> Result<()> {
        self.db.flush().context("flush document store")?;
        Ok(())
    }
}

impl DocumentStore for SledStore {
    fn upsert(&self, record: &DocumentRecord) -> Result<String> {
        let bytes = bincode::serialize(record).context("encode document record")?;
        self.db
            .insert(record.id.as_bytes(), bytes)
            .with_context(|| format!("upsert document {}", record.rel_path))?;
        Ok(record.id.clone())
    }

    fn get_by_id(&self, id: &str) -> Result<Option<DocumentRecord>> {
        match self.db.get(id.as_bytes()).context("read document store")? {
            Some(bytes) => {
                let record = bincode::deserialize(&bytes).context("decode document record")?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn delete(&self, full_path: &str) -> Result<bool> {
        let id = doc_id_for_path(full_path);
        let prior = self
            .db
            .remove(id.as_bytes())
            .with_context(|| format!("delete document {full_path}"))?;
        Ok(prior.is_some())
    }

    fn list_all(&self) -> Result<Vec<DocumentRecord>> {
        let mut records = Vec::new();
        for entry in self.db.iter() {
            let (_, bytes) = entry.context("scan document store")?;
            records.push(bincode::deserialize::<DocumentRecord>(&bytes).context("decode document record")?);
        }
        records.sort_by(|a, b| a.full_path.cmp(&b.full_path));
        Ok(records)
    }
}
