use crate::model::DocumentRecord;
use crate::tokenizer::tokenize;
use std::collections::HashMap;

pub type DocKey = u32;
pub type TermId = u32;

/// Indexed fields with their relevance boosts. Filename and categorial
/// metadata intentionally outweigh raw content: short document titles are
/// highly discriminative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Filename,
    Content,
    Categories,
    Project,
    Team,
    Keywords,
    Path,
}

impl Field {
    pub fn boost(self) -> f32 {
        match self {
            Field::Filename => 10.0,
            Field::Categories => 8.0,
            Field::Project => 7.0,
            Field::Team => 7.0,
            Field::Keywords => 6.0,
            Field::Content => 5.0,
            Field::Path => 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Posting {
    pub doc: DocKey,
    pub field: Field,
    pub tf: u32,
}

/// One lexical query answer.
#[derive(Debug, Clone, PartialEq)]
pub struct LexicalHit {
    pub doc_id: String,
    pub score: f32,
}

/// Weighted multi-field inverted index over the current record set.
///
/// `build` replaces the whole structure; `add_record`/`remove_doc` patch it
/// incrementally with upsert semantics. Queries over two indexes built from
/// the same record sequence return identical results.
#[derive(Debug, Clone, Default)]
pub struct InvertedIndex {
    dictionary: HashMap<String, TermId>,
    postings: HashMap<TermId, Vec<Posting>>,
    docs: Vec<Option<String>>,
    by_id: HashMap<String, DocKey>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fresh index over `records`, replacing all prior postings.
    pub fn build(records: &[DocumentRecord]) -> Self {
        let mut index = Self::new();
        for record in records {
            index.add_record(record);
        }
        index
    }

    pub fn doc_count(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn contains(&self, doc_id: &str) -> bool {
        self.by_id.contains_key(doc_id)
    }

    /// Insert or replace one document's postings.
    pub fn add_record(&mut self, record: &DocumentRecord) {
        let key = match self.by_id.get(&record.id) {
            Some(&key) => {
                self.strip_postings(key);
                key
            }
            None => {
                let key = self.docs.len() as DocKey;
                self.docs.push(Some(record.id.clone()));
                self.by_id.insert(record.id.clone(), key);
                key
            }
        };

        for (field, text) in field_texts(record) {
            let mut tf: HashMap<String, u32> = HashMap::new();
            for term in tokenize(&text) {
                *tf.entry(term).or_insert(0) += 1;
            }
            let mut terms: Vec<(String, u32)> = tf.into_iter().collect();
            terms.sort_by(|a, b| a.0.cmp(&b.0));
            for (term, count) in terms {
                let next_id = self.dictionary.len() as TermId;
                let term_id = *self.dictionary.entry(term).or_insert(next_id);
                self.postings
                    .entry(term_id)
                    .or_default()
                    .push(Posting { doc: key, field, tf: count });
            }
        }
    }

    /// Remove one document; afterwards no posting references it.
    pub fn remove_doc(&mut self, doc_id: &str) -> bool {
        let Some(key) = self.by_id.remove(doc_id) else {
            return false;
        };
        self.docs[key as usize] = None;
        self.strip_postings(key);
        true
    }

    fn strip_postings(&mut self, key: DocKey) {
        for plist in self.postings.values_mut() {
            plist.retain(|p| p.doc != key);
        }
        self.postings.retain(|_, plist| !plist.is_empty());
    }

    /// Ranked lexical query: distinct query terms accumulate log-damped
    /// term frequency times field boost, scaled by the fraction of query
    /// terms a document matches (Lucene-style coord factor, so coverage
    /// beats repetition). Unknown terms contribute nothing; an empty index
    /// yields an empty list.
    pub fn query(&self, text: &str) -> Vec<LexicalHit> {
        let mut terms = tokenize(text);
        terms.sort();
        terms.dedup();
        if terms.is_empty() {
            return Vec::new();
        }

        let mut scores: HashMap<DocKey, (f32, u32)> = HashMap::new();
        for term in &terms {
            let Some(term_id) = self.dictionary.get(term) else {
                continue;
            };
            let Some(plist) = self.postings.get(term_id) else {
                continue;
            };
            let mut per_doc: HashMap<DocKey, f32> = HashMap::new();
            for posting in plist {
                let damped = 1.0 + (posting.tf as f32).ln();
                *per_doc.entry(posting.doc).or_insert(0.0) += damped * posting.field.boost();
            }
            for (doc, contribution) in per_doc {
                let entry = scores.entry(doc).or_insert((0.0, 0));
                entry.0 += contribution;
                entry.1 += 1;
            }
        }

        let total_terms = terms.len() as f32;
        let mut hits: Vec<LexicalHit> = scores
            .into_iter()
            .filter_map(|(key, (score, matched))| {
                self.docs[key as usize].as_ref().map(|id| LexicalHit {
                    doc_id: id.clone(),
                    score: score * (matched as f32 / total_terms),
                })
            })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.doc_id.cmp(&b.doc_id))
        });
        hits
    }
}

fn field_texts(record: &DocumentRecord) -> Vec<(Field, String)> {
    vec![
        (Field::Filename, record.filename.clone()),
        (Field::Content, record.content.clone()),
        (Field::Categories, record.categories.join(" ")),
        (Field::Project, record.project.clone().unwrap_or_default()),
        (Field::Team, record.team.clone().unwrap_or_default()),
        (Field::Keywords, record.keywords.join(" ")),
        (Field::Path, record.rel_path.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::doc_id_for_path;

    fn record(path: &str, filename: &str, content: &str) -> DocumentRecord {
        DocumentRecord {
            id: doc_id_for_path(path),
            filename: filename.to_string(),
            rel_path: path.trim_start_matches('/').to_string(),
            full_path: path.to_string(),
            content: content.to_string(),
            extension: "txt".to_string(),
            size: content.len() as u64,
            created: 1_700_000_000,
            modified: 1_700_000_000,
            categories: vec!["General".to_string()],
            confidence: 0.0,
            project: None,
            projects: Vec::new(),
            team: None,
            keywords: Vec::new(),
            preview: String::new(),
        }
    }

    #[test]
    fn filename_match_outranks_content_match() {
        let a = record("/a", "budget_report.txt", "weekly sync notes");
        let b = record("/b", "notes.txt", "the budget was discussed at length");
        let index = InvertedIndex::build(&[a.clone(), b.clone()]);

        let hits = index.query("budget");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].doc_id, a.id);
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn more_distinct_terms_rank_higher() {
        let a = record("/a", "a.txt", "launch checklist with rollout steps");
        let b = record("/b", "b.txt", "launch launch launch launch launch");
        let index = InvertedIndex::build(&[a.clone(), b.clone()]);

        let hits = index.query("launch rollout");
        assert_eq!(hits[0].doc_id, a.id);
    }

    #[test]
    fn unknown_terms_and_empty_index_yield_nothing() {
        let index = InvertedIndex::new();
        assert!(index.query("anything").is_empty());

        let index = InvertedIndex::build(&[record("/a", "a.txt", "plain text")]);
        assert!(index.query("zzzzqqq").is_empty());
    }

    #[test]
    fn remove_leaves_no_stale_postings() {
        let a = record("/a", "brief.txt", "campaign brief");
        let b = record("/b", "other.txt", "campaign notes");
        let mut index = InvertedIndex::build(&[a.clone(), b.clone()]);

        assert!(index.remove_doc(&a.id));
        assert!(!index.contains(&a.id));
        let hits = index.query("campaign");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc_id, b.id);
        assert!(!index.remove_doc(&a.id));
    }

    #[test]
    fn upsert_replaces_prior_postings() {
        let mut a = record("/a", "plan.txt", "email newsletter plan");
        let mut index = InvertedIndex::build(std::slice::from_ref(&a));
        assert_eq!(index.query("newsletter").len(), 1);

        a.content = "video storyboard".to_string();
        index.add_record(&a);
        assert_eq!(index.doc_count(), 1);
        assert!(index.query("newsletter").is_empty());
        assert_eq!(index.query("video").len(), 1);
    }

    #[test]
    fn rebuild_is_deterministic() {
        let records = vec![
            record("/x", "q3_review.txt", "quarterly analytics review with dashboards"),
            record("/y", "launch.txt", "product launch rollout"),
            record("/z", "notes.txt", "analytics deep dive notes"),
        ];
        let first = InvertedIndex::build(&records);
        let second = InvertedIndex::build(&records);
        assert_eq!(first.query("analytics review"), second.query("analytics review"));
        assert_eq!(first.query("launch"), second.query("launch"));
    }
}
