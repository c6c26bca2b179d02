use crate::model::{DocumentRecord, SearchResult};
use serde::{Deserialize, Serialize};

/// Structured post-filters. Absent fields impose no constraint; date
/// bounds are inclusive and compare against the modification timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub extension: Option<String>,
    pub category: Option<String>,
    pub project: Option<String>,
    pub team: Option<String>,
    /// Unix seconds, inclusive lower bound.
    pub date_from: Option<i64>,
    /// Unix seconds, inclusive upper bound.
    pub date_to: Option<i64>,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        self.extension.is_none()
            && self.category.is_none()
            && self.project.is_none()
            && self.team.is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
    }

    pub fn matches(&self, record: &DocumentRecord) -> bool {
        if let Some(ext) = &self.extension {
            if &record.extension != ext {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if !record.categories.contains(category) {
                return false;
            }
        }
        if let Some(project) = &self.project {
            if record.project.as_deref() != Some(project.as_str()) {
                return false;
            }
        }
        if let Some(team) = &self.team {
            if record.team.as_deref() != Some(team.as_str()) {
                return false;
            }
        }
        if let Some(from) = self.date_from {
            if record.modified < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if record.modified > to {
                return false;
            }
        }
        true
    }
}

/// Narrow a ranked candidate list without disturbing relative order.
pub fn apply_filters(results: Vec<SearchResult>, filters: &SearchFilters) -> Vec<SearchResult> {
    if filters.is_empty() {
        return results;
    }
    results
        .into_iter()
        .filter(|r| filters.matches(&r.record))
        .collect()
}
