use crate::index::LexicalHit;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// One fused ranking entry.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedHit {
    pub doc_id: String,
    pub fused_score: f32,
    pub lexical_score: Option<f32>,
    pub semantic_score: Option<f32>,
    /// 0-based rank in the lexical source list.
    pub lexical_rank: Option<usize>,
    /// 0-based rank in the semantic source list.
    pub semantic_rank: Option<usize>,
}

/// Reciprocal rank fusion of a lexical and a semantic result list.
///
/// Each list contributes `1 / (rank + 1)` (0-based rank) for every document
/// it contains; documents in both lists sum both contributions. Ties break
/// toward the lower lexical rank (the stabler signal), then ascending
/// document id. When the semantic list is empty the lexical ranking passes
/// through untouched, original scores included.
pub fn reciprocal_rank_fusion(
    lexical: &[LexicalHit],
    semantic: &[(String, f32)],
    limit: usize,
) -> Vec<FusedHit> {
    if semantic.is_empty() {
        return lexical
            .iter()
            .enumerate()
            .take(limit)
            .map(|(rank, hit)| FusedHit {
                doc_id: hit.doc_id.clone(),
                fused_score: hit.score,
                lexical_score: Some(hit.score),
                semantic_score: None,
                lexical_rank: Some(rank),
                semantic_rank: None,
            })
            .collect();
    }

    let mut merged: HashMap<&str, FusedHit> = HashMap::new();
    for (rank, hit) in lexical.iter().enumerate() {
        let contribution = 1.0 / (rank as f32 + 1.0);
        merged.insert(
            hit.doc_id.as_str(),
            FusedHit {
                doc_id: hit.doc_id.clone(),
                fused_score: contribution,
                lexical_score: Some(hit.score),
                semantic_score: None,
                lexical_rank: Some(rank),
                semantic_rank: None,
            },
        );
    }
    for (rank, (doc_id, score)) in semantic.iter().enumerate() {
        let contribution = 1.0 / (rank as f32 + 1.0);
        match merged.entry(doc_id.as_str()) {
            Entry::Occupied(mut entry) => {
                let hit = entry.get_mut();
                hit.fused_score += contribution;
                hit.semantic_score = Some(*score);
                hit.semantic_rank = Some(rank);
            }
            Entry::Vacant(entry) => {
                entry.insert(FusedHit {
                    doc_id: doc_id.clone(),
                    fused_score: contribution,
                    lexical_score: None,
                    semantic_score: Some(*score),
                    lexical_rank: None,
                    semantic_rank: Some(rank),
                });
            }
        }
    }

    let mut fused: Vec<FusedHit> = merged.into_values().collect();
    fused.sort_by(|a, b| {
        b.fused_score
            .partial_cmp(&a.fused_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                let ar = a.lexical_rank.unwrap_or(usize::MAX);
                let br = b.lexical_rank.unwrap_or(usize::MAX);
                ar.cmp(&br)
            })
            .then_with(|| a.doc_id.cmp(&b.doc_id))
    });
    fused.truncate(limit);
    fused
}
