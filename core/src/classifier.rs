use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Prediction returned by [`OnlineClassifier::predict`].
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub category: String,
    pub confidence: f64,
}

/// Online multinomial naive-Bayes classifier over normalized tokens.
///
/// Weights grow incrementally as labeled examples arrive; there is no full
/// retraining. The instance is explicitly owned by its caller and can be
/// reset or snapshotted so classification stays reproducible in tests.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct OnlineClassifier {
    class_docs: HashMap<String, u64>,
    class_tokens: HashMap<String, u64>,
    token_counts: HashMap<String, HashMap<String, u64>>,
    vocabulary: HashSet<String>,
    total_docs: u64,
}

impl OnlineClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of training examples observed so far.
    pub fn observed(&self) -> u64 {
        self.total_docs
    }

    /// Add one labeled example.
    pub fn train(&mut self, tokens: &[String], category: &str) {
        if tokens.is_empty() {
            return;
        }
        self.total_docs += 1;
        *self.class_docs.entry(category.to_string()).or_insert(0) += 1;
        *self.class_tokens.entry(category.to_string()).or_insert(0) += tokens.len() as u64;
        let counts = self.token_counts.entry(category.to_string()).or_default();
        for token in tokens {
            *counts.entry(token.clone()).or_insert(0) += 1;
            self.vocabulary.insert(token.clone());
        }
    }

    /// Most probable category with its normalized posterior probability.
    /// Returns `None` until at least one example has been trained.
    pub fn predict(&self, tokens: &[String]) -> Option<Prediction> {
        if self.total_docs == 0 || tokens.is_empty() {
            return None;
        }
        let vocab_size = self.vocabulary.len().max(1) as f64;

        // Log-space scores per class, Laplace-smoothed; classes visited in
        // sorted order so float accumulation is deterministic.
        let mut classes: Vec<&String> = self.class_docs.keys().collect();
        classes.sort();
        let mut scored: Vec<(&String, f64)> = Vec::with_capacity(classes.len());
        for class in classes {
            let prior = self.class_docs[class] as f64 / self.total_docs as f64;
            let token_total = self.class_tokens.get(class).copied().unwrap_or(0) as f64;
            let counts = self.token_counts.get(class);
            let mut log_prob = prior.ln();
            for token in tokens {
                let count = counts
                    .and_then(|c| c.get(token))
                    .copied()
                    .unwrap_or(0) as f64;
                log_prob += ((count + 1.0) / (token_total + vocab_size)).ln();
            }
            scored.push((class, log_prob));
        }

        // Softmax over log-probs for a comparable confidence in [0, 1].
        let max_log = scored
            .iter()
            .map(|(_, lp)| *lp)
            .fold(f64::NEG_INFINITY, f64::max);
        let total: f64 = scored.iter().map(|(_, lp)| (lp - max_log).exp()).sum();
        scored
            .into_iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(class, lp)| Prediction {
                category: class.clone(),
                confidence: (lp - max_log).exp() / total,
            })
    }

    /// Drop all learned weights.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Serialize learned weights to JSON.
    pub fn snapshot(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restore weights from a [`snapshot`](Self::snapshot).
    pub fn restore(snapshot: &str) -> Result<Self> {
        Ok(serde_json::from_str(snapshot)?)
    }
}
