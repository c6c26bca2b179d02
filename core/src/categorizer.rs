use crate::classifier::OnlineClassifier;
use crate::taxonomy::{
    self, CLASSIFIER_AGREEMENT_BOOST, CLASSIFIER_TRUST_THRESHOLD, FALLBACK_CATEGORY,
    FILENAME_MATCH_BONUS, GENERIC_TEAM_RE, MAX_CATEGORIES, MAX_KEYWORDS, MAX_PROJECT_TAGS,
    MIN_CATEGORY_CONFIDENCE, MIN_CONTENT_TOKENS, PHRASE_WEIGHT, PROJECT_RULES, TAXONOMY,
    TEAM_RULES, TRAIN_CONFIDENCE_THRESHOLD,
};
use crate::tokenizer::{tokenize_min_len, CATEGORY_MIN_TOKEN_LEN, KEYWORD_MIN_TOKEN_LEN};
use std::collections::{HashMap, HashSet};

/// Categorization output for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Categorization {
    /// Primary category first, capped at [`MAX_CATEGORIES`].
    pub categories: Vec<String>,
    /// Normalized score of the primary category in [0, 1].
    pub confidence: f64,
    /// Longest-first project tags, capped at [`MAX_PROJECT_TAGS`].
    pub projects: Vec<String>,
    pub team: Option<String>,
    /// Most important first, capped at [`MAX_KEYWORDS`].
    pub keywords: Vec<String>,
}

impl Categorization {
    fn fallback() -> Self {
        Self {
            categories: vec![FALLBACK_CATEGORY.to_string()],
            confidence: 0.0,
            projects: Vec::new(),
            team: None,
            keywords: Vec::new(),
        }
    }
}

/// Maps (content, filename, relative path) to taxonomy categories, project
/// and team tags, and descriptive keywords.
///
/// Holds the mutable learning state of the pipeline: the online classifier
/// and the corpus document-frequency table behind keyword idf weighting.
/// Both are owned here so callers control their lifecycle explicitly.
pub struct Categorizer {
    classifier: OnlineClassifier,
    corpus_docs: u64,
    term_doc_freq: HashMap<String, u64>,
}

impl Default for Categorizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Categorizer {
    pub fn new() -> Self {
        Self {
            classifier: OnlineClassifier::new(),
            corpus_docs: 0,
            term_doc_freq: HashMap::new(),
        }
    }

    pub fn classifier(&self) -> &OnlineClassifier {
        &self.classifier
    }

    /// Drop all learned state (classifier weights and keyword idf counts).
    pub fn reset(&mut self) {
        self.classifier.reset();
        self.corpus_docs = 0;
        self.term_doc_freq.clear();
    }

    pub fn categorize(&mut self, content: &str, filename: &str, rel_path: &str) -> Categorization {
        let raw = format!("{content} {filename}");
        let lower = raw.to_lowercase();
        let filename_lower = filename.to_lowercase();
        let tokens = tokenize_min_len(&raw, CATEGORY_MIN_TOKEN_LEN);

        let projects = extract_projects(&raw, rel_path);
        let team = extract_team(&lower);

        if tokens.is_empty() {
            let mut out = Categorization::fallback();
            out.projects = projects;
            out.team = team;
            return out;
        }

        let mut token_freq: HashMap<&str, f64> = HashMap::new();
        for token in &tokens {
            *token_freq.entry(token.as_str()).or_insert(0.0) += 1.0;
        }

        // Rule scores per taxonomy category, in table order.
        let sparse = tokens.len() < MIN_CONTENT_TOKENS;
        let mut raw_scores: Vec<f64> = Vec::with_capacity(TAXONOMY.len());
        for category in TAXONOMY.iter() {
            let mut score = 0.0;
            for stem in &category.stems {
                score += token_freq.get(stem.as_str()).copied().unwrap_or(0.0);
            }
            for phrase in &category.phrases {
                score += lower.matches(phrase).count() as f64 * PHRASE_WEIGHT;
            }
            if sparse && filename_signal(&filename_lower, category) {
                // Body text is unreliable; a matching filename dominates.
                score += FILENAME_MATCH_BONUS;
            }
            raw_scores.push(score);
        }

        let max_score = raw_scores.iter().cloned().fold(0.0_f64, f64::max).max(1.0);
        let mut normalized: Vec<(usize, f64)> = raw_scores
            .iter()
            .enumerate()
            .map(|(i, s)| (i, s / max_score))
            .collect();

        // The classifier may amplify a category the rules already saw.
        if let Some(prediction) = self.classifier.predict(&tokens) {
            if prediction.confidence > CLASSIFIER_TRUST_THRESHOLD {
                if let Some(pos) = TAXONOMY.iter().position(|c| c.name == prediction.category) {
                    if raw_scores[pos] > 0.0 {
                        normalized[pos].1 =
                            (normalized[pos].1 * CLASSIFIER_AGREEMENT_BOOST).min(1.0);
                    }
                }
            }
        }

        normalized.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| TAXONOMY[a.0].name.cmp(TAXONOMY[b.0].name))
        });

        let (primary_idx, confidence) = normalized[0];
        let (categories, chosen) = if confidence < MIN_CATEGORY_CONFIDENCE {
            (vec![FALLBACK_CATEGORY.to_string()], FALLBACK_CATEGORY)
        } else {
            let names: Vec<String> = normalized
                .iter()
                .filter(|(_, s)| *s >= MIN_CATEGORY_CONFIDENCE)
                .take(MAX_CATEGORIES)
                .map(|(i, _)| TAXONOMY[*i].name.to_string())
                .collect();
            (names, TAXONOMY[primary_idx].name)
        };

        // Continuous online learning: confident classifications become
        // training data for future predictions.
        if confidence > TRAIN_CONFIDENCE_THRESHOLD {
            self.classifier.train(&tokens, chosen);
        }

        let keywords = self.extract_keywords(&raw);

        Categorization {
            categories,
            confidence,
            projects,
            team,
            keywords,
        }
    }

    /// Top descriptive terms by tf-idf against the corpus seen so far.
    fn extract_keywords(&mut self, raw: &str) -> Vec<String> {
        let tokens = tokenize_min_len(raw, KEYWORD_MIN_TOKEN_LEN);
        if tokens.is_empty() {
            return Vec::new();
        }

        let mut tf: HashMap<&str, f64> = HashMap::new();
        for token in &tokens {
            *tf.entry(token.as_str()).or_insert(0.0) += 1.0;
        }

        // This document joins the corpus before scoring, so df >= 1.
        self.corpus_docs += 1;
        for term in tf.keys() {
            *self.term_doc_freq.entry(term.to_string()).or_insert(0) += 1;
        }

        let n = self.corpus_docs as f64;
        let mut scored: Vec<(&str, f64)> = tf
            .iter()
            .map(|(term, freq)| {
                let df = self.term_doc_freq.get(*term).copied().unwrap_or(1).max(1) as f64;
                (*term, freq * (1.0 + n / df).ln())
            })
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        scored
            .into_iter()
            .take(MAX_KEYWORDS)
            .map(|(term, _)| term.to_string())
            .collect()
    }
}

fn filename_signal(filename_lower: &str, category: &taxonomy::Category) -> bool {
    category
        .phrases
        .iter()
        .any(|p| filename_lower.contains(p))
        || category
            .stems
            .iter()
            .any(|s| filename_lower.contains(s.as_str()))
}

/// Ordered pattern rules over the raw text, then directory-name heuristics
/// over the relative path. Longest match first, deduplicated.
fn extract_projects(raw: &str, rel_path: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let haystack = format!("{raw} {rel_path}");

    for rule in PROJECT_RULES.iter() {
        for mat in rule.find_iter(&haystack) {
            let tag = mat.as_str().to_string();
            if seen.insert(tag.to_lowercase()) {
                tags.push(tag);
            }
        }
    }

    // Directory layout fallback: a segment like "projects/" or
    // "campaigns/" names the project in the next segment.
    let segments: Vec<&str> = rel_path
        .split(['/', '\\'])
        .filter(|s| !s.is_empty())
        .collect();
    for window in segments.windows(2) {
        let marker = window[0].to_lowercase();
        if marker.contains("project") || marker.contains("campaign") || marker.contains("client") {
            let tag = window[1].to_string();
            if seen.insert(tag.to_lowercase()) {
                tags.push(tag);
            }
        }
    }

    tags.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then_with(|| a.cmp(b)));
    tags.truncate(MAX_PROJECT_TAGS);
    tags
}

/// Department rules in priority order, then generic "Team X / Squad N".
fn extract_team(lower: &str) -> Option<String> {
    for rule in TEAM_RULES.iter() {
        if rule.pattern.is_match(lower) {
            return Some(rule.name.to_string());
        }
    }
    GENERIC_TEAM_RE.captures(lower).map(|caps| {
        let name = &caps[1];
        let mut chars = name.chars();
        let capitalized = match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        };
        format!("Team {capitalized}")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_tokens_falls_back_to_general() {
        let mut cat = Categorizer::new();
        let out = cat.categorize("", "", "");
        assert_eq!(out.categories, vec!["General".to_string()]);
        assert_eq!(out.confidence, 0.0);
        assert!(out.keywords.is_empty());
    }

    #[test]
    fn keyword_rules_pick_the_obvious_category() {
        let mut cat = Categorizer::new();
        let content = "Email newsletter campaign plan. Subscriber segments get a \
                       drip sequence; every newsletter links back to the campaign \
                       landing page for subscriber growth tracking purposes.";
        let out = cat.categorize(content, "newsletter_plan.docx", "email/newsletter_plan.docx");
        assert_eq!(out.categories[0], "Email Marketing");
        assert!(out.confidence >= 0.9);
    }

    #[test]
    fn phrases_outweigh_single_words() {
        let mut cat = Categorizer::new();
        let content = "The style guide and brand guide define tone. The style guide \
                       rules every asset.";
        let out = cat.categorize(content, "guide.txt", "guide.txt");
        assert_eq!(out.categories[0], "Brand Strategy");
    }

    #[test]
    fn sparse_content_leans_on_filename() {
        let mut cat = Categorizer::new();
        // Scanned-PDF style: nearly no usable body text.
        let out = cat.categorize("scan", "instagram_hashtag_calendar.pdf", "instagram_hashtag_calendar.pdf");
        assert_eq!(out.categories[0], "Social Media");
        assert!(out.confidence >= MIN_CATEGORY_CONFIDENCE);
    }

    #[test]
    fn extracts_project_patterns_longest_first() {
        let projects = extract_projects("Kickoff for Q3-2024 under ACME-42, phase_two", "docs/brief.txt");
        assert!(projects.contains(&"Q3-2024".to_string()));
        assert!(projects.contains(&"ACME-42".to_string()));
        let lens: Vec<usize> = projects.iter().map(|p| p.chars().count()).collect();
        let mut sorted = lens.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(lens, sorted);
    }

    #[test]
    fn project_directory_fallback() {
        let projects = extract_projects("agenda", "clients/Initech/notes.txt");
        assert!(projects.contains(&"Initech".to_string()));
    }

    #[test]
    fn team_rules_win_over_generic_pattern() {
        assert_eq!(
            extract_team("analytics dashboard for team rocket"),
            Some("Analytics Team".to_string())
        );
        assert_eq!(
            extract_team("notes from team rocket standup"),
            Some("Team Rocket".to_string())
        );
        assert_eq!(extract_team("quarterly budget numbers"), None);
    }

    #[test]
    fn keywords_are_frequency_ranked_and_capped() {
        let mut cat = Categorizer::new();
        let content = "pipeline pipeline pipeline conversion conversion attribution \
                       alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let out = cat.categorize(content, "metrics.txt", "metrics.txt");
        assert!(out.keywords.len() <= MAX_KEYWORDS);
        assert_eq!(out.keywords[0], "pipelin");
    }

    #[test]
    fn confident_runs_train_the_classifier() {
        let mut cat = Categorizer::new();
        let content = "Video storyboard for the youtube channel. Video edits, \
                       animation passes and multimedia export settings for video.";
        cat.categorize(content, "video_plan.txt", "video_plan.txt");
        assert_eq!(cat.classifier().observed(), 1);
    }
}
