use crate::tokenizer::stem_word;
use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};

/// Reserved fallback category for documents nothing else claims.
pub const FALLBACK_CATEGORY: &str = "General";

/// Token-count cutoff below which filename signal outweighs body text.
pub const MIN_CONTENT_TOKENS: usize = 40;
/// Score bonus when a sparse document's filename carries a category keyword.
pub const FILENAME_MATCH_BONUS: f64 = 10.0;
/// Multiplier for multi-word phrase occurrences over single keywords.
pub const PHRASE_WEIGHT: f64 = 3.0;
/// Classifier prediction confidence required before it may boost a category.
pub const CLASSIFIER_TRUST_THRESHOLD: f64 = 0.6;
/// Boost applied when classifier and keyword rules agree, capped at 1.0.
pub const CLASSIFIER_AGREEMENT_BOOST: f64 = 1.5;
/// Normalized score below which a document falls back to "General".
pub const MIN_CATEGORY_CONFIDENCE: f64 = 0.1;
/// Confidence required before a classification is fed back as training data.
pub const TRAIN_CONFIDENCE_THRESHOLD: f64 = 0.3;
/// Maximum categories attached to a record, primary first.
pub const MAX_CATEGORIES: usize = 3;
/// Maximum project tags extracted per document.
pub const MAX_PROJECT_TAGS: usize = 5;
/// Maximum descriptive keywords extracted per document.
pub const MAX_KEYWORDS: usize = 10;

/// One taxonomy category: single-word keywords are matched against the
/// stemmed token stream, multi-word phrases by substring against the
/// lower-cased raw text.
pub struct Category {
    pub name: &'static str,
    pub stems: Vec<String>,
    pub phrases: Vec<&'static str>,
}

/// A team rule: first regex to match the document text wins.
pub struct TeamRule {
    pub name: &'static str,
    pub pattern: Regex,
}

const CATEGORY_TABLE: &[(&str, &[&str])] = &[
    ("Brand Strategy", &["brand", "branding", "identity", "positioning", "brand guide", "style guide"]),
    ("Social Media", &["social", "facebook", "twitter", "instagram", "linkedin", "post", "hashtag", "engagement"]),
    ("Content Marketing", &["blog", "article", "content", "seo", "editorial", "copywriting"]),
    ("Email Marketing", &["email", "newsletter", "campaign", "mailchimp", "subscriber", "drip"]),
    ("Analytics", &["analytics", "metrics", "kpi", "data", "report", "dashboard", "performance"]),
    ("Advertising", &["ad", "advertising", "ppc", "campaign", "google ads", "facebook ads", "banner"]),
    ("Product Launch", &["launch", "product", "release", "announcement", "rollout"]),
    ("Public Relations", &["pr", "press", "media", "release", "public relations", "publicity"]),
    ("Design", &["design", "graphic", "visual", "mockup", "prototype", "figma", "photoshop"]),
    ("Video Marketing", &["video", "youtube", "vimeo", "animation", "multimedia"]),
    ("Market Research", &["research", "survey", "market", "competitor", "analysis", "insights"]),
];

const TEAM_TABLE: &[(&str, &str)] = &[
    ("Creative Team", r"\b(design|creative|art|visual|graphic)"),
    ("Content Team", r"\b(content|writing|editorial|blog|article)"),
    ("Social Media Team", r"\b(social|community|engagement|hashtag)"),
    ("Analytics Team", r"\b(analytics|metrics|kpi|insights)"),
    ("Product Marketing", r"\b(product|launch|feature|roadmap)"),
    ("Growth Team", r"\b(growth|acquisition|conversion|funnel)"),
];

// Ordered most-specific first; matches are deduplicated and re-sorted
// longest-first by the categorizer.
const PROJECT_PATTERNS: &[&str] = &[
    r"\bq[1-4][-_ ]?(?:20)?\d{2}\b",
    r"\b20\d{2}[-_ ]?q[1-4]\b",
    r"\bfy[-_ ]?\d{2,4}\b",
    r"\b[a-z]{2,5}-\d{1,4}\b",
    r"\b(?:campaign|initiative|phase|sprint)[-_][a-z0-9]+\b",
    r"\bv\d+(?:\.\d+)+\b",
    r"\b(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*[-_ ]?20\d{2}\b",
];

lazy_static! {
    pub static ref TAXONOMY: Vec<Category> = CATEGORY_TABLE
        .iter()
        .map(|&(name, keywords)| {
            let mut stems = Vec::new();
            let mut phrases = Vec::new();
            for kw in keywords.iter() {
                if kw.contains(' ') {
                    phrases.push(*kw);
                } else {
                    stems.push(stem_word(kw));
                }
            }
            Category { name, stems, phrases }
        })
        .collect();
    pub static ref TEAM_RULES: Vec<TeamRule> = TEAM_TABLE
        .iter()
        .map(|&(name, pat)| TeamRule {
            name,
            pattern: Regex::new(pat).expect("valid team regex"),
        })
        .collect();
    pub static ref GENERIC_TEAM_RE: Regex =
        RegexBuilder::new(r"\b(?:team|squad)[ _-]([a-z0-9]+)\b")
            .case_insensitive(true)
            .build()
            .expect("valid generic team regex");
    pub static ref PROJECT_RULES: Vec<Regex> = PROJECT_PATTERNS
        .iter()
        .map(|pat| {
            RegexBuilder::new(pat)
                .case_insensitive(true)
                .build()
                .expect("valid project regex")
        })
        .collect();
}

/// True when `name` is a known taxonomy category or the reserved fallback.
pub fn is_known_category(name: &str) -> bool {
    name == FALLBACK_CATEGORY || TAXONOMY.iter().any(|c| c.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_splits_words_and_phrases() {
        let brand = TAXONOMY.iter().find(|c| c.name == "Brand Strategy").unwrap();
        assert!(brand.phrases.contains(&"style guide"));
        assert!(brand.stems.iter().any(|s| s == &stem_word("branding")));
    }

    #[test]
    fn fallback_is_known() {
        assert!(is_known_category("General"));
        assert!(is_known_category("Analytics"));
        assert!(!is_known_category("Skunkworks"));
    }

    #[test]
    fn project_rules_match_quarter_codes() {
        assert!(PROJECT_RULES[0].is_match("q3-2024"));
        assert!(PROJECT_RULES[0].is_match("Q1 24"));
        assert!(PROJECT_RULES[2].is_match("FY25"));
    }
}
