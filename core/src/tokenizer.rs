use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

/// Minimum token length for keyword extraction.
pub const KEYWORD_MIN_TOKEN_LEN: usize = 3;
/// Minimum token length for taxonomy categorization.
pub const CATEGORY_MIN_TOKEN_LEN: usize = 4;

lazy_static! {
    // Unlike a plain \w run, underscores separate tokens: snake_case
    // filenames must index as their constituent words.
    static ref RE: Regex = Regex::new(r"(?u)\p{L}[\p{L}\p{N}']*").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
}

/// Normalize text into an ordered token stream using NFKC normalization,
/// lowercasing, stopword removal, and English stemming. Pure function.
pub fn tokenize(text: &str) -> Vec<String> {
    tokenize_min_len(text, 1)
}

/// Same as [`tokenize`], additionally dropping tokens shorter than
/// `min_len` characters before stemming.
pub fn tokenize_min_len(text: &str, min_len: usize) -> Vec<String> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    let mut tokens = Vec::new();
    for mat in RE.find_iter(&normalized) {
        let token = mat.as_str();
        if is_stopword(token) {
            continue;
        }
        if token.chars().count() < min_len {
            continue;
        }
        tokens.push(STEMMER.stem(token).to_string());
    }
    tokens
}

/// Stem a single already-lowercased word. Keeps static keyword tables
/// aligned with the token stream.
pub fn stem_word(word: &str) -> String {
    STEMMER.stem(word).to_string()
}
