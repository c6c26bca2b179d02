/// Character budget for record previews.
pub const PREVIEW_MAX_LEN: usize = 200;

/// Build a human-readable preview: whole sentences while they fit the
/// budget, otherwise a hard character truncation with an ellipsis.
pub fn build_preview(content: &str) -> String {
    build_preview_with_budget(content, PREVIEW_MAX_LEN)
}

pub fn build_preview_with_budget(content: &str, budget: usize) -> String {
    let cleaned = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.chars().count() <= budget {
        return cleaned;
    }

    let mut preview = String::new();
    let mut used = 0usize;
    for sentence in split_sentences(&cleaned) {
        let len = sentence.chars().count() + if used > 0 { 1 } else { 0 };
        if used + len > budget {
            break;
        }
        if used > 0 {
            preview.push(' ');
        }
        preview.push_str(sentence);
        used += len;
    }
    if !preview.is_empty() {
        return preview;
    }

    // No complete sentence fits; fall back to a hard cut.
    let mut truncated: String = cleaned.chars().take(budget).collect();
    truncated = truncated.trim_end().to_string();
    truncated.push_str("...");
    truncated
}

fn split_sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split_inclusive(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
