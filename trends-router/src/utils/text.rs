//! Plain-text helpers for model output

/// Extract the body of the first fenced code block tagged `lang`
///
/// Falls back to the first untagged ``` block. Returns `None` when the text
/// has no fences at all, so callers can treat the whole reply as content.
pub fn extract_fenced(text: &str, lang: &str) -> Option<String> {
    let tagged = format!("```{}", lang);
    let start = if let Some(pos) = text.find(&tagged) {
        pos + tagged.len()
    } else {
        text.find("```")? + 3
    };

    let body = &text[start..];
    let end = body.find("```").unwrap_or(body.len());
    Some(body[..end].trim().to_string())
}

/// Truncate to at most `max` characters, appending "..." when cut
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}
