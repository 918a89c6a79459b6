//! Rule-based classifier used when no language model is available

use super::{Classification, QueryType};

/// Phrases that point at aggregation, ranking and statistics
pub const STRUCTURED_KEYWORDS: &[&str] = &[
    "how many",
    "count",
    "total",
    "average",
    "sum",
    "top",
    "bottom",
    "most",
    "least",
    "highest",
    "lowest",
    "compare",
    "comparison",
    "statistics",
    "stat",
    "number of",
    "percentage",
    "ratio",
];

/// Phrases that point at similarity and content discovery
pub const SEMANTIC_KEYWORDS: &[&str] = &[
    "find",
    "search",
    "similar",
    "like",
    "about",
    "related to",
    "videos on",
    "content about",
    "show me",
    "recommend",
    "suggestion",
];

/// Keyword scoring classifier
///
/// Keywords match whole words or whole phrases, so `"like"` does not fire on
/// `"likes"` and `"top"` does not fire on `"topic"`.
#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, query: &str) -> Classification {
        let words = tokenize(query);
        let structured = count_hits(&words, STRUCTURED_KEYWORDS);
        let semantic = count_hits(&words, SEMANTIC_KEYWORDS);

        let (query_type, confidence, reasoning) = if structured > semantic {
            (
                QueryType::Structured,
                capped_confidence(structured),
                "Query contains analytical keywords",
            )
        } else if semantic > structured {
            (
                QueryType::Semantic,
                capped_confidence(semantic),
                "Query contains semantic search keywords",
            )
        } else if structured > 0 {
            (
                QueryType::Hybrid,
                0.6,
                "Query contains both analytical and semantic keywords",
            )
        } else {
            (
                QueryType::Semantic,
                0.5,
                "No specific keywords found, defaulting to semantic search",
            )
        };

        Classification {
            query_type,
            confidence,
            reasoning: reasoning.to_string(),
            suggested_agent: query_type.as_str().to_string(),
        }
    }
}

fn capped_confidence(hits: usize) -> f64 {
    (0.5 + 0.1 * hits as f64).min(0.7)
}

fn tokenize(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Number of distinct keywords present in `words`
fn count_hits(words: &[String], keywords: &[&str]) -> usize {
    keywords
        .iter()
        .filter(|keyword| contains_phrase(words, keyword))
        .count()
}

fn contains_phrase(words: &[String], phrase: &str) -> bool {
    let parts: Vec<&str> = phrase.split_whitespace().collect();
    if parts.is_empty() || parts.len() > words.len() {
        return false;
    }
    words
        .windows(parts.len())
        .any(|window| window.iter().zip(&parts).all(|(w, p)| w == p))
}
