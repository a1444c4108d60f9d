//! Search query normalization.

use serde::Deserialize;

pub const DEFAULT_MIN_CHARS: usize = 2;
pub const DEFAULT_SEARCH_LIMIT: i64 = 20;
pub const MAX_SEARCH_LIMIT: i64 = 100;

/// Raw query-string parameters of a search endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub limit: Option<i64>,
}

/// A normalized search term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    term: String,
    active: bool,
    limit: i64,
}

impl SearchQuery {
    /// Trims `raw`; terms shorter than `min_chars` characters are inactive.
    pub fn new(raw: &str, min_chars: usize) -> Self {
        let term = raw.trim().to_string();
        let active = !term.is_empty() && term.chars().count() >= min_chars;
        Self {
            term,
            active,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    pub fn from_params(params: &SearchParams, min_chars: usize, max_limit: i64) -> Self {
        Self::new(&params.q, min_chars)
            .with_limit(params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT), max_limit)
    }

    /// Sets the result limit, clamped to `1..=max_limit`.
    pub fn with_limit(mut self, limit: i64, max_limit: i64) -> Self {
        self.limit = limit.clamp(1, max_limit.clamp(1, MAX_SEARCH_LIMIT));
        self
    }

    /// Whether the term is long enough to query for.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// `ILIKE` pattern matching the term anywhere. Escape character is `\`.
    pub fn contains_pattern(&self) -> String {
        let mut pattern = String::with_capacity(self.term.len() + 2);
        pattern.push('%');
        for c in self.term.chars() {
            if matches!(c, '\\' | '%' | '_') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');
        pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_below_threshold_is_inactive() {
        assert!(!SearchQuery::new("", 2).is_active());
        assert!(!SearchQuery::new("  a  ", 2).is_active());
        assert!(SearchQuery::new(" ab ", 2).is_active());
        assert!(SearchQuery::new("a", 1).is_active());
    }

    #[test]
    fn test_threshold_counts_characters_not_bytes() {
        assert!(!SearchQuery::new("é", 2).is_active());
        assert!(SearchQuery::new("éa", 2).is_active());
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(SearchQuery::new("civic", 2).contains_pattern(), "%civic%");
        assert_eq!(SearchQuery::new("50%_off", 2).contains_pattern(), r"%50\%\_off%");
        assert_eq!(SearchQuery::new(r"a\b", 2).contains_pattern(), r"%a\\b%");
    }

    #[test]
    fn test_limit_clamped() {
        assert_eq!(SearchQuery::new("ab", 2).limit(), DEFAULT_SEARCH_LIMIT);
        assert_eq!(SearchQuery::new("ab", 2).with_limit(0, 100).limit(), 1);
        assert_eq!(SearchQuery::new("ab", 2).with_limit(500, 100).limit(), 100);
        assert_eq!(SearchQuery::new("ab", 2).with_limit(500, 1000).limit(), MAX_SEARCH_LIMIT);
    }

    #[test]
    fn test_default_limit_respects_configured_max() {
        let params = SearchParams {
            q: "brake".to_string(),
            limit: None,
        };
        assert_eq!(SearchQuery::from_params(&params, 2, 10).limit(), 10);
        assert_eq!(
            SearchQuery::from_params(&params, 2, 100).limit(),
            DEFAULT_SEARCH_LIMIT
        );
    }

    #[test]
    fn test_from_params() {
        let params = SearchParams {
            q: "  brake ".to_string(),
            limit: Some(5),
        };
        let query = SearchQuery::from_params(&params, 2, 100);
        assert_eq!(query.term(), "brake");
        assert_eq!(query.limit(), 5);
    }
}
