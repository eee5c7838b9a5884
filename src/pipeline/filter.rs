//! Keyword filter — decides whether a message is suppressed instead of translated.
//!
//! Patterns come from the admin command channel and are treated as untrusted
//! regular expressions. The `regex` crate guarantees linear-time matching, and
//! compilation is capped by a size limit so a hostile pattern cannot blow up
//! memory. A pattern that fails to compile never matches.

use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

use crate::error::PipelineError;

/// Upper bound on the compiled program size of a single filter pattern.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// Regex-based keyword filter.
#[derive(Debug, Clone)]
pub struct KeywordFilter {
    size_limit: usize,
}

impl KeywordFilter {
    pub fn new() -> Self {
        Self {
            size_limit: PATTERN_SIZE_LIMIT,
        }
    }

    /// Override the compiled size limit (bytes).
    pub fn with_size_limit(mut self, size_limit: usize) -> Self {
        self.size_limit = size_limit;
        self
    }

    /// Compile a single pattern, case-sensitive and unanchored.
    pub fn compile(&self, pattern: &str) -> Result<Regex, PipelineError> {
        RegexBuilder::new(pattern)
            .size_limit(self.size_limit)
            .dfa_size_limit(self.size_limit)
            .build()
            .map_err(|e| PipelineError::MalformedRule {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
    }

    /// Check `text` against `rules` in the order given.
    ///
    /// Returns the first matching pattern. Malformed patterns are logged and
    /// skipped, so an empty or entirely broken rule set never suppresses.
    pub fn should_suppress<S: AsRef<str>>(&self, text: &str, rules: &[S]) -> Option<String> {
        for rule in rules {
            let pattern = rule.as_ref();
            let regex = match self.compile(pattern) {
                Ok(regex) => regex,
                Err(e) => {
                    warn!(pattern = %pattern, error = %e, "Skipping malformed filter rule");
                    continue;
                }
            };

            if regex.is_match(text) {
                debug!(pattern = %pattern, "Message matched filter rule");
                return Some(pattern.to_string());
            }
        }

        None
    }
}

impl Default for KeywordFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_match_suppresses() {
        let filter = KeywordFilter::new();
        let hit = filter.should_suppress("xxabcxx", &["abc"]);
        assert_eq!(hit.as_deref(), Some("abc"));
    }

    #[test]
    fn regex_patterns_are_honoured() {
        let filter = KeywordFilter::new();
        let rules = vec![r"\bsale\s+\d+%".to_string()];
        assert!(filter.should_suppress("big sale 50% today", &rules).is_some());
        assert!(filter.should_suppress("wholesale prices", &rules).is_none());
    }

    #[test]
    fn matching_is_case_sensitive() {
        let filter = KeywordFilter::new();
        assert!(filter.should_suppress("ABC", &["abc"]).is_none());
        assert!(filter.should_suppress("ABC", &["(?i)abc"]).is_some());
    }

    #[test]
    fn first_matching_rule_wins() {
        let filter = KeywordFilter::new();
        let rules = ["missing", "b", "a"];
        assert_eq!(filter.should_suppress("ab", &rules).as_deref(), Some("b"));
    }

    #[test]
    fn empty_rule_set_never_suppresses() {
        let filter = KeywordFilter::new();
        let rules: [&str; 0] = [];
        assert!(filter.should_suppress("anything", &rules).is_none());
    }

    #[test]
    fn malformed_rule_is_non_matching() {
        let filter = KeywordFilter::new();
        assert!(filter.should_suppress("a ( b", &["("]).is_none());
    }

    #[test]
    fn malformed_rule_does_not_stop_later_rules() {
        let filter = KeywordFilter::new();
        let rules = ["[unclosed", "spam"];
        assert_eq!(
            filter.should_suppress("this is spam", &rules).as_deref(),
            Some("spam")
        );
    }

    #[test]
    fn compile_reports_malformed_rule() {
        let filter = KeywordFilter::new();
        let err = filter.compile("(").unwrap_err();
        assert!(matches!(err, PipelineError::MalformedRule { ref pattern, .. } if pattern == "("));
    }

    #[test]
    fn oversized_pattern_is_rejected() {
        let filter = KeywordFilter::new();
        assert!(filter.compile(r"(\w{100}){100}").is_err());
        assert!(filter
            .should_suppress("hello", &[r"(\w{100}){100}"])
            .is_none());
    }

    #[test]
    fn size_limit_is_configurable() {
        let tight = KeywordFilter::new().with_size_limit(10_000);
        assert!(tight.compile("spam").is_ok());
        assert!(tight.compile(r"\w{100}").is_err());
        assert_eq!(
            tight.should_suppress("spam", &[r"\w{100}", "spam"]).as_deref(),
            Some("spam")
        );
    }

    #[test]
    fn hebrew_keyword_matches() {
        let filter = KeywordFilter::new();
        let hit = filter.should_suppress("זו הודעה עם מילה אסורה", &["אסורה"]);
        assert_eq!(hit.as_deref(), Some("אסורה"));
    }
}
