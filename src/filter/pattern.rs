//! Anchored literal patterns for pattern-only search backends
//!
//! Some table widgets can only filter a column by regular expression. To get
//! exact-match behaviour out of them the selected value is escaped and
//! wrapped in `^...$`. Matching inside this crate never goes through here;
//! it uses [`FilterSelection::matches`](crate::filter::selection::FilterSelection::matches).

use crate::filter::selection::FilterSelection;
use anyhow::{Context, Result};
use regex::Regex;

#[derive(Debug, Clone)]
pub struct LiteralPattern {
    regex: Regex,
}

impl LiteralPattern {
    /// Pattern that matches `value` and nothing else
    pub fn anchored(value: &str) -> Result<Self> {
        let source = format!("^{}$", regex::escape(value));
        let regex = Regex::new(&source)
            .with_context(|| format!("Cannot build literal pattern for {:?}", value))?;
        Ok(Self { regex })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Search string for a selection; empty when no filter is active
pub fn search_pattern(selection: &FilterSelection) -> Result<String> {
    match selection.value() {
        None => Ok(String::new()),
        Some(value) => Ok(LiteralPattern::anchored(value)?.as_str().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchored_matches_whole_value_only() {
        let pattern = LiteralPattern::anchored("abc").unwrap();
        assert_eq!(pattern.as_str(), "^abc$");
        assert!(pattern.is_match("abc"));
        assert!(!pattern.is_match("abcd"));
        assert!(!pattern.is_match("zabc"));
    }

    #[test]
    fn test_metacharacters_are_literal() {
        let dot = LiteralPattern::anchored("a.b").unwrap();
        assert!(dot.is_match("a.b"));
        assert!(!dot.is_match("axb"));

        let star = LiteralPattern::anchored("x*").unwrap();
        assert!(star.is_match("x*"));
        assert!(!star.is_match("xxx"));
        assert!(!star.is_match(""));

        let group = LiteralPattern::anchored("(a|b)[0-9]+$").unwrap();
        assert!(group.is_match("(a|b)[0-9]+$"));
        assert!(!group.is_match("a1"));
    }

    #[test]
    fn test_search_pattern() {
        assert_eq!(search_pattern(&FilterSelection::None).unwrap(), "");
        assert_eq!(
            search_pattern(&FilterSelection::from_raw("1.5")).unwrap(),
            r"^1\.5$"
        );
    }
}
