//! Name-based filtering of watched objects.

use globset::{Glob, GlobMatcher};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use tracing::error;

/// Pattern dialect used by a [`NameFilter`].
///
/// A deployment uses exactly one style, chosen in configuration; match and
/// ignore patterns are both interpreted in that style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterStyle {
    #[default]
    Glob,
    Regex,
}

enum Matcher {
    Glob(GlobMatcher),
    Regex(Regex),
}

impl Matcher {
    fn is_match(&self, name: &str) -> bool {
        match self {
            Matcher::Glob(g) => g.is_match(name),
            Matcher::Regex(r) => r.is_match(name),
        }
    }
}

/// NameFilter decides whether an object's name is of interest.
///
/// Policy: an ignore pattern wins over a match pattern; an unset match
/// pattern is equivalent to matching everything. A malformed pattern is
/// reported once and evaluates as "no match" from then on, so it can
/// never crash the dispatcher.
pub struct NameFilter {
    style: FilterStyle,
    match_pattern: Option<String>,
    ignore_pattern: Option<String>,
    match_matcher: OnceCell<Option<Matcher>>,
    ignore_matcher: OnceCell<Option<Matcher>>,
}

impl NameFilter {
    pub fn new(
        style: FilterStyle,
        match_pattern: Option<String>,
        ignore_pattern: Option<String>,
    ) -> Self {
        // Empty strings in config mean "unset", as in the YAML examples.
        let normalize = |p: Option<String>| p.filter(|p| !p.is_empty());

        NameFilter {
            style,
            match_pattern: normalize(match_pattern),
            ignore_pattern: normalize(ignore_pattern),
            match_matcher: OnceCell::new(),
            ignore_matcher: OnceCell::new(),
        }
    }

    /// A filter that includes every name.
    pub fn match_all() -> Self {
        NameFilter::new(FilterStyle::Glob, None, None)
    }

    /// Returns true if an object with this name should be processed.
    pub fn matches(&self, name: &str) -> bool {
        if let Some(pattern) = &self.ignore_pattern {
            let matcher = self.ignore_matcher.get_or_init(|| compile(self.style, pattern));
            if matcher.as_ref().is_some_and(|m| m.is_match(name)) {
                return false;
            }
        }

        if let Some(pattern) = &self.match_pattern {
            let matcher = self.match_matcher.get_or_init(|| compile(self.style, pattern));
            // A malformed match pattern evaluates as "no match".
            if !matcher.as_ref().is_some_and(|m| m.is_match(name)) {
                return false;
            }
        }

        true
    }
}

fn compile(style: FilterStyle, pattern: &str) -> Option<Matcher> {
    let compiled = match style {
        FilterStyle::Glob => Glob::new(pattern)
            .map(|g| Matcher::Glob(g.compile_matcher()))
            .map_err(|e| e.to_string()),
        FilterStyle::Regex => Regex::new(pattern)
            .map(Matcher::Regex)
            .map_err(|e| e.to_string()),
    };

    match compiled {
        Ok(matcher) => Some(matcher),
        Err(err) => {
            error!(pattern, ?style, error = %err, "failed to compile name filter pattern");
            None
        }
    }
}

impl fmt::Debug for NameFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameFilter")
            .field("style", &self.style)
            .field("match_pattern", &self.match_pattern)
            .field("ignore_pattern", &self.ignore_pattern)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_patterns_match_everything() {
        let filter = NameFilter::match_all();
        assert!(filter.matches("web-1"));
        assert!(filter.matches(""));
    }

    #[test]
    fn test_glob_match_pattern() {
        let filter = NameFilter::new(FilterStyle::Glob, Some("web-*".into()), None);
        assert!(filter.matches("web-1"));
        assert!(!filter.matches("db-1"));
    }

    #[test]
    fn test_regex_ignore_pattern() {
        let filter = NameFilter::new(FilterStyle::Regex, None, Some("web-.*".into()));
        assert!(!filter.matches("web-1"));
        assert!(filter.matches("db-1"));
    }

    #[test]
    fn test_ignore_wins_over_match() {
        let filter = NameFilter::new(
            FilterStyle::Regex,
            Some("web-.*".into()),
            Some("web-canary-.*".into()),
        );
        assert!(filter.matches("web-1"));
        assert!(!filter.matches("web-canary-1"));
        assert!(!filter.matches("db-1"));
    }

    #[test]
    fn test_empty_string_pattern_is_unset() {
        let filter = NameFilter::new(FilterStyle::Regex, Some(String::new()), Some(String::new()));
        assert!(filter.matches("anything"));
    }

    #[test]
    fn test_malformed_match_pattern_excludes() {
        let filter = NameFilter::new(FilterStyle::Regex, Some("(unclosed".into()), None);
        assert!(!filter.matches("web-1"));
    }

    #[test]
    fn test_malformed_ignore_pattern_does_not_exclude() {
        let filter = NameFilter::new(FilterStyle::Regex, None, Some("(unclosed".into()));
        assert!(filter.matches("web-1"));
    }
}
