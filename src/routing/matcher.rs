//! Path matching logic.
//!
//! # Responsibilities
//! - Match path prefix (case-sensitive, literal)
//! - Match path against a compiled regular expression
//! - Reject empty and malformed patterns at compile time
//!
//! # Design Decisions
//! - Closed enum instead of trait objects: rule kinds are fixed and the
//!   table needs to tell literals from regexes to order them
//! - Regexes are compiled once, at table construction
//! - Query strings are never part of the matched path

use regex::Regex;

use crate::routing::RoutingError;

/// How a rule decides whether a path belongs to it.
#[derive(Debug, Clone)]
pub enum PathMatcher {
    /// Matches when the path starts with the prefix.
    LiteralPrefix(String),
    /// Matches when the regex finds a match in the path.
    Pattern(Regex),
}

impl PathMatcher {
    /// Build a literal-prefix matcher. Empty prefixes are rejected.
    pub fn literal(prefix: &str) -> Result<Self, RoutingError> {
        if prefix.is_empty() {
            return Err(RoutingError::InvalidRulePattern {
                pattern: String::new(),
                reason: "literal prefix is empty".into(),
            });
        }
        Ok(Self::LiteralPrefix(prefix.to_string()))
    }

    /// Compile a regex matcher. Empty or unparseable patterns are rejected.
    pub fn regex(pattern: &str) -> Result<Self, RoutingError> {
        if pattern.is_empty() {
            return Err(RoutingError::InvalidRulePattern {
                pattern: String::new(),
                reason: "regular expression is empty".into(),
            });
        }
        Regex::new(pattern)
            .map(Self::Pattern)
            .map_err(|e| RoutingError::InvalidRulePattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
    }

    /// Returns true if the path matches this condition.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::LiteralPrefix(prefix) => path.starts_with(prefix.as_str()),
            Self::Pattern(re) => re.is_match(path),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Self::LiteralPrefix(_))
    }

    /// The pattern as written in the configuration.
    pub fn as_str(&self) -> &str {
        match self {
            Self::LiteralPrefix(prefix) => prefix,
            Self::Pattern(re) => re.as_str(),
        }
    }
}
