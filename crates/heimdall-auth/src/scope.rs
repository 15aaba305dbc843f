//! Scope set parsing and comparison.
//!
//! Scopes are space-separated, order-irrelevant sets of string tokens.
//! Parsing preserves first-seen order so that serialized scopes round-trip
//! the way the caller wrote them.

use std::collections::HashSet;
use std::fmt;

/// A parsed set of OAuth scopes.
///
/// Duplicates are dropped on parse; comparison is set-based, display keeps
/// insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScopeSet {
    scopes: Vec<String>,
}

impl ScopeSet {
    /// Parses a space-separated scope string.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut seen = HashSet::new();
        let scopes = raw
            .split_whitespace()
            .filter(|s| seen.insert(s.to_string()))
            .map(String::from)
            .collect();
        Self { scopes }
    }

    /// Returns `true` if the set contains no scopes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Returns the number of scopes in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Returns `true` if the set contains the given scope token.
    #[must_use]
    pub fn contains(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }

    /// Returns `true` if every scope in `self` is present in `other`.
    #[must_use]
    pub fn is_subset_of(&self, other: &ScopeSet) -> bool {
        let theirs: HashSet<&str> = other.scopes.iter().map(String::as_str).collect();
        self.scopes.iter().all(|s| theirs.contains(s.as_str()))
    }

    /// Returns an iterator over the scope tokens.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(String::as_str)
    }
}

impl fmt::Display for ScopeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.scopes.join(" "))
    }
}
