//! Route pattern matching.
//!
//! # Responsibilities
//! - Split patterns and paths on `/` into segments
//! - Compare literal segments exactly
//! - Bind `:name` segments to the corresponding path segment
//!
//! # Design Decisions
//! - Segment counts must be equal, no wildcards or catch-alls
//! - Matching is atomic: either every binding or no match at all
//! - Identical pattern and path match without any bindings

use std::collections::HashMap;
use std::fmt;

use crate::error::RouteError;

/// Named parameters bound while matching a path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    inner: HashMap<String, String>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value bound to `name`, without the leading `:`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn insert(&mut self, name: &str, value: &str) {
        self.inner.insert(name.to_string(), value.to_string());
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Params {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

/// One `/`-separated piece of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        match raw.strip_prefix(':') {
            Some(name) => Segment::Param(name.to_string()),
            None => Segment::Literal(raw.to_string()),
        }
    }
}

/// A route pattern compiled at registration time.
///
/// The segment count is fixed once compiled; paths with a different count
/// never match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    raw: String,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Compile a pattern, rejecting unnamed and repeated parameters.
    pub fn parse(raw: &str) -> Result<Self, RouteError> {
        let pattern = Self::compile(raw);

        let mut seen: Vec<&str> = Vec::new();
        for segment in &pattern.segments {
            if let Segment::Param(name) = segment {
                if name.is_empty() {
                    return Err(RouteError::UnnamedParam {
                        pattern: raw.to_string(),
                    });
                }
                if seen.contains(&name.as_str()) {
                    return Err(RouteError::DuplicateParam {
                        pattern: raw.to_string(),
                        name: name.clone(),
                    });
                }
                seen.push(name);
            }
        }

        Ok(pattern)
    }

    fn compile(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            segments: raw.split('/').map(Segment::parse).collect(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Match `path` against this pattern.
    pub fn matches(&self, path: &str) -> Option<Params> {
        if self.raw == path {
            return Some(Params::new());
        }

        let parts: Vec<&str> = path.split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = Params::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Param(name) => params.insert(name, part),
                Segment::Literal(_) => return None,
            }
        }

        Some(params)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Match a raw pattern string against a request path.
///
/// Returns the bound parameters on success. An empty `:` segment is
/// accepted here and binds under the empty name; [`Pattern::parse`] is
/// where such patterns get rejected.
pub fn match_path(pattern: &str, path: &str) -> Option<Params> {
    Pattern::compile(pattern).matches(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_has_no_params() {
        let params = match_path("/about", "/about").unwrap();
        assert!(params.is_empty());

        let params = match_path("", "").unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn test_literal_patterns_match_only_themselves() {
        assert!(match_path("/about", "/abouts").is_none());
        assert!(match_path("/a/b", "/a/c").is_none());
        assert!(match_path("/a/b", "/a/b/").is_none());
    }

    #[test]
    fn test_segment_count_mismatch() {
        assert!(match_path("/users/:id", "/users").is_none());
        assert!(match_path("/users/:id", "/users/1/2").is_none());
        assert!(match_path("/:a", "/").is_some());
        assert!(match_path("/:a/:b", "/x").is_none());
    }

    #[test]
    fn test_single_param() {
        let params = match_path("/users/:id", "/users/42").unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("id"), Some("42"));
    }

    #[test]
    fn test_multiple_params() {
        let params = match_path("/users/:user_id/addr/:addr_id", "/users/7/addr/9").unwrap();
        let expected: Params = [("user_id", "7"), ("addr_id", "9")].into_iter().collect();
        assert_eq!(params, expected);
    }

    #[test]
    fn test_failure_discards_partial_bindings() {
        assert!(match_path("/users/:id/posts", "/users/1/comments").is_none());
    }

    #[test]
    fn test_trailing_empty_segment() {
        let params = match_path("/users/:user_id/addr/", "/users/3/addr/").unwrap();
        assert_eq!(params.get("user_id"), Some("3"));
        assert!(match_path("/users/:user_id/addr/", "/users/3/addr").is_none());
    }

    #[test]
    fn test_param_binds_empty_segment() {
        let params = match_path("/files/:name", "/files/").unwrap();
        assert_eq!(params.get("name"), Some(""));
    }

    #[test]
    fn test_unnamed_param_binds_empty_key() {
        let params = match_path("/x/:", "/x/value").unwrap();
        assert_eq!(params.get(""), Some("value"));
    }

    #[test]
    fn test_parse_rejects_unnamed_param() {
        assert!(matches!(
            Pattern::parse("/x/:"),
            Err(RouteError::UnnamedParam { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_duplicate_param() {
        assert!(matches!(
            Pattern::parse("/:id/:id"),
            Err(RouteError::DuplicateParam { name, .. }) if name == "id"
        ));
    }

    #[test]
    fn test_parse_keeps_segment_count() {
        let pattern = Pattern::parse("/users/:id").unwrap();
        assert_eq!(pattern.segment_count(), 3);
        assert_eq!(pattern.to_string(), "/users/:id");
    }
}
