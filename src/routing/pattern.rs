//! Path pattern module
//!
//! Parses route patterns such as `/print/{what_to_print}` into typed segments
//! and matches concrete request paths against them segment by segment.

use std::borrow::Cow;
use std::collections::BTreeMap;

use super::error::{RouteError, RouteResult};

/// Placeholder name → captured value, for a single request
pub type PathParams = BTreeMap<String, String>;

/// A single `/`-separated piece of a route pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the request segment exactly
    Literal(String),
    /// `{name}`: matches any non-empty segment and binds it to `name`
    Param(String),
}

/// A parsed route pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Parse a pattern, rejecting malformed placeholders up front
    pub fn parse(raw: &str) -> RouteResult<Self> {
        let invalid = |reason: &str| RouteError::InvalidPattern {
            pattern: raw.to_string(),
            reason: reason.to_string(),
        };

        let Some(rest) = raw.strip_prefix('/') else {
            return Err(invalid("pattern must start with '/'"));
        };

        let mut segments = Vec::new();
        for piece in rest.split('/') {
            let segment = classify_segment(piece).map_err(invalid)?;
            if let Segment::Param(name) = &segment {
                let seen = segments
                    .iter()
                    .any(|s| matches!(s, Segment::Param(other) if other == name));
                if seen {
                    return Err(invalid(&format!("placeholder '{name}' used twice")));
                }
            }
            segments.push(segment);
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// Match a concrete path, returning the captured placeholders on success
    ///
    /// Request segments are percent-decoded before comparison, so
    /// `/print/a%20b` binds `a b`. An encoded slash stays inside its segment.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let rest = path.strip_prefix('/')?;
        let mut pieces = rest.split('/');
        let mut params = PathParams::new();

        for segment in &self.segments {
            let piece = decode_segment(pieces.next()?);
            match segment {
                Segment::Literal(literal) => {
                    if piece != literal.as_str() {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    if piece.is_empty() {
                        return None;
                    }
                    params.insert(name.clone(), piece.into_owned());
                }
            }
        }

        // Leftover request segments mean the path is longer than the pattern
        if pieces.next().is_some() {
            return None;
        }
        Some(params)
    }
}

impl std::fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Classify one raw pattern segment
fn classify_segment(piece: &str) -> Result<Segment, &'static str> {
    match piece.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
        Some("") => Err("empty placeholder name"),
        Some(name) if name.contains(['{', '}']) => Err("unbalanced braces"),
        Some(name) => Ok(Segment::Param(name.to_string())),
        None if piece.contains(['{', '}']) => Err("unbalanced braces"),
        None => Ok(Segment::Literal(piece.to_string())),
    }
}

/// Percent-decode a path segment, keeping the raw text if it is not valid UTF-8
fn decode_segment(raw: &str) -> Cow<'_, str> {
    urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw))
}
