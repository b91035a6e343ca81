//! Route pattern parsing.
//!
//! A pattern is a `/` separated list of segments: a literal segment matches
//! itself, `:name` captures exactly one segment and `*name` captures the rest
//! of the path. Empty segments are skipped, so `/users//:id/` is `/users/:id`.

use crate::error::RouteError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Segment<'p> {
    Static(&'p str),
    Param(&'p str),
    CatchAll(&'p str),
}

/// A validated pattern: its segments and the parameter names in declaration order.
#[derive(Debug)]
pub(crate) struct Pattern<'p> {
    pub(crate) segments: Vec<Segment<'p>>,
    pub(crate) names: Vec<String>,
}

/// Name given to a catch-all declared as a bare `*`.
pub(crate) const UNNAMED_CATCH_ALL: &str = "*";

pub(crate) fn parse(pattern: &str) -> Result<Pattern<'_>, RouteError> {
    let mut segments = Vec::new();
    let mut names: Vec<String> = Vec::new();

    let mut iter = pattern.split('/').filter(|s| !s.is_empty()).peekable();
    while let Some(raw) = iter.next() {
        let segment = if let Some(name) = raw.strip_prefix(':') {
            if name.is_empty() {
                return Err(RouteError::empty_param_name(pattern));
            }
            Segment::Param(name)
        } else if let Some(name) = raw.strip_prefix('*') {
            if iter.peek().is_some() {
                return Err(RouteError::catch_all_not_last(pattern));
            }
            Segment::CatchAll(if name.is_empty() { UNNAMED_CATCH_ALL } else { name })
        } else {
            Segment::Static(raw)
        };

        if let Segment::Param(name) | Segment::CatchAll(name) = segment {
            if names.iter().any(|n| n == name) {
                return Err(RouteError::duplicate_param_name(pattern, name));
            }
            names.push(name.to_owned());
        }
        segments.push(segment);
    }

    Ok(Pattern { segments, names })
}
