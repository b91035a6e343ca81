//! Segment trie backing one HTTP method.
//!
//! Every node stands for one path segment. Children are split by kind: static
//! children keyed by their literal label, at most one parameter child and at
//! most one catch-all child. Lookup tries them in that order, which gives
//! static > param > catch-all precedence independent of registration order.

use super::pattern::Segment;
use super::{ParamSink, Route};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SegmentKind {
    Root,
    Static,
    Param,
    CatchAll,
}

pub(crate) struct Node {
    kind: SegmentKind,
    label: Box<str>,
    statics: HashMap<Box<str>, Node>,
    param: Option<Box<Node>>,
    catch_all: Option<Box<Node>>,
    route: Option<Arc<Route>>,
}

impl Node {
    fn new(kind: SegmentKind, label: &str) -> Self {
        Self { kind, label: label.into(), statics: HashMap::new(), param: None, catch_all: None, route: None }
    }

    pub(crate) fn root() -> Self {
        Self::new(SegmentKind::Root, "/")
    }

    /// Walks and extends the trie along `segments`, attaching `route` at the terminal node.
    ///
    /// Returns the route previously attached to that node, if any.
    pub(crate) fn insert(&mut self, segments: &[Segment<'_>], route: Arc<Route>) -> Option<Arc<Route>> {
        let mut node = self;
        for segment in segments {
            node = match *segment {
                Segment::Static(label) => {
                    node.statics.entry(label.into()).or_insert_with(|| Node::new(SegmentKind::Static, label))
                }
                Segment::Param(_) => &mut **node.param.get_or_insert_with(|| Box::new(Node::new(SegmentKind::Param, ":"))),
                Segment::CatchAll(_) => {
                    &mut **node.catch_all.get_or_insert_with(|| Box::new(Node::new(SegmentKind::CatchAll, "*")))
                }
            };
        }
        node.route.replace(route)
    }

    /// Matches `path` against the subtree rooted at this node.
    ///
    /// Parameter values are pushed into `sink` as they are bound; a branch that
    /// fails truncates the sink back to where it started.
    pub(crate) fn find<'n, S>(&'n self, path: &str, sink: &mut S) -> Option<&'n Arc<Route>>
    where
        S: ParamSink + ?Sized,
    {
        let rest = path.trim_start_matches('/');
        if rest.is_empty() {
            if self.route.is_some() {
                return self.route.as_ref();
            }
            return self.catch_all_route(rest, sink);
        }

        let (segment, tail) = rest.split_once('/').unwrap_or((rest, ""));

        if let Some(route) = self.statics.get(segment).and_then(|child| child.find(tail, sink)) {
            return Some(route);
        }

        if let Some(child) = &self.param {
            let mark = sink.param_len();
            sink.push_param(segment);
            if let Some(route) = child.find(tail, sink) {
                return Some(route);
            }
            sink.truncate_params(mark);
        }

        self.catch_all_route(rest, sink)
    }

    fn catch_all_route<S>(&self, rest: &str, sink: &mut S) -> Option<&Arc<Route>>
    where
        S: ParamSink + ?Sized,
    {
        let route = self.catch_all.as_ref()?.route.as_ref()?;
        sink.push_param(rest);
        Some(route)
    }

    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let marker = match self.kind {
            SegmentKind::Root | SegmentKind::Static => "",
            SegmentKind::Param => " (param)",
            SegmentKind::CatchAll => " (catch-all)",
        };
        write!(f, "{:indent$}{}{}", "", self.label, marker, indent = depth * 2)?;
        if let Some(route) = &self.route {
            write!(f, " => {}", route.path())?;
        }
        writeln!(f)?;

        let mut statics: Vec<_> = self.statics.values().collect();
        statics.sort_by(|a, b| a.label.cmp(&b.label));
        for child in statics {
            child.fmt_tree(f, depth + 1)?;
        }
        if let Some(child) = &self.param {
            child.fmt_tree(f, depth + 1)?;
        }
        if let Some(child) = &self.catch_all {
            child.fmt_tree(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::Node;
    use crate::handler::{handler_fn, HandlerRef};
    use crate::router::pattern::parse;
    use crate::router::{Captures, Route};
    use http::Method;
    use std::sync::Arc;

    fn route(path: &str) -> Arc<Route> {
        let handler: HandlerRef = Arc::new(handler_fn(|_ctx| Box::pin(async move { Ok(()) })));
        let pattern = parse(path).unwrap();
        Arc::new(Route::new(Method::GET, path, pattern.names, handler))
    }

    fn tree(paths: &[&str]) -> Node {
        let mut root = Node::root();
        for path in paths {
            let pattern = parse(path).unwrap();
            root.insert(&pattern.segments, route(path));
        }
        root
    }

    fn lookup(root: &Node, path: &str) -> Option<(String, Vec<String>)> {
        let mut captures = Captures::new();
        root.find(path, &mut captures).map(|route| (route.path().to_string(), captures.values().to_vec()))
    }

    #[test]
    fn insert_returns_replaced_route() {
        let mut root = Node::root();
        let pattern = parse("/users").unwrap();
        assert!(root.insert(&pattern.segments, route("/users")).is_none());
        assert!(root.insert(&pattern.segments, route("/users")).is_some());
    }

    #[test]
    fn param_branch_backtracks_to_catch_all() {
        let root = tree(&["/a/:x/c", "/a/*rest"]);
        assert_eq!(lookup(&root, "/a/b/c"), Some(("/a/:x/c".into(), vec!["b".into()])));
        assert_eq!(lookup(&root, "/a/b/d"), Some(("/a/*rest".into(), vec!["b/d".into()])));
    }

    #[test]
    fn static_branch_backtracks_to_param() {
        let root = tree(&["/a/b/c", "/a/:x/d"]);
        assert_eq!(lookup(&root, "/a/b/d"), Some(("/a/:x/d".into(), vec!["b".into()])));
    }

    #[test]
    fn failed_branch_leaves_no_values() {
        let root = tree(&["/a/:x/:y/z"]);
        let mut captures = Captures::new();
        assert!(root.find("/a/1/2/q", &mut captures).is_none());
        assert!(captures.values().is_empty());
    }

    #[test]
    fn debug_renders_tree() {
        let root = tree(&["/users/:id", "/static/*"]);
        let rendered = format!("{root:?}");
        assert!(rendered.contains("users"));
        assert!(rendered.contains(": (param) => /users/:id"));
        assert!(rendered.contains("* (catch-all) => /static/*"));
    }
}
