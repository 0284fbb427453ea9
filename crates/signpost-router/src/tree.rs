//! Segment tree for matching a path against many templates.
//!
//! Each node represents one template segment. Dynamic segments share a single
//! unnamed child per node; names are resolved from the matched leaf's
//! template, so `/users/:id` and `/users/:user_id/posts` can coexist.

use crate::params::RouteParams;
use crate::template::{decode, RouteTemplate, Segment};

/// A raw value captured while walking the tree.
#[derive(Debug, Clone, Copy)]
enum Capture<'a> {
    One(&'a str),
    Many(&'a [&'a str]),
}

#[derive(Debug, Clone)]
struct Node<T> {
    literal: String,
    static_children: Vec<Node<T>>,
    param_child: Option<Box<Node<T>>>,
    catch_all_child: Option<Box<Node<T>>>,
    route: Option<(RouteTemplate, T)>,
}

impl<T> Node<T> {
    fn new(literal: impl Into<String>) -> Self {
        Self {
            literal: literal.into(),
            static_children: Vec::new(),
            param_child: None,
            catch_all_child: None,
            route: None,
        }
    }

    fn descend(&mut self, segments: &[Segment]) -> &mut Self {
        let Some((first, rest)) = segments.split_first() else {
            return self;
        };
        let child = match first {
            Segment::Static(text) => {
                let index = match self
                    .static_children
                    .binary_search_by(|c| c.literal.as_str().cmp(text))
                {
                    Ok(index) => index,
                    Err(index) => {
                        self.static_children.insert(index, Node::new(text.as_str()));
                        index
                    }
                };
                &mut self.static_children[index]
            }
            Segment::Param(_) => &mut **self
                .param_child
                .get_or_insert_with(|| Box::new(Node::new(""))),
            Segment::CatchAll(_) => &mut **self
                .catch_all_child
                .get_or_insert_with(|| Box::new(Node::new(""))),
        };
        child.descend(rest)
    }

    /// Static children first, then the param child, then the catch-all with
    /// the longest span tried first.
    fn find<'n, 'p>(
        &'n self,
        parts: &'p [&'p str],
        captures: &mut Vec<Capture<'p>>,
    ) -> Option<&'n (RouteTemplate, T)> {
        let Some((first, rest)) = parts.split_first() else {
            return self.route.as_ref();
        };

        if let Ok(index) = self
            .static_children
            .binary_search_by(|c| c.literal.as_str().cmp(first))
        {
            if let Some(found) = self.static_children[index].find(rest, captures) {
                return Some(found);
            }
        }

        if let Some(child) = &self.param_child {
            captures.push(Capture::One(*first));
            if let Some(found) = child.find(rest, captures) {
                return Some(found);
            }
            captures.pop();
        }

        if let Some(child) = &self.catch_all_child {
            for span in (1..=parts.len()).rev() {
                captures.push(Capture::Many(&parts[..span]));
                if let Some(found) = child.find(&parts[span..], captures) {
                    return Some(found);
                }
                captures.pop();
            }
        }

        None
    }
}

/// A matched route.
#[derive(Debug)]
pub struct TreeMatch<'a, T> {
    /// The template that matched.
    pub template: &'a RouteTemplate,
    /// Value stored for the template.
    pub value: &'a T,
    /// Decoded parameters.
    pub params: RouteParams,
}

/// Maps route templates to values and matches concrete paths.
///
/// # Route priority
///
/// At each segment a static child is tried before a `:param`, and a `:param`
/// before a `*catch_all`. So `/users/me` wins over `/users/:id` for the path
/// `/users/me`.
///
/// # Example
///
/// ```rust
/// use signpost_router::{RouteTemplate, RouteTree};
///
/// let mut tree = RouteTree::new();
/// *tree.entry(&"/users/:id".parse::<RouteTemplate>().unwrap(), || 0) += 1;
/// *tree.entry(&"/users/me".parse::<RouteTemplate>().unwrap(), || 10) += 1;
///
/// let m = tree.find("/users/42").unwrap();
/// assert_eq!(*m.value, 1);
/// assert_eq!(m.params.get_one("id"), Some("42"));
/// assert_eq!(*tree.find("/users/me").unwrap().value, 11);
/// ```
#[derive(Debug, Clone)]
pub struct RouteTree<T> {
    root: Node<T>,
    len: usize,
}

impl<T> Default for RouteTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RouteTree<T> {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::new(""),
            len: 0,
        }
    }

    /// Returns the value for `template`, inserting one from `init` if absent.
    ///
    /// Templates that differ only in parameter names share a slot; the first
    /// template inserted names the parameters.
    pub fn entry(&mut self, template: &RouteTemplate, init: impl FnOnce() -> T) -> &mut T {
        let node = self.root.descend(template.segments());
        if node.route.is_none() {
            self.len += 1;
        }
        let (_, value) = node.route.get_or_insert_with(|| (template.clone(), init()));
        value
    }

    /// Inserts or replaces the value for `template`.
    pub fn insert(&mut self, template: &RouteTemplate, value: T) {
        let node = self.root.descend(template.segments());
        if node.route.is_none() {
            self.len += 1;
        }
        node.route = Some((template.clone(), value));
    }

    /// Matches a concrete path.
    #[must_use]
    pub fn find(&self, path: &str) -> Option<TreeMatch<'_, T>> {
        let path = path.split('?').next().unwrap_or_default();
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut captures = Vec::with_capacity(parts.len());
        let (template, value) = self.root.find(&parts, &mut captures)?;

        let mut params = RouteParams::with_capacity(captures.len());
        for (name, capture) in template.param_names().zip(captures) {
            match capture {
                Capture::One(raw) => params.push(name, decode(raw)),
                Capture::Many(raw) => {
                    params.push(name, raw.iter().map(|p| decode(p)).collect::<Vec<_>>());
                }
            }
        }

        Some(TreeMatch {
            template,
            value,
            params,
        })
    }

    /// Number of distinct templates stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no templates are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
