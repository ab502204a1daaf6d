use std::borrow::Cow;
use std::collections::HashMap;

use regex::Regex;
use tracing::debug;

use super::options::Options;
use crate::core::router::path::fix_path;
use crate::core::router::router::Params;
use crate::error::RouteError;

/// Index of a node inside its trie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

const ROOT: NodeId = NodeId(0);

/// Node represents one path segment of the defined patterns.
///
/// Nodes live in the arena of their [`Trie`]; `parent` is a plain index used
/// to rebuild the declared path for diagnostics.
#[derive(Debug)]
pub struct Node<T> {
    id: NodeId,
    segment: String,
    name: Option<String>,
    pattern: String,
    suffix: Option<String>,
    regex: Option<Regex>,
    wildcard: bool,
    endpoint: bool,
    parent: Option<NodeId>,
    children: HashMap<String, NodeId>,
    vary_children: Vec<NodeId>,
    handlers: HashMap<String, T>,
    methods: Vec<String>,
    allow: String,
}

impl<T> Node<T> {
    fn new(id: NodeId, segment: &str, parent: Option<NodeId>) -> Node<T> {
        Node {
            id,
            segment: segment.to_string(),
            name: None,
            pattern: String::new(),
            suffix: None,
            regex: None,
            wildcard: false,
            endpoint: false,
            parent,
            children: HashMap::new(),
            vary_children: Vec::new(),
            handlers: HashMap::new(),
            methods: Vec::new(),
            allow: String::new(),
        }
    }

    /// Mounts a handler for `method` on this node.
    ///
    /// ```
    /// use wow_router::Trie;
    ///
    /// let mut trie = Trie::new();
    /// let id = trie.define("/a/b").unwrap();
    /// trie.node_mut(id).handle("GET", 1).unwrap();
    /// trie.node_mut(id).handle("POST", 2).unwrap();
    /// assert_eq!(trie.node(id).allow(), "GET, POST");
    /// ```
    pub fn handle(&mut self, method: &str, handler: T) -> Result<(), RouteError> {
        if self.handlers.contains_key(method) {
            return Err(RouteError::DuplicateHandler {
                method: method.to_string(),
                pattern: self.pattern.clone(),
            });
        }

        self.handlers.insert(method.to_string(), handler);
        self.methods.push(method.to_string());
        if !self.allow.is_empty() {
            self.allow.push_str(", ");
        }
        self.allow.push_str(method);
        Ok(())
    }

    /// Returns the handler mounted for `method`.
    pub fn handler(&self, method: &str) -> Option<&T> {
        self.handlers.get(method)
    }

    /// Comma separated methods in registration order, ready for an `Allow`
    /// header.
    pub fn allow(&self) -> &str {
        &self.allow
    }

    /// The first pattern that terminated at this node, empty for inner nodes.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Methods mounted on this node, in registration order.
    pub fn methods(&self) -> Vec<&str> {
        self.methods.iter().map(String::as_str).collect()
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Raw declared segment text, e.g. `:id(\d+)`.
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// Parameter name; `None` for literal segments.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    pub fn is_endpoint(&self) -> bool {
        self.endpoint
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    // Dynamic siblings with the same shape are one and the same segment.
    fn same_shape(&self, wildcard: bool, suffix: Option<&str>, regex: Option<&Regex>) -> bool {
        self.wildcard == wildcard
            && self.suffix.as_deref() == suffix
            && self.regex.as_ref().map(Regex::as_str) == regex.map(Regex::as_str)
    }

    // Sort key of vary children: suffix first, then regexp, wildcards last.
    fn precedence(&self) -> (bool, bool, bool) {
        (self.suffix.is_none(), self.regex.is_none(), self.wildcard)
    }

    fn accepts(&self, segment: &str) -> bool {
        let mut text = segment;
        if let Some(suffix) = &self.suffix {
            if segment == suffix || !segment.ends_with(suffix.as_str()) {
                return false;
            }
            text = &segment[..segment.len() - suffix.len()];
        }
        match &self.regex {
            Some(regex) => regex.is_match(text),
            None => true,
        }
    }
}

/// Matched is the result of [`Trie::matches`].
#[derive(Debug)]
pub struct Matched<'a, T> {
    /// The endpoint node when the path matched.
    pub node: Option<&'a Node<T>>,

    /// Captured parameters, possibly empty.
    pub params: Params,

    /// With `fixed_path_redirect`, the corrected path to redirect to.
    pub fpr: Option<String>,

    /// With `trailing_slash_redirect`, the path with (without) the trailing
    /// slash to redirect to.
    pub tsr: Option<String>,
}

impl<'a, T> Matched<'a, T> {
    fn new() -> Matched<'a, T> {
        Matched {
            node: None,
            params: Params::new(),
            fpr: None,
            tsr: None,
        }
    }

    /// The redirect target, fixed path first.
    pub fn redirect(&self) -> Option<&str> {
        self.fpr.as_deref().or_else(|| self.tsr.as_deref())
    }

    fn set_redirect(&mut self, target: String, corrected: bool) {
        if corrected {
            self.fpr = Some(target);
        } else {
            self.tsr = Some(target);
        }
    }
}

/// Trie holds the defined patterns and matches URL paths against them.
///
/// Patterns are defined once at startup; matching only reads the trie, so a
/// built trie can be shared across threads without locking.
#[derive(Debug)]
pub struct Trie<T> {
    options: Options,
    nodes: Vec<Node<T>>,
}

impl<T> Default for Trie<T> {
    fn default() -> Trie<T> {
        Trie::new()
    }
}

impl<T> Trie<T> {
    /// Returns a trie with the default [`Options`].
    pub fn new() -> Trie<T> {
        Trie::with_options(Options::default())
    }

    pub fn with_options(options: Options) -> Trie<T> {
        Trie {
            options,
            nodes: vec![Node::new(ROOT, "", None)],
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn root(&self) -> &Node<T> {
        &self.nodes[ROOT.0]
    }

    pub fn node(&self, id: NodeId) -> &Node<T> {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        &mut self.nodes[id.0]
    }

    /// All endpoint nodes, in the order their nodes were created.
    pub fn endpoints(&self) -> Vec<&Node<T>> {
        self.nodes.iter().filter(|n| n.endpoint).collect()
    }

    /// All nodes below `id`, depth first.
    pub fn descendants(&self, id: NodeId) -> Vec<&Node<T>> {
        let node = self.node(id);
        let mut nodes = Vec::new();
        for &child in node.children.values().chain(node.vary_children.iter()) {
            nodes.push(self.node(child));
            nodes.extend(self.descendants(child));
        }
        nodes
    }

    /// Rebuilds the declared path of a node from its ancestors.
    pub fn segments(&self, id: NodeId) -> String {
        let mut parts = Vec::new();
        let mut current = Some(id);
        while let Some(id) = current {
            let node = self.node(id);
            parts.push(node.segment.as_str());
            current = node.parent;
        }
        parts.reverse();
        parts.join("/")
    }

    /// Defines a pattern and returns its endpoint node.
    ///
    /// Defining the same pattern again returns the same node.
    ///
    /// | Syntax | Description |
    /// |--------|------|
    /// | `:name` | named parameter |
    /// | `:name*` | named with catch-all parameter |
    /// | `:name(regexp)` | named with regexp parameter |
    /// | `:name+suffix` | named with suffix parameter |
    /// | `:name(regexp)+suffix` | named with regexp and suffix parameter |
    /// | `::name` | not named parameter, it is literal `:name` |
    ///
    /// ```
    /// use wow_router::Trie;
    ///
    /// let mut trie: Trie<()> = Trie::new();
    /// let a = trie.define("/a").unwrap();
    /// let b = trie.define("/a/b").unwrap();
    /// assert_eq!(trie.node(b).parent(), Some(a));
    /// assert_eq!(trie.define("/a/b").unwrap(), b);
    /// ```
    pub fn define(&mut self, pattern: &str) -> Result<NodeId, RouteError> {
        if pattern.contains("//") {
            return Err(RouteError::MultipleSlashes(pattern.to_string()));
        }
        let mut rest = pattern
            .strip_prefix('/')
            .ok_or_else(|| RouteError::MissingLeadingSlash(pattern.to_string()))?;
        if let Some(i) = rest.find('?') {
            rest = &rest[..i];
        }

        let mark = self.nodes.len();
        let id = match self.define_segments(rest) {
            Ok(id) => id,
            Err(err) => {
                self.rollback(mark);
                return Err(err);
            }
        };

        let node = self.node_mut(id);
        node.endpoint = true;
        if node.pattern.is_empty() {
            node.pattern = pattern.to_string();
            debug!(pattern, "pattern defined");
        }
        Ok(id)
    }

    fn define_segments(&mut self, rest: &str) -> Result<NodeId, RouteError> {
        let mut id = ROOT;
        for segment in rest.split('/') {
            if self.node(id).wildcard {
                return Err(RouteError::AfterWildcard(self.segments(id)));
            }
            id = self.define_segment(id, segment)?;
        }
        Ok(id)
    }

    // Drops every node pushed since `mark` together with the links their
    // older parents hold to them.
    fn rollback(&mut self, mark: usize) {
        let parents: Vec<NodeId> = self.nodes[mark..]
            .iter()
            .filter_map(|node| node.parent)
            .filter(|parent| parent.0 < mark)
            .collect();
        for parent in parents {
            let node = self.node_mut(parent);
            node.children.retain(|_, child| child.0 < mark);
            node.vary_children.retain(|child| child.0 < mark);
        }
        self.nodes.truncate(mark);
    }

    fn define_segment(&mut self, parent: NodeId, segment: &str) -> Result<NodeId, RouteError> {
        let escaped = is_escaped_literal(segment);
        let dynamic = !escaped && segment.starts_with(':');
        if dynamic {
            return self.define_dynamic(parent, segment);
        }
        if !escaped && segment.starts_with(&['*', '(', ')'][..]) {
            return Err(RouteError::InvalidPattern(self.child_segments(parent, segment)));
        }

        // pattern "/a/::" should match "/a/:"
        // pattern "/a/::bc" should match "/a/:bc"
        let key = if escaped { &segment[1..] } else { segment };
        let key = if self.options.ignore_case {
            key.to_lowercase()
        } else {
            key.to_string()
        };
        if let Some(&id) = self.node(parent).children.get(&key) {
            return Ok(id);
        }

        let id = self.push(segment, parent);
        self.node_mut(parent).children.insert(key, id);
        Ok(id)
    }

    fn define_dynamic(&mut self, parent: NodeId, segment: &str) -> Result<NodeId, RouteError> {
        let segments = self.child_segments(parent, segment);
        let mut name = &segment[1..];
        let mut wildcard = false;
        let mut suffix = None;
        let mut regex = None;

        if let Some(stripped) = name.strip_suffix('*') {
            name = stripped;
            wildcard = true;
        } else {
            if let Some(i) = suffix_start(name) {
                if i + 1 == name.len() {
                    return Err(RouteError::InvalidPattern(segments));
                }
                suffix = Some(&name[i + 1..]);
                name = &name[..i];
            }

            if name.ends_with(')') {
                if let Some(i) = name.find('(').filter(|&i| i > 0) {
                    let source = &name[i + 1..name.len() - 1];
                    if source.is_empty() {
                        return Err(RouteError::InvalidPattern(segments));
                    }
                    let compiled = Regex::new(&format!("^(?:{})$", source)).map_err(|source| {
                        RouteError::InvalidRegex {
                            segments: segments.clone(),
                            source,
                        }
                    })?;
                    regex = Some(compiled);
                    name = &name[..i];
                }
            }
        }

        // name must be word characters `[0-9A-Za-z_]`
        if !is_word(name) {
            return Err(RouteError::InvalidPattern(segments));
        }

        for &id in &self.node(parent).vary_children {
            let child = self.node(id);
            if child.wildcard && wildcard && child.name() != Some(name) {
                return Err(RouteError::ConflictingWildcard(segments, self.segments(id)));
            }
            if child.same_shape(wildcard, suffix, regex.as_ref()) {
                if child.name() != Some(name) {
                    return Err(RouteError::ConflictingName {
                        name: name.to_string(),
                        previous: self.segments(id),
                    });
                }
                return Ok(id);
            }
        }

        let id = self.push(segment, parent);
        let node = self.node_mut(id);
        node.name = Some(name.to_string());
        node.wildcard = wildcard;
        node.suffix = suffix.map(str::to_string);
        node.regex = regex;

        let mut vary = std::mem::take(&mut self.node_mut(parent).vary_children);
        vary.push(id);
        // The wildcard term is deliberate: a plain `:name` defined after a
        // wildcard still sorts ahead of it, wildcards stay the last resort.
        vary.sort_by_key(|&child| self.node(child).precedence());
        self.node_mut(parent).vary_children = vary;
        Ok(id)
    }

    fn push(&mut self, segment: &str, parent: NodeId) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(id, segment, Some(parent)));
        id
    }

    fn child_segments(&self, parent: NodeId, segment: &str) -> String {
        format!("{}/{}", self.segments(parent), segment)
    }

    /// Matches `path` against the defined patterns.
    ///
    /// ```
    /// use wow_router::Trie;
    ///
    /// let mut trie: Trie<()> = Trie::new();
    /// trie.define("/api/:type/:id").unwrap();
    /// let matched = trie.matches("/api/user/123");
    /// assert!(matched.node.is_some());
    /// assert_eq!(matched.params.by_name("id"), Some("123"));
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `path` does not begin with `/`.
    pub fn matches(&self, path: &str) -> Matched<'_, T> {
        assert!(
            path.starts_with('/'),
            "path is not start with \"/\": \"{}\"",
            path
        );

        let fixed = if self.options.fixed_path_redirect {
            fix_path(path)
        } else {
            Cow::Borrowed(path)
        };
        let corrected = fixed.len() != path.len();
        let path: &str = &fixed;

        let mut matched = Matched::new();
        let bytes = path.as_bytes();
        let end = path.len();
        let mut start = 1;
        let mut parent = self.root();

        for i in 1..=end {
            if i < end && bytes[i] != b'/' {
                continue;
            }
            let segment = &path[start..i];
            let node = match self.match_child(parent, segment) {
                Some(node) => node,
                None => {
                    // TrailingSlashRedirect: /abc/efg/ -> /abc/efg
                    if self.options.trailing_slash_redirect
                        && parent.endpoint
                        && i == end
                        && segment.is_empty()
                    {
                        matched.set_redirect(path[..end - 1].to_string(), corrected);
                    }
                    return matched;
                }
            };

            parent = node;
            if let Some(name) = &node.name {
                if node.wildcard {
                    matched.params.set(name, &path[start..end]);
                    break;
                }
                let value = match &node.suffix {
                    Some(suffix) => &segment[..segment.len() - suffix.len()],
                    None => segment,
                };
                matched.params.set(name, value);
            }
            start = i + 1;
        }

        if parent.endpoint {
            if corrected {
                matched.fpr = Some(path.to_string());
            } else {
                matched.node = Some(parent);
            }
        } else if self.options.trailing_slash_redirect && parent.children.contains_key("") {
            // TrailingSlashRedirect: /abc/efg -> /abc/efg/
            matched.set_redirect(format!("{}/", path), corrected);
        }

        matched
    }

    fn match_child(&self, parent: &Node<T>, segment: &str) -> Option<&Node<T>> {
        let key = if self.options.ignore_case {
            Cow::Owned(segment.to_lowercase())
        } else {
            Cow::Borrowed(segment)
        };
        if let Some(&id) = parent.children.get(key.as_ref()) {
            return Some(self.node(id));
        }
        if segment.is_empty() {
            return None;
        }

        parent
            .vary_children
            .iter()
            .map(|&id| self.node(id))
            .find(|child| child.accepts(segment))
    }
}

// the valid characters for the path component:
// [A-Za-z0-9!$%&'()*+,-.:;=@_~]
// https://tools.ietf.org/html/rfc3986#section-3.3
// parentheses are left out, they delimit regexps.
fn is_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!$%&'*+,-.:;=@_~".contains(c)
}

fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_escaped_literal(segment: &str) -> bool {
    segment
        .strip_prefix("::")
        .map_or(false, |rest| rest.chars().all(is_path_char))
}

// Index of the `+` opening a suffix: the leftmost one followed only by path
// characters.
fn suffix_start(name: &str) -> Option<usize> {
    name.char_indices()
        .filter(|&(_, c)| c == '+')
        .map(|(i, _)| i)
        .find(|&i| name[i + 1..].chars().all(is_path_char))
}
