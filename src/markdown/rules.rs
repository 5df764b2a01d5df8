//! Node replacement rules.
//!
//! A rule pairs a predicate over an element with a replacement that receives
//! the element's already converted content. Rules are consulted in
//! registration order and the first match wins; elements no rule claims get
//! the compiler's default conversion.

use std::fmt;

use crate::dom::{ArenaDom, NodeId, heading_level};

/// Read-only handle on the element being converted.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    dom: &'a ArenaDom,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub fn new(dom: &'a ArenaDom, id: NodeId) -> Self {
        Self { dom, id }
    }

    pub fn node_id(&self) -> NodeId {
        self.id
    }

    pub fn dom(&self) -> &'a ArenaDom {
        self.dom
    }

    /// Tag name, empty for non-elements.
    pub fn tag(&self) -> &'a str {
        self.dom.tag(self.id).unwrap_or_default()
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag() == tag
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.dom.get_attr(self.id, name)
    }

    /// The `id` attribute, if present and non-blank.
    pub fn id(&self) -> Option<&'a str> {
        self.dom.element_id(self.id)
    }

    pub fn classes(&self) -> impl Iterator<Item = &'a str> + use<'a> {
        self.dom.classes(self.id)
    }

    pub fn heading_level(&self) -> Option<u8> {
        heading_level(self.tag())
    }

    /// Whitespace-collapsed text of the subtree, markup stripped.
    pub fn text(&self) -> String {
        self.dom.plain_text(self.id)
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.dom.parent(self.id).map(|id| NodeRef::new(self.dom, id))
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + use<'a> {
        let dom = self.dom;
        dom.children(self.id).map(move |id| NodeRef::new(dom, id))
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("tag", &self.tag())
            .finish()
    }
}

/// A replacement rule.
pub trait Rule {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Whether this rule converts the node. Must not depend on conversion
    /// state.
    fn matches(&self, node: NodeRef<'_>) -> bool;

    /// Markdown for a matched node, given its converted content.
    fn replace(&self, content: &str, node: NodeRef<'_>) -> String;
}

/// Rule built from a pair of closures.
struct FnRule<F, R> {
    name: String,
    filter: F,
    replacement: R,
}

impl<F, R> Rule for FnRule<F, R>
where
    F: Fn(NodeRef<'_>) -> bool,
    R: Fn(&str, NodeRef<'_>) -> String,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, node: NodeRef<'_>) -> bool {
        (self.filter)(node)
    }

    fn replace(&self, content: &str, node: NodeRef<'_>) -> String {
        (self.replacement)(content, node)
    }
}

/// Ordered rule registry.
#[derive(Default)]
pub struct RuleSet<'a> {
    rules: Vec<Box<dyn Rule + 'a>>,
}

impl<'a> RuleSet<'a> {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Register a rule after the existing ones.
    pub fn add(&mut self, rule: impl Rule + 'a) -> &mut Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Register a rule from a filter and a replacement closure.
    pub fn add_fn<F, R>(&mut self, name: &str, filter: F, replacement: R) -> &mut Self
    where
        F: Fn(NodeRef<'_>) -> bool + 'a,
        R: Fn(&str, NodeRef<'_>) -> String + 'a,
    {
        self.add(FnRule {
            name: name.to_string(),
            filter,
            replacement,
        })
    }

    /// First rule matching a node.
    pub fn find(&self, node: NodeRef<'_>) -> Option<&(dyn Rule + 'a)> {
        self.rules
            .iter()
            .find(|rule| rule.matches(node))
            .map(|rule| rule.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Debug for RuleSet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
