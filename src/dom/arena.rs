//! Mutable arena tree for section markup.
//!
//! html5ever builds it, the normalization passes edit it and the Markdown
//! compiler reads it. Every node keeps its parent and an ordered child list,
//! which keeps reordering (moving anchors, inserting markers) to a few
//! `Vec` operations. Nodes are never freed; a detached node is simply
//! unreachable from the document.

use html5ever::{LocalName, QualName, ns};

/// Index of a node in its [`ArenaDom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub enum NodeData {
    Document,
    Element { name: QualName, attrs: Vec<Attribute> },
    Text(String),
    /// Comments and processing instructions. Never rendered.
    Comment(String),
    Doctype,
}

#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: QualName,
    pub value: String,
}

impl Attribute {
    /// Whether this attribute is `name`, written either as a bare local name
    /// (`id`) or with its prefix (`xlink:href`).
    pub fn is(&self, name: &str) -> bool {
        if self.name.local.as_ref() == name {
            return true;
        }
        match (&self.name.prefix, name.split_once(':')) {
            (Some(prefix), Some((p, local))) => {
                prefix.as_ref() == p && self.name.local.as_ref() == local
            }
            _ => false,
        }
    }
}

#[derive(Debug)]
pub struct Node {
    pub data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Section markup as an index-linked tree.
#[derive(Debug)]
pub struct ArenaDom {
    nodes: Vec<Node>,
}

impl Default for ArenaDom {
    fn default() -> Self {
        Self::new()
    }
}

impl ArenaDom {
    /// A tree holding only the document root.
    pub fn new() -> Self {
        let mut dom = Self { nodes: Vec::new() };
        dom.push(NodeData::Document);
        dom
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn document(&self) -> NodeId {
        NodeId(0)
    }

    /// The `<body>` element, or the document root for fragments without one.
    pub fn body(&self) -> NodeId {
        self.find_by_tag("body").unwrap_or(self.document())
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    pub fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>) -> NodeId {
        self.push(NodeData::Element { name, attrs })
    }

    /// Create an HTML element from a tag name and `(name, value)` pairs.
    pub fn new_element(&mut self, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let attrs = attrs
            .iter()
            .map(|&(name, value)| Attribute {
                name: html_name(name),
                value: value.to_string(),
            })
            .collect();
        self.create_element(html_name(tag), attrs)
    }

    pub fn create_text(&mut self, text: String) -> NodeId {
        self.push(NodeData::Text(text))
    }

    pub fn create_comment(&mut self, text: String) -> NodeId {
        self.push(NodeData::Comment(text))
    }

    pub fn create_doctype(&mut self) -> NodeId {
        self.push(NodeData::Doctype)
    }

    /// Position of `id` among its parent's children.
    fn slot(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let index = self.get(parent)?.children.iter().position(|&c| c == id)?;
        Some((parent, index))
    }

    /// Place a detached node at `index` in `parent`'s child list.
    fn attach(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if parent == child || self.get(child).is_none() {
            return;
        }
        self.detach(child);
        let Some(node) = self.get_mut(parent) else {
            return;
        };
        let index = index.min(node.children.len());
        node.children.insert(index, child);
        self.nodes[child.index()].parent = Some(parent);
    }

    /// Append `child` as the last child of `parent`, moving it if attached.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.attach(parent, usize::MAX, child);
    }

    /// Insert `child` as the first child of `parent`.
    pub fn prepend(&mut self, parent: NodeId, child: NodeId) {
        self.attach(parent, 0, child);
    }

    /// Insert `child` immediately before `sibling`. No-op when `sibling` is
    /// detached.
    pub fn insert_before(&mut self, sibling: NodeId, child: NodeId) {
        if sibling == child || self.parent(sibling).is_none() {
            return;
        }
        // Detach first: removing `child` may shift `sibling` left
        self.detach(child);
        if let Some((parent, index)) = self.slot(sibling) {
            self.attach(parent, index, child);
        }
    }

    /// Append text to `parent`, merging with a trailing text node.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        let last = self.get(parent).and_then(|n| n.children.last().copied());
        if let Some(last) = last
            && let Some(Node {
                data: NodeData::Text(existing),
                ..
            }) = self.get_mut(last)
        {
            existing.push_str(text);
            return;
        }
        let node = self.create_text(text.to_string());
        self.append(parent, node);
    }

    /// Unlink a node from its parent. Its subtree stays intact.
    pub fn detach(&mut self, id: NodeId) {
        if let Some((parent, index)) = self.slot(id) {
            self.nodes[parent.index()].children.remove(index);
            self.nodes[id.index()].parent = None;
        }
    }

    /// Move every child of `from` to the end of `to`, preserving order.
    pub fn reparent_children(&mut self, from: NodeId, to: NodeId) {
        let Some(node) = self.get_mut(from) else {
            return;
        };
        for child in std::mem::take(&mut node.children) {
            self.nodes[child.index()].parent = None;
            self.append(to, child);
        }
    }

    /// Change an element's tag, keeping its attributes and children.
    pub fn rename(&mut self, id: NodeId, tag: &str) {
        if let Some(NodeData::Element { name, .. }) = self.get_mut(id).map(|n| &mut n.data) {
            name.local = LocalName::from(tag);
        }
    }

    /// Set an attribute, replacing any previous value.
    pub fn set_attr(&mut self, id: NodeId, attr_name: &str, value: &str) {
        let Some(NodeData::Element { attrs, .. }) = self.get_mut(id).map(|n| &mut n.data) else {
            return;
        };
        match attrs.iter_mut().find(|a| a.is(attr_name)) {
            Some(attr) => attr.value = value.to_string(),
            None => attrs.push(Attribute {
                name: html_name(attr_name),
                value: value.to_string(),
            }),
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, attr_name: &str) {
        if let Some(NodeData::Element { attrs, .. }) = self.get_mut(id).map(|n| &mut n.data) {
            attrs.retain(|a| !a.is(attr_name));
        }
    }

    pub fn children(&self, id: NodeId) -> ChildrenIter<'_> {
        let children = self.get(id).map_or(&[][..], |n| n.children.as_slice());
        ChildrenIter(children.iter())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.children.first().copied())
    }

    /// Ancestors of a node, nearest first. The node itself is not included.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), |&n| self.parent(n))
    }

    /// Every node below `root` in document order, `root` excluded.
    ///
    /// Returned as a snapshot so callers can mutate the tree while iterating.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).rev().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).rev());
        }
        out
    }

    /// First element named `tag` in document order.
    pub fn find_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.descendants(self.document())
            .into_iter()
            .find(|&id| self.is_tag(id, tag))
    }

    /// Element's local name, lowercased by the parser.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Element { name, .. }) => Some(name.local.as_ref()),
            _ => None,
        }
    }

    pub fn is_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag(id) == Some(tag)
    }

    pub fn attrs(&self, id: NodeId) -> &[Attribute] {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Element { attrs, .. }) => attrs.as_slice(),
            _ => &[],
        }
    }

    pub fn get_attr(&self, id: NodeId, attr_name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|a| a.is(attr_name))
            .map(|a| a.value.as_str())
    }

    /// The element's `id`, if present and non-blank.
    pub fn element_id(&self, id: NodeId) -> Option<&str> {
        self.get_attr(id, "id")
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    pub fn classes(&self, id: NodeId) -> impl Iterator<Item = &str> {
        self.get_attr(id, "class")
            .unwrap_or_default()
            .split_ascii_whitespace()
    }

    pub fn text_content(&self, id: NodeId) -> Option<&str> {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Concatenated text of every text node under `id` (inclusive).
    pub fn raw_text(&self, id: NodeId) -> String {
        std::iter::once(id)
            .chain(self.descendants(id))
            .filter_map(|node| self.text_content(node))
            .collect()
    }

    /// Whitespace-collapsed plain text of a subtree, all markup stripped.
    pub fn plain_text(&self, id: NodeId) -> String {
        self.raw_text(id)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn html_name(local: &str) -> QualName {
    QualName::new(None, ns!(html), LocalName::from(local))
}

/// Children of a node, in order.
#[derive(Debug, Clone)]
pub struct ChildrenIter<'a>(std::slice::Iter<'a, NodeId>);

impl Iterator for ChildrenIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        self.0.next().copied()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl DoubleEndedIterator for ChildrenIter<'_> {
    fn next_back(&mut self) -> Option<NodeId> {
        self.0.next_back().copied()
    }
}
