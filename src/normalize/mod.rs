//! Tree passes run on every section before it is indexed or rendered.
//!
//! The indexer and the rewrite pipeline both call [`prepare_section`] on a
//! freshly parsed tree, so identifiers end up on exactly the same headings in
//! both passes.
//!
//! ## Pass Order
//!
//! 1. **Wrapper ids** - a `div` id moves onto the heading it wraps
//! 2. **Anchors and titles** - one document-order walk that strips
//!    anchor-only elements, promotes title paragraphs, forces the first
//!    heading to level 1 and reattaches queued identifiers to headings
//! 3. **Chapter anchor** - the section's own anchor lands on its first heading,
//!    or on a zero-width marker when it has none

mod anchors;
mod chapter;
mod wrappers;

pub use chapter::{ZERO_WIDTH_MARKER, ensure_chapter_anchor};

use crate::dom::{ArenaDom, NodeId, heading_level};
use crate::policy::TitlePolicy;

/// Run every normalization pass on a parsed section.
///
/// `chapter_anchor` is the section's entry in the chapter anchor map; sections
/// without one skip the last pass.
pub fn prepare_section(dom: &mut ArenaDom, chapter_anchor: Option<&str>, titles: &TitlePolicy) {
    wrappers::transfer_wrapper_ids(dom);
    anchors::place_anchors(dom, titles);
    if let Some(anchor) = chapter_anchor {
        ensure_chapter_anchor(dom, anchor);
    }
}

/// Identifiers an element answers to: its `id`, and the legacy `name` of an
/// `a` when it differs.
pub fn identifiers(dom: &ArenaDom, node: NodeId) -> Vec<String> {
    let mut ids = Vec::new();
    if let Some(id) = dom.element_id(node) {
        ids.push(id.to_string());
    }
    if dom.is_tag(node, "a")
        && let Some(name) = dom.get_attr(node, "name").map(str::trim)
        && !name.is_empty()
        && !ids.iter().any(|id| id == name)
    {
        ids.push(name.to_string());
    }
    ids
}

/// Whether a node is an `h1`–`h6` element.
pub fn is_heading(dom: &ArenaDom, node: NodeId) -> bool {
    dom.tag(node).and_then(heading_level).is_some()
}

/// Headings below `root` in document order.
pub fn headings(dom: &ArenaDom, root: NodeId) -> Vec<NodeId> {
    dom.descendants(root)
        .into_iter()
        .filter(|&node| is_heading(dom, node))
        .collect()
}

/// Whether a node sits inside a heading.
pub fn inside_heading(dom: &ArenaDom, node: NodeId) -> bool {
    dom.ancestors(node).any(|a| is_heading(dom, a))
}

/// Add an empty `<a id="…">` as the first child of a heading so the heading
/// answers to one more identifier.
pub fn add_carrier(dom: &mut ArenaDom, heading: NodeId, id: &str) {
    let carrier = dom.new_element("a", &[("id", id)]);
    dom.prepend(heading, carrier);
}
