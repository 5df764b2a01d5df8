//! Anchor-only elements, title paragraphs and heading levels.

use crate::dom::{ArenaDom, NodeData, NodeId};
use crate::policy::TitlePolicy;

use super::{add_carrier, identifiers, inside_heading, is_heading};

/// Walk the section in document order and put stray identifiers on headings.
///
/// - Anchor-only elements outside headings are removed and their identifiers
///   queued.
/// - A paragraph whose class the title policy recognizes becomes a heading,
///   taking the first queued identifier if it has none of its own.
/// - The first heading of the section becomes an `h1`.
/// - Each heading drains the queue: the first identifier becomes its id if
///   it lacks one, the rest become carriers inside it.
///
/// Identifiers still queued after the last heading are dropped.
pub fn place_anchors(dom: &mut ArenaDom, titles: &TitlePolicy) {
    let mut pending: Vec<String> = Vec::new();
    let mut seen_heading = false;

    for node in dom.descendants(dom.body()) {
        if dom.parent(node).is_none() {
            continue;
        }

        if is_anchor_only(dom, node) && !inside_heading(dom, node) {
            pending.extend(identifiers(dom, node));
            dom.detach(node);
            continue;
        }

        if dom.is_tag(node, "p")
            && let Some(level) = titles.heading_level(dom.classes(node))
        {
            dom.rename(node, &format!("h{level}"));
            if dom.element_id(node).is_none() && !pending.is_empty() {
                let id = pending.remove(0);
                dom.set_attr(node, "id", &id);
            }
        }

        if !is_heading(dom, node) {
            continue;
        }

        if !seen_heading {
            seen_heading = true;
            dom.rename(node, "h1");
        }

        let mut queued = pending.drain(..);
        if dom.element_id(node).is_none()
            && let Some(first) = queued.next()
        {
            dom.set_attr(node, "id", &first);
        }
        let rest: Vec<String> = queued.collect();
        for id in rest.iter().rev() {
            add_carrier(dom, node, id);
        }
    }

    if !pending.is_empty() {
        log::debug!(
            "dropping {} anchor(s) with no following heading: {}",
            pending.len(),
            pending.join(", ")
        );
    }
}

/// An `a` or `span` carrying nothing but `id`/`name` and no content.
fn is_anchor_only(dom: &ArenaDom, node: NodeId) -> bool {
    if !(dom.is_tag(node, "a") || dom.is_tag(node, "span")) {
        return false;
    }
    let attrs = dom.attrs(node);
    if attrs.is_empty() || !attrs.iter().all(|a| a.is("id") || a.is("name")) {
        return false;
    }
    if identifiers(dom, node).is_empty() {
        return false;
    }
    dom.children(node).all(|child| match dom.get(child).map(|n| &n.data) {
        Some(NodeData::Text(text)) => text.trim().is_empty(),
        Some(NodeData::Comment(_)) => true,
        _ => false,
    })
}
