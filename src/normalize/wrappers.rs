//! Move identifiers off structural wrappers.
//!
//! Layout tools wrap each heading in an identified `div`, and links target the
//! `div`. The Markdown compiler flattens wrappers away, so the identifier is
//! moved onto the heading where it can resolve to a label.

use crate::dom::ArenaDom;

use super::{add_carrier, is_heading};

/// For every identified `div` with a heading among its direct children, hand
/// the `div`'s id to the first such heading.
///
/// A heading without an id takes it over; a heading that has its own id gets
/// it as a carrier. Either way the `div` loses the attribute.
pub fn transfer_wrapper_ids(dom: &mut ArenaDom) {
    for node in dom.descendants(dom.body()) {
        if !dom.is_tag(node, "div") {
            continue;
        }
        let Some(id) = dom.element_id(node).map(str::to_string) else {
            continue;
        };
        let Some(heading) = dom.children(node).find(|&c| is_heading(dom, c)) else {
            continue;
        };

        let existing = dom.element_id(heading).map(str::to_string);
        match existing.as_deref() {
            None => dom.set_attr(heading, "id", &id),
            Some(existing) if existing == id => {}
            Some(_) => add_carrier(dom, heading, &id),
        }
        dom.remove_attr(node, "id");
    }
}
