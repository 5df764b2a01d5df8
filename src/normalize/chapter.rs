//! Chapter-level anchors.

use crate::dom::ArenaDom;

use super::{add_carrier, headings, identifiers};

/// Text of the paragraph synthesized for sections without a heading.
///
/// Renders as an invisible block that still carries a `^anchor` suffix.
pub const ZERO_WIDTH_MARKER: &str = "\u{200B}";

/// Make the section answer to its chapter anchor.
///
/// The anchor goes on the first heading with text: as its id when it has
/// none, otherwise as a carrier. A section without such a heading gets a
/// marker paragraph in front of its content.
pub fn ensure_chapter_anchor(dom: &mut ArenaDom, anchor: &str) {
    let body = dom.body();
    let first = headings(dom, body)
        .into_iter()
        .find(|&h| !dom.plain_text(h).is_empty());

    match first {
        Some(heading) => {
            let answers_already = identifiers(dom, heading).iter().any(|id| id == anchor)
                || dom
                    .descendants(heading)
                    .into_iter()
                    .any(|n| identifiers(dom, n).iter().any(|id| id == anchor));
            if answers_already {
                return;
            }
            if dom.element_id(heading).is_none() {
                dom.set_attr(heading, "id", anchor);
            } else {
                add_carrier(dom, heading, anchor);
            }
        }
        None => {
            let marker = dom.new_element("p", &[("id", anchor)]);
            let text = dom.create_text(ZERO_WIDTH_MARKER.to_string());
            dom.append(marker, text);
            dom.prepend(body, marker);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    #[test]
    fn test_sets_id_on_first_heading() {
        let mut dom = parse_html("<h1>One</h1><h2>Two</h2>");
        ensure_chapter_anchor(&mut dom, "ch1");
        assert_eq!(dom.element_id(dom.find_by_tag("h1").unwrap()), Some("ch1"));
        assert_eq!(dom.element_id(dom.find_by_tag("h2").unwrap()), None);
    }

    #[test]
    fn test_skips_empty_heading() {
        let mut dom = parse_html(r#"<h1><img src="logo.png"/></h1><h2>Real</h2>"#);
        ensure_chapter_anchor(&mut dom, "ch1");
        assert_eq!(dom.element_id(dom.find_by_tag("h2").unwrap()), Some("ch1"));
    }

    #[test]
    fn test_is_idempotent() {
        let mut dom = parse_html(r#"<h1 id="own">One</h1>"#);
        ensure_chapter_anchor(&mut dom, "ch1");
        ensure_chapter_anchor(&mut dom, "ch1");
        let h1 = dom.find_by_tag("h1").unwrap();
        assert_eq!(dom.children(h1).filter(|&c| dom.is_tag(c, "a")).count(), 1);
    }

    #[test]
    fn test_marker_goes_first() {
        let mut dom = parse_html("<p>Body</p>");
        ensure_chapter_anchor(&mut dom, "ch2");
        let first = dom.first_child(dom.body()).unwrap();
        assert_eq!(dom.element_id(first), Some("ch2"));
    }
}
