//! HTML parsing into a mutable arena tree.
//!
//! Sections are XHTML, but html5ever only speaks HTML. The one XML habit that
//! changes the tree shape is the self-closing non-void tag (`<a id="x"/>`),
//! which an HTML parser reads as an open tag swallowing the rest of the
//! paragraph; [`parse_html`] expands those before parsing.

mod arena;
mod element;
mod tree_sink;

pub use arena::{ArenaDom, Attribute, ChildrenIter, Node, NodeData, NodeId};
pub use element::{Role, element_to_role, heading_level, is_void};

use std::borrow::Cow;
use std::sync::LazyLock;

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use regex::{Captures, Regex};

use tree_sink::ArenaSink;

static SELF_CLOSING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<([A-Za-z][A-Za-z0-9:_-]*)((?:\s+[^\s<>"'=/]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s<>"']+))?)*)\s*/>"#)
        .unwrap()
});

/// Parse section markup into an [`ArenaDom`].
pub fn parse_html(markup: &str) -> ArenaDom {
    let markup = expand_self_closing(markup);
    let sink = ArenaSink::new();
    parse_document(sink, ParseOpts::default())
        .from_utf8()
        .one(markup.as_bytes())
        .into_dom()
}

/// Rewrite `<tag/>` as `<tag></tag>` for every non-void tag.
pub fn expand_self_closing(markup: &str) -> Cow<'_, str> {
    SELF_CLOSING.replace_all(markup, |caps: &Captures<'_>| {
        let tag = &caps[1];
        let attrs = &caps[2];
        if is_void(&tag.to_ascii_lowercase()) {
            format!("<{tag}{attrs}/>")
        } else {
            format!("<{tag}{attrs}></{tag}>")
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_parse() {
        let dom = parse_html("<html><body><p>Hello</p></body></html>");
        let p = dom.find_by_tag("p").unwrap();
        let text = dom.children(p).next().unwrap();
        assert_eq!(dom.text_content(text), Some("Hello"));
        assert!(dom.is_tag(dom.body(), "body"));
    }

    #[test]
    fn test_fragment_gets_body() {
        let dom = parse_html("<h1>Title</h1><p>Text</p>");
        let h1 = dom.find_by_tag("h1").unwrap();
        assert_eq!(dom.parent(h1), Some(dom.body()));
    }

    #[test]
    fn test_self_closing_anchor_stays_empty() {
        let dom = parse_html(r#"<p><a id="p5"/>Text after</p>"#);
        let a = dom.find_by_tag("a").unwrap();
        assert_eq!(dom.element_id(a), Some("p5"));
        assert_eq!(dom.children(a).count(), 0);
        assert_eq!(dom.plain_text(dom.find_by_tag("p").unwrap()), "Text after");
    }

    #[test]
    fn test_expand_self_closing_keeps_void_tags() {
        assert_eq!(expand_self_closing("<br/>"), "<br/>");
        assert_eq!(
            expand_self_closing(r#"<img src="a.png" alt="x" />"#),
            r#"<img src="a.png" alt="x"/>"#
        );
        assert_eq!(expand_self_closing(r#"<span id="x"/>"#), r#"<span id="x"></span>"#);
        assert_eq!(expand_self_closing("<p>plain</p>"), "<p>plain</p>");
    }

    #[test]
    fn test_svg_image_xlink_href() {
        let dom = parse_html(
            r#"<svg xmlns:xlink="http://www.w3.org/1999/xlink"><image xlink:href="../img/a.jpg"/></svg>"#,
        );
        let image = dom.find_by_tag("image").unwrap();
        assert_eq!(dom.get_attr(image, "xlink:href"), Some("../img/a.jpg"));
    }

    #[test]
    fn test_attributes_and_nesting() {
        let dom = parse_html(r#"<div id="main" class="container header"><p>A</p><p>B</p></div>"#);
        let div = dom.find_by_tag("div").unwrap();
        assert_eq!(dom.element_id(div), Some("main"));
        assert!(dom.classes(div).any(|c| c == "header"));
        let paragraphs = dom.children(div).filter(|&c| dom.is_tag(c, "p")).count();
        assert_eq!(paragraphs, 2);
    }
}
